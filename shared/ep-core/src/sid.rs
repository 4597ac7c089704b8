//! Security identifiers.
//!
//! Only the textual form is modelled: `S-1-<authority>-<sub>...`. Access rules
//! may name an identity either by display name or by SID string, and the
//! classifier needs to tell the two apart before asking the principal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest identifier authority (48 bits).
const MAX_AUTHORITY: u64 = (1 << 48) - 1;

/// Maximum number of sub-authorities in a SID.
pub const MAX_SUB_AUTHORITIES: usize = 15;

/// A parsed security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecurityIdentifier {
    authority: u64,
    sub_authorities: Vec<u32>,
}

/// The input is not a SID string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a security identifier: {0}")]
pub struct SidParseError(pub String);

impl SecurityIdentifier {
    /// `S-1-1-0`, every identity.
    pub const EVERYONE: &'static str = "S-1-1-0";
    /// `S-1-5-11`, every authenticated identity.
    pub const AUTHENTICATED_USERS: &'static str = "S-1-5-11";

    /// Build a SID from its parts.
    ///
    /// Returns `None` if the authority exceeds 48 bits or there are more than
    /// [`MAX_SUB_AUTHORITIES`] sub-authorities.
    #[must_use]
    pub fn new(authority: u64, sub_authorities: Vec<u32>) -> Option<Self> {
        if authority > MAX_AUTHORITY || sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return None;
        }
        Some(Self {
            authority,
            sub_authorities,
        })
    }

    /// `S-1-1-0`.
    #[must_use]
    pub fn everyone() -> Self {
        Self {
            authority: 1,
            sub_authorities: vec![0],
        }
    }

    /// `S-1-5-11`.
    #[must_use]
    pub fn authenticated_users() -> Self {
        Self {
            authority: 5,
            sub_authorities: vec![11],
        }
    }

    /// `S-1-22-1-<uid>`, the identifier of a Unix user account.
    #[must_use]
    pub fn unix_user(uid: u32) -> Self {
        Self {
            authority: 22,
            sub_authorities: vec![1, uid],
        }
    }

    /// `S-1-22-2-<gid>`, the identifier of a Unix group.
    #[must_use]
    pub fn unix_group(gid: u32) -> Self {
        Self {
            authority: 22,
            sub_authorities: vec![2, gid],
        }
    }

    #[must_use]
    pub const fn authority(&self) -> u64 {
        self.authority
    }

    #[must_use]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Check whether `value` has the textual SID shape and parses.
    ///
    /// # Examples
    ///
    /// ```
    /// use ep_core::SecurityIdentifier;
    ///
    /// assert!(SecurityIdentifier::looks_like_sid("S-1-5-32-544"));
    /// assert!(!SecurityIdentifier::looks_like_sid("BUILTIN\\Administrators"));
    /// assert!(!SecurityIdentifier::looks_like_sid("S-1-five"));
    /// ```
    #[must_use]
    pub fn looks_like_sid(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

fn parse_authority(part: &str) -> Option<u64> {
    let value = if let Some(hex) = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
    {
        if hex.len() != 12 {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()?
    } else {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()?
    };
    (value <= MAX_AUTHORITY).then_some(value)
}

fn parse_sub_authority(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for SecurityIdentifier {
    type Err = SidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SidParseError(s.to_string());

        let mut parts = s.split('-');
        match parts.next() {
            Some(prefix) if prefix.eq_ignore_ascii_case("S") => {}
            _ => return Err(err()),
        }
        if parts.next() != Some("1") {
            return Err(err());
        }
        let authority = parts.next().and_then(parse_authority).ok_or_else(err)?;

        let sub_authorities = parts
            .map(parse_sub_authority)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(err)?;

        Self::new(authority, sub_authorities).ok_or_else(err)
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.authority >= 1 << 32 {
            write!(f, "S-1-0x{:012X}", self.authority)?;
        } else {
            write!(f, "S-1-{}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl Serialize for SecurityIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SecurityIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_known() {
        let sid: SecurityIdentifier = "S-1-5-32-544".parse().unwrap();
        assert_eq!(sid.authority(), 5);
        assert_eq!(sid.sub_authorities(), &[32, 544]);
        assert_eq!(sid.to_string(), "S-1-5-32-544");
    }

    #[test]
    fn test_constants_match_constructors() {
        assert_eq!(SecurityIdentifier::everyone().to_string(), SecurityIdentifier::EVERYONE);
        assert_eq!(
            SecurityIdentifier::authenticated_users().to_string(),
            SecurityIdentifier::AUTHENTICATED_USERS
        );
    }

    #[test]
    fn test_unix_identifiers() {
        assert_eq!(SecurityIdentifier::unix_user(1000).to_string(), "S-1-22-1-1000");
        assert_eq!(SecurityIdentifier::unix_group(27).to_string(), "S-1-22-2-27");
    }

    #[test]
    fn test_parse_lowercase_prefix() {
        let sid: SecurityIdentifier = "s-1-1-0".parse().unwrap();
        assert_eq!(sid, SecurityIdentifier::everyone());
    }

    #[test]
    fn test_parse_hex_authority() {
        let sid: SecurityIdentifier = "S-1-0x000000000005-18".parse().unwrap();
        assert_eq!(sid.authority(), 5);
        assert_eq!(sid.to_string(), "S-1-5-18");
    }

    #[test]
    fn test_large_authority_renders_hex() {
        let sid = SecurityIdentifier::new(1 << 40, vec![7]).unwrap();
        assert_eq!(sid.to_string(), "S-1-0x010000000000-7");
        assert_eq!(sid.to_string().parse::<SecurityIdentifier>().unwrap(), sid);
    }

    #[test]
    fn test_authority_only() {
        let sid: SecurityIdentifier = "S-1-5".parse().unwrap();
        assert!(sid.sub_authorities().is_empty());
    }

    #[test]
    fn test_rejects_names_and_malformed() {
        for input in [
            "Users",
            "",
            "S-1-",
            "S-2-5-11",
            "S-1-5-",
            "S-1-5--11",
            "S-1-five",
            "S-1-5-+11",
            "S-1-5-4294967296",
            "S-1-0x5-1",
            "X-1-5-11",
            "S-1-281474976710656",
        ] {
            assert!(
                input.parse::<SecurityIdentifier>().is_err(),
                "'{input}' should not parse"
            );
        }
    }

    #[test]
    fn test_too_many_sub_authorities() {
        let long = format!("S-1-5{}", "-1".repeat(MAX_SUB_AUTHORITIES + 1));
        assert!(long.parse::<SecurityIdentifier>().is_err());
        let max = format!("S-1-5{}", "-1".repeat(MAX_SUB_AUTHORITIES));
        assert!(max.parse::<SecurityIdentifier>().is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let sid = SecurityIdentifier::unix_user(0);
        let json = serde_json::to_string(&sid).unwrap();
        assert_eq!(json, "\"S-1-22-1-0\"");
        let back: SecurityIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sid);
    }
}
