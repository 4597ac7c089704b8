//! Access-control entries as supplied by the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RightsParseError;
use crate::rights::FileSystemRights;
use crate::sid::SecurityIdentifier;

/// Whether an entry grants or revokes its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessControlType {
    Allow,
    Deny,
}

impl AccessControlType {
    /// Sign used in reports: `+` for allow, `-` for deny.
    #[must_use]
    pub const fn sign(self) -> char {
        match self {
            Self::Allow => '+',
            Self::Deny => '-',
        }
    }
}

impl FromStr for AccessControlType {
    type Err = RightsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("allow") {
            Ok(Self::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(Self::Deny)
        } else {
            Err(RightsParseError::UnknownKind(s.to_string()))
        }
    }
}

impl fmt::Display for AccessControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
        }
    }
}

/// One access-control entry attached to a file-system object.
///
/// The identity is kept as the host reported it: a display name when the
/// host could resolve one, otherwise the raw SID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRule {
    /// Identity reference, a name (`"Users"`) or SID string (`"S-1-5-11"`).
    pub identity: String,
    pub rights: FileSystemRights,
    pub kind: AccessControlType,
    /// Entry came from a parent object rather than the target itself.
    #[serde(default)]
    pub inherited: bool,
}

impl AccessRule {
    pub fn new(
        identity: impl Into<String>,
        rights: FileSystemRights,
        kind: AccessControlType,
    ) -> Self {
        Self {
            identity: identity.into(),
            rights,
            kind,
            inherited: false,
        }
    }

    pub fn allow(identity: impl Into<String>, rights: FileSystemRights) -> Self {
        Self::new(identity, rights, AccessControlType::Allow)
    }

    pub fn deny(identity: impl Into<String>, rights: FileSystemRights) -> Self {
        Self::new(identity, rights, AccessControlType::Deny)
    }

    /// Mark the entry as inherited from a parent object.
    #[must_use]
    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    #[must_use]
    pub const fn is_allow(&self) -> bool {
        matches!(self.kind, AccessControlType::Allow)
    }

    #[must_use]
    pub const fn is_deny(&self) -> bool {
        matches!(self.kind, AccessControlType::Deny)
    }

    /// Parse the identity as a SID, if it has the SID form.
    #[must_use]
    pub fn sid(&self) -> Option<SecurityIdentifier> {
        self.identity.parse().ok()
    }
}
