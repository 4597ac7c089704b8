//! Rule classification.
//!
//! Splits a flattened rule list into the rules that apply to a principal and
//! the rules that do not.

use tracing::debug;

use crate::entry::AccessRule;
use crate::principal::Principal;
use crate::sid::SecurityIdentifier;

/// Result of [`classify`]: both partitions keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub applicable: Vec<AccessRule>,
    pub irrelevant: Vec<AccessRule>,
}

impl Classification {
    /// Total number of classified rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.applicable.len() + self.irrelevant.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applicable.is_empty() && self.irrelevant.is_empty()
    }
}

/// Check whether a single rule applies to `principal`.
///
/// Order of checks:
/// 1. Membership in the role named by the identity string
/// 2. If the identity is a SID string, membership in that SID
///
/// A name that merely starts like a SID (`S-1-...`) but does not parse is
/// only tested by name.
pub fn applies_to<P: Principal + ?Sized>(rule: &AccessRule, principal: &P) -> bool {
    if principal.is_member_of_role(&rule.identity) {
        return true;
    }

    match rule.identity.parse::<SecurityIdentifier>() {
        Ok(sid) => principal.is_member_of_sid(&sid),
        Err(_) => false,
    }
}

/// Partition `rules` into applicable and irrelevant rules for `principal`.
///
/// Every input rule ends up in exactly one partition.
pub fn classify<P, I>(rules: I, principal: &P) -> Classification
where
    P: Principal + ?Sized,
    I: IntoIterator<Item = AccessRule>,
{
    let mut out = Classification::default();

    for rule in rules {
        if applies_to(&rule, principal) {
            debug!(identity = %rule.identity, kind = %rule.kind, "Rule applies");
            out.applicable.push(rule);
        } else {
            debug!(identity = %rule.identity, "Rule irrelevant");
            out.irrelevant.push(rule);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::RoleSet;
    use crate::rights::FileSystemRights;

    fn member() -> RoleSet {
        RoleSet::new("alice")
            .with_role("Users")
            .with_sid(SecurityIdentifier::everyone())
            .with_sid(SecurityIdentifier::unix_group(100))
    }

    #[test]
    fn test_direct_name_match() {
        let rule = AccessRule::allow("Users", FileSystemRights::READ);
        assert!(applies_to(&rule, &member()));
    }

    #[test]
    fn test_direct_match_regardless_of_kind_and_mask() {
        let p = member();
        assert!(applies_to(&AccessRule::deny("users", FileSystemRights::empty()), &p));
        assert!(applies_to(
            &AccessRule::deny("alice", FileSystemRights::FULL_CONTROL),
            &p
        ));
    }

    #[test]
    fn test_sid_match_without_name_match() {
        let rule = AccessRule::allow("S-1-22-2-100", FileSystemRights::READ);
        assert!(applies_to(&rule, &member()));
    }

    #[test]
    fn test_sid_not_held() {
        let rule = AccessRule::allow("S-1-22-2-101", FileSystemRights::READ);
        assert!(!applies_to(&rule, &member()));
    }

    #[test]
    fn test_sid_looking_name_falls_through() {
        let rule = AccessRule::allow("S-1-not-a-sid", FileSystemRights::READ);
        assert!(!applies_to(&rule, &member()));
    }

    #[test]
    fn test_classify_preserves_order() {
        let rules = vec![
            AccessRule::allow("Guests", FileSystemRights::READ),
            AccessRule::allow("Users", FileSystemRights::READ),
            AccessRule::deny("Contractors", FileSystemRights::WRITE),
            AccessRule::allow("S-1-1-0", FileSystemRights::SYNCHRONIZE),
            AccessRule::allow("S-1-5-32-544", FileSystemRights::FULL_CONTROL),
        ];

        let out = classify(rules.clone(), &member());

        assert_eq!(out.applicable, vec![rules[1].clone(), rules[3].clone()]);
        assert_eq!(
            out.irrelevant,
            vec![rules[0].clone(), rules[2].clone(), rules[4].clone()]
        );
        assert_eq!(out.len(), rules.len());
    }

    #[test]
    fn test_unresolved_sid_lands_in_irrelevant() {
        // A SID-form rule the principal does not hold must not vanish.
        let rules = vec![AccessRule::allow("S-1-5-21-1-2-3-1001", FileSystemRights::READ)];
        let out = classify(rules, &member());
        assert!(out.applicable.is_empty());
        assert_eq!(out.irrelevant.len(), 1);
    }

    #[test]
    fn test_classify_empty() {
        let out = classify(Vec::new(), &member());
        assert!(out.is_empty());
    }
}
