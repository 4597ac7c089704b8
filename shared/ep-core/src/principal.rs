//! The identity permissions are computed for.
//!
//! The resolver never enumerates group memberships. It only asks yes/no
//! questions through [`Principal`], so hosts can back it with whatever account
//! store they have (local account files, a directory service, a fixed set in
//! tests).

use std::collections::HashSet;

use crate::sid::SecurityIdentifier;

/// Membership oracle for one identity.
///
/// Implementations may block (e.g. a directory round trip). The resolver calls
/// them synchronously and adds no caching, retry or timeout of its own.
pub trait Principal: Send + Sync {
    /// Display name of the identity, used in logs and report headers.
    fn name(&self) -> &str;

    /// Whether the identity is, or is a member of, the role named `role`.
    fn is_member_of_role(&self, role: &str) -> bool;

    /// Whether the identity is, or is a member of, the role identified by `sid`.
    fn is_member_of_sid(&self, sid: &SecurityIdentifier) -> bool;
}

impl<P: Principal + ?Sized> Principal for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_member_of_role(&self, role: &str) -> bool {
        (**self).is_member_of_role(role)
    }

    fn is_member_of_sid(&self, sid: &SecurityIdentifier) -> bool {
        (**self).is_member_of_sid(sid)
    }
}

impl<P: Principal + ?Sized> Principal for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_member_of_role(&self, role: &str) -> bool {
        (**self).is_member_of_role(role)
    }

    fn is_member_of_sid(&self, sid: &SecurityIdentifier) -> bool {
        (**self).is_member_of_sid(sid)
    }
}

/// A principal with a fixed set of role names and SIDs.
///
/// Role names compare case-insensitively; the principal's own name is always
/// one of its roles.
///
/// # Examples
///
/// ```
/// use ep_core::{Principal, RoleSet, SecurityIdentifier};
///
/// let alice = RoleSet::new("alice")
///     .with_role("Users")
///     .with_sid(SecurityIdentifier::unix_group(100));
///
/// assert!(alice.is_member_of_role("users"));
/// assert!(alice.is_member_of_role("Alice"));
/// assert!(alice.is_member_of_sid(&SecurityIdentifier::unix_group(100)));
/// assert!(!alice.is_member_of_role("Administrators"));
/// ```
#[derive(Debug, Clone)]
pub struct RoleSet {
    name: String,
    roles: HashSet<String>,
    sids: HashSet<SecurityIdentifier>,
}

impl RoleSet {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut roles = HashSet::new();
        roles.insert(name.to_lowercase());
        Self {
            name,
            roles,
            sids: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl AsRef<str>) -> Self {
        self.add_role(role);
        self
    }

    #[must_use]
    pub fn with_sid(mut self, sid: SecurityIdentifier) -> Self {
        self.add_sid(sid);
        self
    }

    pub fn add_role(&mut self, role: impl AsRef<str>) {
        self.roles.insert(role.as_ref().to_lowercase());
    }

    pub fn add_sid(&mut self, sid: SecurityIdentifier) {
        self.sids.insert(sid);
    }

    /// Number of distinct role names, the principal's own name included.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn sid_count(&self) -> usize {
        self.sids.len()
    }
}

impl Principal for RoleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_member_of_role(&self, role: &str) -> bool {
        self.roles.contains(&role.to_lowercase())
    }

    fn is_member_of_sid(&self, sid: &SecurityIdentifier) -> bool {
        self.sids.contains(sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_name_is_role() {
        let p = RoleSet::new("Bob");
        assert!(p.is_member_of_role("bob"));
        assert!(p.is_member_of_role("BOB"));
        assert_eq!(p.role_count(), 1);
    }

    #[test]
    fn test_roles_and_sids_are_separate() {
        let p = RoleSet::new("bob").with_role("S-1-1-0");
        // A role spelled like a SID is still only a name.
        assert!(p.is_member_of_role("S-1-1-0"));
        assert!(!p.is_member_of_sid(&SecurityIdentifier::everyone()));
    }

    #[test]
    fn test_duplicate_roles_collapse() {
        let p = RoleSet::new("bob").with_role("Users").with_role("USERS");
        assert_eq!(p.role_count(), 2);
    }

    #[test]
    fn test_through_reference_and_arc() {
        let p = RoleSet::new("bob").with_sid(SecurityIdentifier::unix_user(5));
        let by_ref: &dyn Principal = &p;
        assert!(by_ref.is_member_of_sid(&SecurityIdentifier::unix_user(5)));

        let shared = std::sync::Arc::new(p);
        assert_eq!(shared.name(), "bob");
        assert_eq!(shared.sid_count(), 1);
    }
}
