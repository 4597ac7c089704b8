//! Effective permission resolution.
//!
//! Computes the effective rights of a principal on one file-system object.

use std::path::{Path, PathBuf};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::aggregator::aggregate;
use crate::classifier::classify;
use crate::entry::AccessRule;
use crate::error::ResolveError;
use crate::principal::Principal;
use crate::rights::FileSystemRights;
use crate::source::DescriptorSource;

/// Effective rights of one principal on one target.
///
/// Built once by [`resolve`] and read-only afterwards. When [`Self::failure`]
/// is set the rights are empty and carry no meaning.
#[derive(Debug, Serialize)]
pub struct ResolutionResult {
    target: PathBuf,
    rights: FileSystemRights,
    applicable: Vec<AccessRule>,
    irrelevant: Vec<AccessRule>,
    #[serde(serialize_with = "serialize_failure")]
    failure: Option<ResolveError>,
}

impl ResolutionResult {
    fn failed(target: PathBuf, failure: ResolveError) -> Self {
        Self {
            target,
            rights: FileSystemRights::empty(),
            applicable: Vec::new(),
            irrelevant: Vec::new(),
            failure: Some(failure),
        }
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Effective rights: union of applicable allows minus applicable denies.
    #[must_use]
    pub const fn rights(&self) -> FileSystemRights {
        self.rights
    }

    /// Rules that apply to the principal, in descriptor order.
    #[must_use]
    pub fn applicable_rules(&self) -> &[AccessRule] {
        &self.applicable
    }

    /// Rules that do not apply to the principal, in descriptor order.
    #[must_use]
    pub fn irrelevant_rules(&self) -> &[AccessRule] {
        &self.irrelevant
    }

    /// Applicable allow rules.
    pub fn applicable_allow_rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.applicable.iter().filter(|r| r.is_allow())
    }

    /// Applicable deny rules.
    pub fn applicable_deny_rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.applicable.iter().filter(|r| r.is_deny())
    }

    /// The error that prevented resolution, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ResolveError> {
        self.failure.as_ref()
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// Consume the result, turning a captured failure into `Err`.
    pub fn into_result(self) -> Result<Self, ResolveError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    #[must_use]
    pub const fn can_read(&self) -> bool {
        self.rights.has(FileSystemRights::READ)
    }

    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.rights.has(FileSystemRights::WRITE)
    }

    #[must_use]
    pub const fn can_execute(&self) -> bool {
        self.rights.has(FileSystemRights::READ_AND_EXECUTE)
    }
}

fn serialize_failure<S: Serializer>(
    failure: &Option<ResolveError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        None => serializer.serialize_none(),
        Some(err) => {
            let mut s = serializer.serialize_struct("Failure", 2)?;
            s.serialize_field("kind", err.kind())?;
            s.serialize_field("message", &err.to_string())?;
            s.end()
        }
    }
}

/// Compute the effective rights of `principal` on `target`.
///
/// Steps:
/// 1. Fail with [`ResolveError::NotFound`] if the target does not exist
/// 2. Query the flattened rule list from `source`
/// 3. Classify rules into applicable and irrelevant
/// 4. Aggregate the applicable rules
///
/// Never returns an error and never panics on a failed query: failures are
/// captured in [`ResolutionResult::failure`], so one unreadable target does
/// not abort a batch.
#[tracing::instrument(skip_all, fields(path = %target.display(), principal = principal.name()))]
pub fn resolve<P, S>(target: &Path, principal: &P, source: &S) -> ResolutionResult
where
    P: Principal + ?Sized,
    S: DescriptorSource + ?Sized,
{
    if !source.exists(target) {
        debug!("Target does not exist");
        return ResolutionResult::failed(
            target.to_path_buf(),
            ResolveError::NotFound(target.to_path_buf()),
        );
    }

    let rules = match source.access_rules(target) {
        Ok(rules) => rules,
        Err(err) => {
            warn!(error = %err, "Failed to query access rules");
            return ResolutionResult::failed(
                target.to_path_buf(),
                ResolveError::QueryFailure {
                    path: target.to_path_buf(),
                    source: err,
                },
            );
        }
    };

    let total = rules.len();
    let classification = classify(rules, principal);
    let rights = aggregate(&classification.applicable);

    debug!(
        total,
        applicable = classification.applicable.len(),
        rights = %rights,
        "Resolved effective rights"
    );

    ResolutionResult {
        target: target.to_path_buf(),
        rights,
        applicable: classification.applicable,
        irrelevant: classification.irrelevant,
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::principal::RoleSet;
    use crate::sid::SecurityIdentifier;
    use crate::source::StaticSource;

    fn both_roles() -> RoleSet {
        RoleSet::new("alice")
            .with_role("Users")
            .with_role("Contractors")
    }

    #[test]
    fn test_allow_then_deny_example() {
        let source = StaticSource::new().with_rules(
            "/share/report.docx",
            vec![
                AccessRule::allow("Users", FileSystemRights::READ | FileSystemRights::WRITE),
                AccessRule::deny("Contractors", FileSystemRights::WRITE),
            ],
        );

        let result = resolve(Path::new("/share/report.docx"), &both_roles(), &source);

        assert!(result.is_ok());
        assert_eq!(result.rights(), FileSystemRights::READ);
        assert!(result.can_read());
        assert!(!result.can_write());
        assert!(!result.can_execute());
        assert_eq!(result.applicable_allow_rules().count(), 1);
        assert_eq!(result.applicable_deny_rules().count(), 1);
        assert!(result.irrelevant_rules().is_empty());
    }

    #[test]
    fn test_non_member_gets_nothing() {
        let source = StaticSource::new()
            .with_rules("/a", vec![AccessRule::allow("A", FileSystemRights::READ)]);

        let result = resolve(Path::new("/a"), &RoleSet::new("bob"), &source);

        assert!(result.is_ok());
        assert_eq!(result.rights(), FileSystemRights::empty());
        assert!(result.applicable_rules().is_empty());
        assert_eq!(result.irrelevant_rules().len(), 1);
    }

    #[test]
    fn test_sid_membership_applies() {
        let source = StaticSource::new().with_rules(
            "/a",
            vec![AccessRule::allow("S-1-22-2-100", FileSystemRights::READ_AND_EXECUTE)],
        );
        let principal = RoleSet::new("bob").with_sid(SecurityIdentifier::unix_group(100));

        let result = resolve(Path::new("/a"), &principal, &source);

        assert!(result.can_execute());
        assert_eq!(result.applicable_rules().len(), 1);
    }

    #[test]
    fn test_missing_target_is_not_queried() {
        let source = StaticSource::new();

        let result = resolve(Path::new("/missing"), &both_roles(), &source);

        assert!(matches!(result.failure(), Some(ResolveError::NotFound(_))));
        assert_eq!(result.rights(), FileSystemRights::empty());
        assert_eq!(source.query_count(), 0);
    }

    #[test]
    fn test_query_failure_is_captured() {
        let source = StaticSource::new().with_access_denied("/locked");

        let result = resolve(Path::new("/locked"), &both_roles(), &source);

        match result.failure() {
            Some(ResolveError::QueryFailure { path, source }) => {
                assert_eq!(path, Path::new("/locked"));
                assert!(matches!(source, QueryError::AccessDenied(_)));
            }
            other => panic!("expected query failure, got {other:?}"),
        }
        assert_eq!(result.rights(), FileSystemRights::empty());
        assert!(result.applicable_rules().is_empty());
        assert!(result.irrelevant_rules().is_empty());
    }

    #[test]
    fn test_into_result() {
        let source = StaticSource::new().with_rules("/ok", Vec::new());
        assert!(resolve(Path::new("/ok"), &both_roles(), &source)
            .into_result()
            .is_ok());
        assert!(resolve(Path::new("/nope"), &both_roles(), &source)
            .into_result()
            .is_err());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let source = StaticSource::new().with_rules(
            "/a",
            vec![
                AccessRule::allow("Users", FileSystemRights::MODIFY),
                AccessRule::deny("S-1-1-0", FileSystemRights::DELETE),
                AccessRule::allow("Guests", FileSystemRights::READ),
            ],
        );
        let principal = both_roles().with_sid(SecurityIdentifier::everyone());

        let first = resolve(Path::new("/a"), &principal, &source);
        let second = resolve(Path::new("/a"), &principal, &source);

        assert_eq!(first.rights(), second.rights());
        assert_eq!(first.applicable_rules(), second.applicable_rules());
        assert_eq!(first.irrelevant_rules(), second.irrelevant_rules());
    }

    #[test]
    fn test_serialize_failure() {
        let source = StaticSource::new();
        let result = resolve(Path::new("/missing"), &both_roles(), &source);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failure"]["kind"], "not_found");
        assert_eq!(json["target"], "/missing");
    }

    #[test]
    fn test_serialize_success_has_null_failure() {
        let source = StaticSource::new()
            .with_rules("/a", vec![AccessRule::allow("Users", FileSystemRights::READ)]);
        let result = resolve(Path::new("/a"), &both_roles(), &source);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["failure"].is_null());
        assert_eq!(json["applicable"].as_array().unwrap().len(), 1);
    }
}
