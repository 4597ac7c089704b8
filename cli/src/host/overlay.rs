//! Rule overlays loaded from a TOML file.
//!
//! Lets a user describe access rules the file system cannot express (deny
//! rules, named roles) and layer them on top of another descriptor source:
//!
//! ```toml
//! [[rule]]
//! path = "/srv/share"
//! identity = "Contractors"
//! rights = ["Write", "Delete"]
//! kind = "deny"
//! inherit = true
//! ```
//!
//! A rule applies to its own path and, when `inherit` is set (the default), to
//! everything below it. Relative paths are taken relative to the rule file.

use std::path::{Path, PathBuf};

use ep_core::{AccessControlType, AccessRule, DescriptorSource, FileSystemRights, QueryError};
use serde::Deserialize;
use tracing::info;

use crate::error::{HostError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    path: PathBuf,
    identity: String,
    rights: Vec<String>,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default = "default_inherit")]
    inherit: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOverlay {
    #[serde(default, rename = "rule")]
    rules: Vec<RawRule>,
}

fn default_kind() -> String {
    "allow".to_string()
}

const fn default_inherit() -> bool {
    true
}

/// A rule anchored at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRule {
    pub path: PathBuf,
    pub rule: AccessRule,
    pub inherit: bool,
}

/// Make `path` absolute against `base` and canonical when it exists.
fn anchor(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    std::fs::canonicalize(&joined).unwrap_or(joined)
}

/// Parse overlay rules from TOML text.
///
/// `origin` names the file in errors; relative rule paths are anchored at
/// `base`.
pub fn parse_overlay(content: &str, origin: &Path, base: &Path) -> Result<Vec<OverlayRule>> {
    let raw: RawOverlay = toml::from_str(content).map_err(|source| HostError::OverlayParse {
        path: origin.to_path_buf(),
        source,
    })?;

    raw.rules
        .into_iter()
        .map(|r| {
            let invalid = |message: String| HostError::OverlayRule {
                path: origin.to_path_buf(),
                message,
            };
            let rights =
                FileSystemRights::from_names(&r.rights).map_err(|e| invalid(e.to_string()))?;
            let kind = r
                .kind
                .parse::<AccessControlType>()
                .map_err(|e| invalid(e.to_string()))?;
            if r.identity.trim().is_empty() {
                return Err(invalid("empty identity".to_string()));
            }
            Ok(OverlayRule {
                path: anchor(&r.path, base),
                rule: AccessRule::new(r.identity, rights, kind),
                inherit: r.inherit,
            })
        })
        .collect()
}

/// Descriptor source that appends overlay rules to another source's rules.
///
/// Order of the returned list:
/// 1. Rules from the inner source
/// 2. Overlay rules declared on the target itself
/// 3. Inherited overlay rules, nearest ancestor first
#[derive(Debug)]
pub struct OverlaySource<S> {
    inner: S,
    rules: Vec<OverlayRule>,
}

impl<S: DescriptorSource> OverlaySource<S> {
    #[must_use]
    pub const fn new(inner: S, rules: Vec<OverlayRule>) -> Self {
        Self { inner, rules }
    }

    /// Load overlay rules from a TOML file.
    pub fn load(inner: S, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let rules = parse_overlay(&content, path, &base)?;
        info!(file = %path.display(), rules = rules.len(), "Loaded rule overlay");
        Ok(Self::new(inner, rules))
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn overlay_for(&self, target: &Path) -> Vec<AccessRule> {
        let explicit = self
            .rules
            .iter()
            .filter(|r| r.path == target)
            .map(|r| r.rule.clone());

        let mut inherited: Vec<&OverlayRule> = self
            .rules
            .iter()
            .filter(|r| r.inherit && r.path != target && target.starts_with(&r.path))
            .collect();
        // Stable sort keeps file order among rules on the same ancestor.
        inherited.sort_by_key(|r| std::cmp::Reverse(r.path.components().count()));

        explicit
            .chain(inherited.into_iter().map(|r| r.rule.clone().inherited()))
            .collect()
    }
}

impl<S: DescriptorSource> DescriptorSource for OverlaySource<S> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn access_rules(&self, path: &Path) -> std::result::Result<Vec<AccessRule>, QueryError> {
        let mut rules = self.inner.access_rules(path)?;
        rules.extend(self.overlay_for(path));
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use ep_core::StaticSource;

    use super::*;

    const OVERLAY: &str = r#"
[[rule]]
path = "/srv/share"
identity = "Contractors"
rights = ["Write", "Delete"]
kind = "deny"

[[rule]]
path = "/srv/share/docs"
identity = "Auditors"
rights = ["Read"]

[[rule]]
path = "/srv/share/docs/plan.txt"
identity = "Users"
rights = ["Modify"]
inherit = false

[[rule]]
path = "/srv"
identity = "Guests"
rights = ["ReadAndExecute"]
inherit = false
"#;

    fn rules() -> Vec<OverlayRule> {
        parse_overlay(OVERLAY, Path::new("rules.toml"), Path::new("/")).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let rules = rules();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].rule.kind, AccessControlType::Deny);
        assert_eq!(
            rules[0].rule.rights,
            FileSystemRights::WRITE | FileSystemRights::DELETE
        );
        assert!(rules[0].inherit);
        assert_eq!(rules[1].rule.kind, AccessControlType::Allow);
        assert!(!rules[2].inherit);
    }

    #[test]
    fn test_explicit_then_nearest_inherited() {
        let source = OverlaySource::new(
            StaticSource::new().with_rules(
                "/srv/share/docs/plan.txt",
                vec![AccessRule::allow("alice", FileSystemRights::FULL_CONTROL)],
            ),
            rules(),
        );

        let out = source
            .access_rules(Path::new("/srv/share/docs/plan.txt"))
            .unwrap();
        let identities: Vec<_> = out.iter().map(|r| r.identity.as_str()).collect();

        assert_eq!(identities, vec!["alice", "Users", "Auditors", "Contractors"]);
        assert!(!out[1].inherited);
        assert!(out[2].inherited);
        assert!(out[3].inherited);
    }

    #[test]
    fn test_non_inheritable_rule_stays_put() {
        let source = OverlaySource::new(
            StaticSource::new().with_rules("/srv/other", Vec::new()),
            rules(),
        );
        let out = source.access_rules(Path::new("/srv/other")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_sibling_prefix_does_not_inherit() {
        let source = OverlaySource::new(
            StaticSource::new().with_rules("/srv/shared", Vec::new()),
            rules(),
        );
        // "/srv/shared" is not below "/srv/share".
        assert!(source.access_rules(Path::new("/srv/shared")).unwrap().is_empty());
    }

    #[test]
    fn test_inner_failure_propagates() {
        let source = OverlaySource::new(
            StaticSource::new().with_access_denied("/srv/share"),
            rules(),
        );
        assert!(matches!(
            source.access_rules(Path::new("/srv/share")),
            Err(QueryError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_unknown_right_rejected() {
        let err = parse_overlay(
            "[[rule]]\npath = \"/x\"\nidentity = \"a\"\nrights = [\"Fly\"]\n",
            Path::new("rules.toml"),
            Path::new("/"),
        )
        .unwrap_err();
        assert!(matches!(err, HostError::OverlayRule { .. }));
        assert!(err.to_string().contains("Fly"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = parse_overlay(
            "[[rule]]\npath = \"/x\"\nidentity = \"a\"\nrights = [\"Read\"]\nkind = \"maybe\"\n",
            Path::new("rules.toml"),
            Path::new("/"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let err = parse_overlay("[[rule]\n", Path::new("rules.toml"), Path::new("/")).unwrap_err();
        assert!(matches!(err, HostError::OverlayParse { .. }));
    }

    #[test]
    fn test_relative_paths_anchor_at_rule_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        let file = dir.path().join("rules.toml");
        std::fs::write(
            &file,
            "[[rule]]\npath = \"data\"\nidentity = \"Users\"\nrights = [\"Read\"]\n",
        )
        .unwrap();

        let source = OverlaySource::load(StaticSource::new(), &file).unwrap();

        assert_eq!(source.rule_count(), 1);
        let expected = std::fs::canonicalize(dir.path().join("data")).unwrap();
        assert_eq!(source.rules[0].path, expected);
    }
}
