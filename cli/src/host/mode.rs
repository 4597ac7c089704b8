//! Access rules derived from Unix permission bits.
//!
//! Each permission class becomes one allow rule:
//! - owner: `Unix User\<name>`, or `S-1-22-1-<uid>` when the uid has no
//!   account entry
//! - group: `Unix Group\<name>`, or `S-1-22-2-<gid>` when the gid has no
//!   account entry
//! - other: `Everyone`
//!
//! Bit mapping: `r` is READ, `w` is WRITE (plus
//! DELETE_SUBDIRECTORIES_AND_FILES on directories), `x` is EXECUTE_FILE. The
//! owner also holds READ_PERMISSIONS, CHANGE_PERMISSIONS and WRITE_ATTRIBUTES
//! since it may always chmod. Classes with no bits produce no rule.
//!
//! Symlinks carry no permissions of their own (their mode is always `0o777`)
//! and yield an empty rule list.

use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;

use ep_core::{AccessRule, DescriptorSource, FileSystemRights, QueryError, SecurityIdentifier};
use tracing::{debug, trace};

use super::accounts::AccountDb;
use super::principal::{qualified_group, qualified_user, EVERYONE};

const OWNER_SHIFT: u32 = 6;
const GROUP_SHIFT: u32 = 3;
const OTHER_SHIFT: u32 = 0;

/// Rights the owner holds regardless of its permission bits.
const OWNER_IMPLICIT: FileSystemRights = FileSystemRights::READ_PERMISSIONS
    .union(FileSystemRights::CHANGE_PERMISSIONS)
    .union(FileSystemRights::WRITE_ATTRIBUTES);

/// Translate one `rwx` triplet into rights.
fn class_rights(bits: u32, is_dir: bool) -> FileSystemRights {
    let mut rights = FileSystemRights::empty();
    if bits & 0o4 != 0 {
        rights |= FileSystemRights::READ;
    }
    if bits & 0o2 != 0 {
        rights |= FileSystemRights::WRITE;
        if is_dir {
            rights |= FileSystemRights::DELETE_SUBDIRECTORIES_AND_FILES;
        }
    }
    if bits & 0o1 != 0 {
        rights |= FileSystemRights::EXECUTE_FILE;
    }
    if !rights.is_empty() {
        rights |= FileSystemRights::SYNCHRONIZE;
    }
    rights
}

/// Build the rule list for an object with the given mode and owners.
#[must_use]
pub fn rules_from_mode(
    mode: u32,
    uid: u32,
    gid: u32,
    is_dir: bool,
    db: &AccountDb,
) -> Vec<AccessRule> {
    let owner = db
        .user_by_uid(uid)
        .map(|u| qualified_user(&u.name))
        .unwrap_or_else(|| SecurityIdentifier::unix_user(uid).to_string());
    let group = db
        .group_by_gid(gid)
        .map(|g| qualified_group(&g.name))
        .unwrap_or_else(|| SecurityIdentifier::unix_group(gid).to_string());

    let classes = [
        (
            owner,
            class_rights((mode >> OWNER_SHIFT) & 0o7, is_dir) | OWNER_IMPLICIT,
        ),
        (group, class_rights((mode >> GROUP_SHIFT) & 0o7, is_dir)),
        (
            EVERYONE.to_string(),
            class_rights((mode >> OTHER_SHIFT) & 0o7, is_dir),
        ),
    ];

    classes
        .into_iter()
        .filter(|(_, rights)| !rights.is_empty())
        .map(|(identity, rights)| AccessRule::allow(identity, rights))
        .collect()
}

/// Descriptor source reading ownership and mode bits from the file system.
///
/// Symlinks are described by their own metadata and never followed.
#[derive(Debug, Clone)]
pub struct ModeDescriptorSource {
    accounts: Arc<AccountDb>,
}

impl ModeDescriptorSource {
    #[must_use]
    pub const fn new(accounts: Arc<AccountDb>) -> Self {
        Self { accounts }
    }
}

impl DescriptorSource for ModeDescriptorSource {
    #[tracing::instrument(level = "trace", skip_all, fields(path = %path.display()))]
    fn access_rules(&self, path: &Path) -> Result<Vec<AccessRule>, QueryError> {
        let meta = std::fs::symlink_metadata(path).map_err(|e| QueryError::from_io(path, e))?;
        if meta.file_type().is_symlink() {
            debug!("Symlink has no permission bits of its own");
            return Ok(Vec::new());
        }
        trace!(
            mode = format_args!("{:o}", meta.mode() & 0o7777),
            uid = meta.uid(),
            gid = meta.gid(),
            "Read mode bits"
        );
        Ok(rules_from_mode(
            meta.mode(),
            meta.uid(),
            meta.gid(),
            meta.is_dir(),
            &self.accounts,
        ))
    }
}
