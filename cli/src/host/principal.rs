//! Unix principals.
//!
//! A Unix identity answers membership for its user name, its group names, the
//! well-known `Everyone` / `Authenticated Users` roles, and the matching SIDs
//! (`S-1-22-1-<uid>`, `S-1-22-2-<gid>`, `S-1-1-0`, `S-1-5-11`).
//!
//! User and group names share one namespace on most systems (every user gets
//! a private group of the same name). Rules derived from ownership therefore
//! use the qualified forms `Unix User\<name>` and `Unix Group\<name>`, and a
//! principal holds the user form only for itself.

use std::path::Path;

use ep_core::{Principal, RoleSet, SecurityIdentifier};
use tracing::{debug, info};

use super::accounts::AccountDb;
use crate::error::{HostError, Result};

/// Role name every identity holds.
pub const EVERYONE: &str = "Everyone";
/// Role name every identity with an account holds.
pub const AUTHENTICATED_USERS: &str = "Authenticated Users";

const PROC_STATUS: &str = "/proc/self/status";

const UNIX_USER_PREFIX: &str = "Unix User\\";
const UNIX_GROUP_PREFIX: &str = "Unix Group\\";

/// Identity naming the user account `name`, distinct from any group `name`.
#[must_use]
pub fn qualified_user(name: &str) -> String {
    format!("{UNIX_USER_PREFIX}{name}")
}

/// Identity naming the group `name`, distinct from any user `name`.
#[must_use]
pub fn qualified_group(name: &str) -> String {
    format!("{UNIX_GROUP_PREFIX}{name}")
}

/// Numeric identity of a Unix user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixIdentity {
    pub name: String,
    pub uid: u32,
    /// Primary and supplementary groups.
    pub gids: Vec<u32>,
}

/// Effective ids read from `/proc/self/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStatus {
    pub euid: u32,
    pub egid: u32,
    pub groups: Vec<u32>,
}

/// Second column of an `Uid:`/`Gid:` line is the effective id.
fn effective_id(value: &str) -> Option<u32> {
    value.split_whitespace().nth(1)?.parse().ok()
}

/// Parse the identity fields of a `/proc/<pid>/status` file.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus> {
    let mut euid = None;
    let mut egid = None;
    let mut groups = Vec::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key {
            "Uid" => euid = effective_id(value),
            "Gid" => egid = effective_id(value),
            "Groups" => {
                groups = value
                    .split_whitespace()
                    .map(|g| g.parse::<u32>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| HostError::identity(format!("bad Groups line: {e}")))?;
            }
            _ => {}
        }
    }

    Ok(ProcStatus {
        euid: euid.ok_or_else(|| HostError::identity("missing Uid line"))?,
        egid: egid.ok_or_else(|| HostError::identity("missing Gid line"))?,
        groups,
    })
}

/// Membership oracle backed by a Unix identity and the account database.
#[derive(Debug, Clone)]
pub struct UnixPrincipal {
    identity: UnixIdentity,
    roles: RoleSet,
}

impl UnixPrincipal {
    /// Build a principal for `identity`, naming its groups from `db`.
    ///
    /// Groups without an account entry are still matched by SID.
    #[must_use]
    pub fn new(identity: UnixIdentity, db: &AccountDb) -> Self {
        let mut roles = RoleSet::new(&identity.name)
            .with_role(EVERYONE)
            .with_role(AUTHENTICATED_USERS)
            .with_role(qualified_user(&identity.name))
            .with_sid(SecurityIdentifier::everyone())
            .with_sid(SecurityIdentifier::authenticated_users())
            .with_sid(SecurityIdentifier::unix_user(identity.uid));

        for gid in &identity.gids {
            roles.add_sid(SecurityIdentifier::unix_group(*gid));
            if let Some(group) = db.group_by_gid(*gid) {
                roles.add_role(&group.name);
                roles.add_role(qualified_group(&group.name));
            }
        }

        debug!(
            user = %identity.name,
            uid = identity.uid,
            roles = roles.role_count(),
            sids = roles.sid_count(),
            "Built principal"
        );

        Self { identity, roles }
    }

    /// The user `name` as listed in the account database.
    pub fn for_user(name: &str, db: &AccountDb) -> Result<Self> {
        let user = db
            .user_by_name(name)
            .ok_or_else(|| HostError::UnknownUser(name.to_string()))?;
        let identity = UnixIdentity {
            name: user.name.clone(),
            uid: user.uid,
            gids: db.group_ids_for(user),
        };
        Ok(Self::new(identity, db))
    }

    /// The identity of the running process.
    pub fn current(db: &AccountDb) -> Result<Self> {
        Self::current_from(Path::new(PROC_STATUS), db)
    }

    /// The identity described by a `/proc/<pid>/status` file.
    pub fn current_from(status: &Path, db: &AccountDb) -> Result<Self> {
        let content = std::fs::read_to_string(status)
            .map_err(|e| HostError::identity(format!("{}: {e}", status.display())))?;
        let status = parse_proc_status(&content)?;

        let name = db
            .user_by_uid(status.euid)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| status.euid.to_string());

        let mut gids = status.groups;
        gids.push(status.egid);
        gids.sort_unstable();
        gids.dedup();

        info!(user = %name, uid = status.euid, groups = gids.len(), "Resolved current identity");

        Ok(Self::new(
            UnixIdentity {
                name,
                uid: status.euid,
                gids,
            },
            db,
        ))
    }

    #[must_use]
    pub const fn identity(&self) -> &UnixIdentity {
        &self.identity
    }
}

impl Principal for UnixPrincipal {
    fn name(&self) -> &str {
        &self.identity.name
    }

    fn is_member_of_role(&self, role: &str) -> bool {
        self.roles.is_member_of_role(role)
    }

    fn is_member_of_sid(&self, sid: &SecurityIdentifier) -> bool {
        self.roles.is_member_of_sid(sid)
    }
}
