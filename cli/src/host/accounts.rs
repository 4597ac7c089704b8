//! Local account database (`/etc/passwd`, `/etc/group`).
//!
//! Only the fields needed to name owners and compute group membership are
//! kept. Malformed lines are skipped.

use std::path::Path;

use tracing::debug;

use crate::error::{HostError, Result};

pub const PASSWD_PATH: &str = "/etc/passwd";
pub const GROUP_PATH: &str = "/etc/group";

/// One `/etc/passwd` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

/// One `/etc/group` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

/// Parsed account database.
#[derive(Debug, Clone, Default)]
pub struct AccountDb {
    users: Vec<UserEntry>,
    groups: Vec<GroupEntry>,
}

fn parse_user(line: &str) -> Option<UserEntry> {
    // name:password:uid:gid:gecos:home:shell
    let mut fields = line.split(':');
    let name = fields.next().filter(|n| !n.is_empty())?;
    let _password = fields.next()?;
    let uid = fields.next()?.parse().ok()?;
    let gid = fields.next()?.parse().ok()?;
    Some(UserEntry {
        name: name.to_string(),
        uid,
        gid,
    })
}

fn parse_group(line: &str) -> Option<GroupEntry> {
    // name:password:gid:member,member
    let mut fields = line.split(':');
    let name = fields.next().filter(|n| !n.is_empty())?;
    let _password = fields.next()?;
    let gid = fields.next()?.parse().ok()?;
    let members = fields
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    Some(GroupEntry {
        name: name.to_string(),
        gid,
        members,
    })
}

fn records<'a, T>(
    content: &'a str,
    kind: &'static str,
    parse: fn(&str) -> Option<T>,
) -> impl Iterator<Item = T> + 'a
where
    T: 'a,
{
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(move |line| {
            let parsed = parse(line);
            if parsed.is_none() {
                debug!(kind, line, "Skipping malformed account record");
            }
            parsed
        })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| HostError::AccountDatabase {
        path: path.to_path_buf(),
        source,
    })
}

impl AccountDb {
    /// Parse passwd and group file contents.
    #[must_use]
    pub fn parse(passwd: &str, group: &str) -> Self {
        Self {
            users: records(passwd, "passwd", parse_user).collect(),
            groups: records(group, "group", parse_group).collect(),
        }
    }

    /// Load the system account database.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(PASSWD_PATH), Path::new(GROUP_PATH))
    }

    /// Load the account database from explicit file paths.
    pub fn load_from(passwd: &Path, group: &Path) -> Result<Self> {
        Ok(Self::parse(&read(passwd)?, &read(group)?))
    }

    #[must_use]
    pub fn user_by_name(&self, name: &str) -> Option<&UserEntry> {
        self.users.iter().find(|u| u.name == name)
    }

    #[must_use]
    pub fn user_by_uid(&self, uid: u32) -> Option<&UserEntry> {
        self.users.iter().find(|u| u.uid == uid)
    }

    #[must_use]
    pub fn group_by_gid(&self, gid: u32) -> Option<&GroupEntry> {
        self.groups.iter().find(|g| g.gid == gid)
    }

    /// Gids of every group `user` belongs to: its primary group plus every
    /// group listing it as a member. Sorted, without duplicates.
    #[must_use]
    pub fn group_ids_for(&self, user: &UserEntry) -> Vec<u32> {
        let mut gids: Vec<u32> = std::iter::once(user.gid)
            .chain(
                self.groups
                    .iter()
                    .filter(|g| g.members.iter().any(|m| *m == user.name))
                    .map(|g| g.gid),
            )
            .collect();
        gids.sort_unstable();
        gids.dedup();
        gids
    }
}
