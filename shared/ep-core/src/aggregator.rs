//! Rights aggregation.

use crate::entry::AccessRule;
use crate::rights::FileSystemRights;

/// Fold applicable rules into effective rights.
///
/// Resolution order:
/// 1. Start with no rights
/// 2. Add the rights of every allow rule
/// 3. Remove the rights of every deny rule
///
/// Denies are applied after all allows, so the result does not depend on rule
/// order and a denied bit is never granted.
pub fn aggregate<'a, I>(applicable: I) -> FileSystemRights
where
    I: IntoIterator<Item = &'a AccessRule>,
{
    let mut allowed = FileSystemRights::empty();
    let mut denied = FileSystemRights::empty();

    for rule in applicable {
        if rule.is_allow() {
            allowed |= rule.rights;
        } else {
            denied |= rule.rights;
        }
    }

    allowed.difference(denied)
}
