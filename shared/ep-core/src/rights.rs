//! File-system rights using bitflags.
//!
//! Bit values follow the conventional file-system access mask layout:
//! - Data access (bits 0-8): read/write/append data, attributes, execute
//! - Standard rights (bits 16-20): delete, read/change permissions, ownership, synchronize
//!
//! Composite rights (`READ`, `WRITE`, `MODIFY`, ...) are unions of the single
//! bits and are what the named predicates test against.

use std::fmt;

use bitflags::bitflags;

use crate::error::RightsParseError;

bitflags! {
    /// File-system rights represented as a 32-bit access mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct FileSystemRights: u32 {
        // === Data access (bits 0-8) ===
        /// Read file contents, or list a directory
        const READ_DATA                       = 1 << 0;
        /// Write file contents, or create files in a directory
        const WRITE_DATA                      = 1 << 1;
        /// Append to a file, or create subdirectories
        const APPEND_DATA                     = 1 << 2;
        /// Read extended attributes
        const READ_EXTENDED_ATTRIBUTES        = 1 << 3;
        /// Write extended attributes
        const WRITE_EXTENDED_ATTRIBUTES       = 1 << 4;
        /// Execute a file, or traverse a directory
        const EXECUTE_FILE                    = 1 << 5;
        /// Delete a directory and every file it contains
        const DELETE_SUBDIRECTORIES_AND_FILES = 1 << 6;
        /// Read basic attributes (timestamps, flags)
        const READ_ATTRIBUTES                 = 1 << 7;
        /// Write basic attributes
        const WRITE_ATTRIBUTES                = 1 << 8;

        // === Standard rights (bits 16-20) ===
        /// Delete the object itself
        const DELETE                          = 1 << 16;
        /// Read the access-control list
        const READ_PERMISSIONS                = 1 << 17;
        /// Change the access-control list
        const CHANGE_PERMISSIONS              = 1 << 18;
        /// Take ownership of the object
        const TAKE_OWNERSHIP                  = 1 << 19;
        /// Wait on the object handle
        const SYNCHRONIZE                     = 1 << 20;
    }
}

impl FileSystemRights {
    // === Aliases ===

    /// Directory spelling of [`Self::READ_DATA`].
    pub const LIST_DIRECTORY: Self = Self::READ_DATA;
    /// Directory spelling of [`Self::WRITE_DATA`].
    pub const CREATE_FILES: Self = Self::WRITE_DATA;
    /// Directory spelling of [`Self::APPEND_DATA`].
    pub const CREATE_DIRECTORIES: Self = Self::APPEND_DATA;
    /// Directory spelling of [`Self::EXECUTE_FILE`].
    pub const TRAVERSE: Self = Self::EXECUTE_FILE;

    // === Composites ===

    /// Read data, attributes, extended attributes and permissions.
    pub const READ: Self = Self::READ_DATA
        .union(Self::READ_EXTENDED_ATTRIBUTES)
        .union(Self::READ_ATTRIBUTES)
        .union(Self::READ_PERMISSIONS);

    /// Write data, append, and write attributes and extended attributes.
    pub const WRITE: Self = Self::WRITE_DATA
        .union(Self::APPEND_DATA)
        .union(Self::WRITE_EXTENDED_ATTRIBUTES)
        .union(Self::WRITE_ATTRIBUTES);

    /// [`Self::READ`] plus execute/traverse.
    pub const READ_AND_EXECUTE: Self = Self::READ.union(Self::EXECUTE_FILE);

    /// Read, write, execute and delete, without permission or ownership changes.
    pub const MODIFY: Self = Self::READ_AND_EXECUTE
        .union(Self::WRITE)
        .union(Self::DELETE);

    /// Every right.
    pub const FULL_CONTROL: Self = Self::MODIFY
        .union(Self::DELETE_SUBDIRECTORIES_AND_FILES)
        .union(Self::CHANGE_PERMISSIONS)
        .union(Self::TAKE_OWNERSHIP)
        .union(Self::SYNCHRONIZE);

    /// Named values in descending order, composites included.
    ///
    /// Rendering walks this table greedily so composites win over the bits
    /// they cover.
    const NAMED: &'static [(&'static str, Self)] = &[
        ("FullControl", Self::FULL_CONTROL),
        ("Synchronize", Self::SYNCHRONIZE),
        ("TakeOwnership", Self::TAKE_OWNERSHIP),
        ("ChangePermissions", Self::CHANGE_PERMISSIONS),
        ("Modify", Self::MODIFY),
        ("ReadAndExecute", Self::READ_AND_EXECUTE),
        ("Read", Self::READ),
        ("ReadPermissions", Self::READ_PERMISSIONS),
        ("Delete", Self::DELETE),
        ("Write", Self::WRITE),
        ("WriteAttributes", Self::WRITE_ATTRIBUTES),
        ("ReadAttributes", Self::READ_ATTRIBUTES),
        ("DeleteSubdirectoriesAndFiles", Self::DELETE_SUBDIRECTORIES_AND_FILES),
        ("ExecuteFile", Self::EXECUTE_FILE),
        ("WriteExtendedAttributes", Self::WRITE_EXTENDED_ATTRIBUTES),
        ("ReadExtendedAttributes", Self::READ_EXTENDED_ATTRIBUTES),
        ("AppendData", Self::APPEND_DATA),
        ("WriteData", Self::WRITE_DATA),
        ("ReadData", Self::READ_DATA),
    ];

    /// Directory aliases accepted by [`Self::parse_name`] but never rendered.
    const ALIASES: &'static [(&'static str, Self)] = &[
        ("ListDirectory", Self::LIST_DIRECTORY),
        ("CreateFiles", Self::CREATE_FILES),
        ("CreateDirectories", Self::CREATE_DIRECTORIES),
        ("Traverse", Self::TRAVERSE),
    ];

    // === Permission Checking ===

    /// Check if this mask includes every bit of `rights`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ep_core::FileSystemRights;
    ///
    /// let rights = FileSystemRights::READ | FileSystemRights::SYNCHRONIZE;
    /// assert!(rights.has(FileSystemRights::READ_DATA));
    /// assert!(!rights.has(FileSystemRights::WRITE));
    /// ```
    #[must_use]
    pub const fn has(self, rights: Self) -> bool {
        self.contains(rights)
    }

    /// Look up a single named right or composite.
    ///
    /// Matching ignores ASCII case, spaces and underscores, so `"Read"`,
    /// `"READ_AND_EXECUTE"` and `"read and execute"` all resolve.
    pub fn parse_name(name: &str) -> Result<Self, RightsParseError> {
        let wanted = normalize(name);
        Self::NAMED
            .iter()
            .chain(Self::ALIASES)
            .find(|(candidate, _)| normalize(candidate) == wanted)
            .map(|(_, rights)| *rights)
            .ok_or_else(|| RightsParseError::UnknownRight(name.to_string()))
    }

    /// Union of several names, as written in rule files.
    pub fn from_names<I, S>(names: I) -> Result<Self, RightsParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::empty(), |acc, name| {
            Ok(acc | Self::parse_name(name.as_ref())?)
        })
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != ' ' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Default for FileSystemRights {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for FileSystemRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        let mut remaining = *self;
        let mut picked = Vec::new();
        for (name, value) in Self::NAMED {
            if remaining.contains(*value) {
                remaining.remove(*value);
                picked.push(*name);
            }
        }

        let mut first = true;
        for name in picked.iter().rev() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            first = false;
        }

        // Only reachable for values built with from_bits_retain.
        if !remaining.is_empty() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{:#x}", remaining.bits())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Bit Position Tests ===

    #[test]
    fn test_data_access_bits() {
        assert_eq!(FileSystemRights::READ_DATA.bits(), 0x1);
        assert_eq!(FileSystemRights::WRITE_DATA.bits(), 0x2);
        assert_eq!(FileSystemRights::APPEND_DATA.bits(), 0x4);
        assert_eq!(FileSystemRights::READ_EXTENDED_ATTRIBUTES.bits(), 0x8);
        assert_eq!(FileSystemRights::WRITE_EXTENDED_ATTRIBUTES.bits(), 0x10);
        assert_eq!(FileSystemRights::EXECUTE_FILE.bits(), 0x20);
        assert_eq!(FileSystemRights::DELETE_SUBDIRECTORIES_AND_FILES.bits(), 0x40);
        assert_eq!(FileSystemRights::READ_ATTRIBUTES.bits(), 0x80);
        assert_eq!(FileSystemRights::WRITE_ATTRIBUTES.bits(), 0x100);
    }

    #[test]
    fn test_standard_rights_bits() {
        assert_eq!(FileSystemRights::DELETE.bits(), 0x10000);
        assert_eq!(FileSystemRights::READ_PERMISSIONS.bits(), 0x20000);
        assert_eq!(FileSystemRights::CHANGE_PERMISSIONS.bits(), 0x40000);
        assert_eq!(FileSystemRights::TAKE_OWNERSHIP.bits(), 0x80000);
        assert_eq!(FileSystemRights::SYNCHRONIZE.bits(), 0x100000);
    }

    // === Composite Tests ===

    #[test]
    fn test_composite_values() {
        assert_eq!(FileSystemRights::READ.bits(), 0x20089);
        assert_eq!(FileSystemRights::WRITE.bits(), 0x116);
        assert_eq!(FileSystemRights::READ_AND_EXECUTE.bits(), 0x200A9);
        assert_eq!(FileSystemRights::MODIFY.bits(), 0x301BF);
        assert_eq!(FileSystemRights::FULL_CONTROL.bits(), 0x1F01FF);
    }

    #[test]
    fn test_full_control_is_all() {
        assert_eq!(FileSystemRights::FULL_CONTROL, FileSystemRights::all());
    }

    #[test]
    fn test_read_and_execute_extends_read() {
        assert!(FileSystemRights::READ_AND_EXECUTE.has(FileSystemRights::READ));
        assert!(!FileSystemRights::READ.has(FileSystemRights::READ_AND_EXECUTE));
    }

    // === Display Tests ===

    #[test]
    fn test_display_empty() {
        assert_eq!(FileSystemRights::empty().to_string(), "None");
    }

    #[test]
    fn test_display_prefers_composites() {
        let rights = FileSystemRights::MODIFY | FileSystemRights::SYNCHRONIZE;
        assert_eq!(rights.to_string(), "Modify, Synchronize");
    }

    #[test]
    fn test_display_full_control() {
        assert_eq!(FileSystemRights::FULL_CONTROL.to_string(), "FullControl");
    }

    #[test]
    fn test_display_ascending_singles() {
        let rights = FileSystemRights::READ_DATA | FileSystemRights::DELETE;
        assert_eq!(rights.to_string(), "ReadData, Delete");
    }

    #[test]
    fn test_display_read_and_write() {
        let rights = FileSystemRights::READ | FileSystemRights::WRITE;
        assert_eq!(rights.to_string(), "Write, Read");
    }

    #[test]
    fn test_display_unknown_bits() {
        let rights = FileSystemRights::from_bits_retain(0x1 | 0x8000_0000);
        assert_eq!(rights.to_string(), "ReadData, 0x80000000");
    }

    // === Parsing Tests ===

    #[test]
    fn test_parse_name_variants() {
        assert_eq!(FileSystemRights::parse_name("Read").unwrap(), FileSystemRights::READ);
        assert_eq!(
            FileSystemRights::parse_name("READ_AND_EXECUTE").unwrap(),
            FileSystemRights::READ_AND_EXECUTE
        );
        assert_eq!(
            FileSystemRights::parse_name("full control").unwrap(),
            FileSystemRights::FULL_CONTROL
        );
        assert_eq!(
            FileSystemRights::parse_name("traverse").unwrap(),
            FileSystemRights::EXECUTE_FILE
        );
    }

    #[test]
    fn test_parse_name_unknown() {
        let err = FileSystemRights::parse_name("Fly").unwrap_err();
        assert!(err.to_string().contains("Fly"));
    }

    #[test]
    fn test_parse_name_alongside_flag_names() {
        // Flag identifiers keep working through the bitflags lookup.
        assert_eq!(
            FileSystemRights::from_name("READ_DATA"),
            Some(FileSystemRights::READ_DATA)
        );
        assert_eq!(FileSystemRights::from_name("ReadData"), None);
        assert_eq!(
            FileSystemRights::parse_name("ReadData").unwrap(),
            FileSystemRights::READ_DATA
        );
    }

    #[test]
    fn test_from_names_unions() {
        let rights = FileSystemRights::from_names(["Read", "Delete"]).unwrap();
        assert_eq!(rights, FileSystemRights::READ | FileSystemRights::DELETE);
        assert_eq!(
            FileSystemRights::from_names(Vec::<String>::new()).unwrap(),
            FileSystemRights::empty()
        );
    }
}
