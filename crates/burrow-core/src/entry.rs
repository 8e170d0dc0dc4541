//! Directory entry types.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Classification of a directory child.
///
/// Computed once from metadata when a snapshot is taken and never re-derived
/// from the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Directory.
    Directory,
    /// Symbolic link to anything that is not a directory, including broken links.
    FileLink,
    /// Symbolic link resolving to a directory.
    DirectoryLink,
    /// Regular (or special) file with the owner-execute bit set.
    Executable,
    /// Any other file.
    File,
}

impl EntryKind {
    /// Classify from `lstat`-style metadata, resolving the link at `path` if needed.
    ///
    /// A link whose target cannot be resolved is a [`EntryKind::FileLink`].
    pub fn classify(path: &Path, meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_symlink() {
            match std::fs::metadata(path) {
                Ok(target) if target.is_dir() => Self::DirectoryLink,
                _ => Self::FileLink,
            }
        } else if meta.permissions().mode() & 0o100 != 0 {
            Self::Executable
        } else {
            Self::File
        }
    }

    /// Whether this entry can be descended into.
    pub fn is_dir_like(self) -> bool {
        matches!(self, Self::Directory | Self::DirectoryLink)
    }

    /// Short label shown in the status line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Directory => "dir",
            Self::FileLink => "@file",
            Self::DirectoryLink => "@dir",
            Self::Executable => "exec",
            Self::File => "file",
        }
    }
}

/// One child of a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: OsString,
    kind: EntryKind,
    /// Whether the user has marked this entry.
    pub marked: bool,
}

impl Entry {
    /// Create an unmarked entry.
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            marked: false,
        }
    }

    /// Raw file name.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// File name as bytes, used for ordering.
    pub fn name_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    /// Lossy display form of the name.
    pub fn display_name(&self) -> std::borrow::Cow<'_, str> {
        self.name.to_string_lossy()
    }

    /// Entry classification.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry can be descended into.
    pub fn is_dir_like(&self) -> bool {
        self.kind.is_dir_like()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_like_kinds() {
        assert!(EntryKind::Directory.is_dir_like());
        assert!(EntryKind::DirectoryLink.is_dir_like());
        assert!(!EntryKind::FileLink.is_dir_like());
        assert!(!EntryKind::Executable.is_dir_like());
        assert!(!EntryKind::File.is_dir_like());
    }

    #[test]
    fn test_labels() {
        assert_eq!(EntryKind::DirectoryLink.label(), "@dir");
        assert_eq!(EntryKind::FileLink.label(), "@file");
        assert_eq!(EntryKind::Executable.label(), "exec");
    }

    #[test]
    fn test_new_entry_is_unmarked() {
        let entry = Entry::new("notes.txt", EntryKind::File);
        assert!(!entry.marked);
        assert_eq!(entry.display_name(), "notes.txt");
        assert_eq!(entry.name_bytes(), b"notes.txt");
    }
}
