//! Inode tracking for a single copy invocation.

use std::collections::HashMap;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Identity of a file on one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl InodeKey {
    /// Create a new inode key.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// Key of the file described by `meta`.
    pub fn of(meta: &Metadata) -> Self {
        Self::new(meta.dev(), meta.ino())
    }
}

/// Tracks inodes touched by one `copy_tree` call.
///
/// Two things are recorded:
///
/// - every directory and file the copy *created*, keyed by
///   `(device, inode, is_dir)`, so a walk that runs into its own output (a
///   directory copied into itself, or a tree growing underneath the copy) skips
///   it instead of recursing forever;
/// - for every source file already copied, where its copy landed, so the
///   next hard link to the same source inode is linked to that copy rather
///   than duplicated.
///
/// The set lives exactly as long as one top-level copy.
#[derive(Debug, Default)]
pub struct InodeDedupSet {
    created: HashMap<InodeKey, bool>,
    copied: HashMap<InodeKey, PathBuf>,
}

impl InodeDedupSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the copy created this inode with the given directory-ness.
    pub fn contains(&self, device: u64, inode: u64, is_dir: bool) -> bool {
        self.created.get(&InodeKey::new(device, inode)) == Some(&is_dir)
    }

    /// Record an inode created by the copy.
    pub fn insert(&mut self, device: u64, inode: u64, is_dir: bool) {
        self.created.insert(InodeKey::new(device, inode), is_dir);
    }

    /// Remember that the source file `source` was materialized at `dest`.
    pub fn record_copy(&mut self, source: InodeKey, dest: impl Into<PathBuf>) {
        self.copied.entry(source).or_insert_with(|| dest.into());
    }

    /// Where an earlier hard link of `source` was copied to, if anywhere.
    pub fn copied_to(&self, source: InodeKey) -> Option<&Path> {
        self.copied.get(&source).map(PathBuf::as_path)
    }

    /// Number of inodes created so far.
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// Check if nothing has been created yet.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = InodeDedupSet::new();
        assert!(!set.contains(1, 12345, false));

        set.insert(1, 12345, false);
        assert!(set.contains(1, 12345, false));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_directory_flag_must_match() {
        let mut set = InodeDedupSet::new();
        set.insert(1, 7, true);
        assert!(set.contains(1, 7, true));
        assert!(!set.contains(1, 7, false));
    }

    #[test]
    fn test_different_devices() {
        let mut set = InodeDedupSet::new();
        set.insert(1, 12345, false);
        assert!(!set.contains(2, 12345, false)); // Same inode, different device
    }

    #[test]
    fn test_first_copy_wins() {
        let mut set = InodeDedupSet::new();
        let key = InodeKey::new(3, 99);
        assert!(set.copied_to(key).is_none());

        set.record_copy(key, "/dst/a");
        set.record_copy(key, "/dst/b");
        assert_eq!(set.copied_to(key), Some(Path::new("/dst/a")));
        assert!(set.is_empty());
    }
}
