//! Directory snapshots.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::entry::{Entry, EntryKind};
use crate::error::CoreError;
use crate::natural::natural_cmp;

/// Read the children of `path` into a sorted list of entries.
///
/// `.` and `..` are never listed; other dot-files only when `include_hidden`
/// is set. A child whose metadata cannot be read is skipped with a warning.
/// The call fails only when the directory itself cannot be opened.
pub fn snapshot(path: &Path, include_hidden: bool) -> Result<Vec<Entry>, CoreError> {
    let dir = fs::read_dir(path).map_err(|e| CoreError::io(path, e))?;

    let mut entries = Vec::new();
    for child in dir {
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(dir = %path.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let name = child.file_name();
        if !include_hidden && name.as_encoded_bytes().first() == Some(&b'.') {
            continue;
        }

        let child_path = child.path();
        // DirEntry::metadata does not traverse the final symlink.
        let meta = match child.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %child_path.display(), error = %e, "skipping entry without metadata");
                continue;
            }
        };

        entries.push(Entry::new(name, EntryKind::classify(&child_path, &meta)));
    }

    sort_entries(&mut entries);
    debug!(dir = %path.display(), count = entries.len(), "snapshot taken");
    Ok(entries)
}

/// Sort entries: directories and directory links first, then natural order by
/// name. Names that compare equal fall back to raw byte order so the result
/// does not depend on the order the OS returned them in.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(entry_cmp);
}

fn entry_cmp(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir_like()
        .cmp(&a.is_dir_like())
        .then_with(|| natural_cmp(a.name_bytes(), b.name_bytes()))
        .then_with(|| a.name_bytes().cmp(b.name_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_dirs_first() {
        let mut entries = vec![
            Entry::new("b.txt", EntryKind::File),
            Entry::new("a.txt", EntryKind::File),
            Entry::new("dir1", EntryKind::Directory),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.display_name().into_owned()).collect();
        assert_eq!(names, vec!["dir1", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_sort_dir_links_group_with_dirs() {
        let mut entries = vec![
            Entry::new("zeta", EntryKind::Executable),
            Entry::new("beta", EntryKind::DirectoryLink),
            Entry::new("alpha", EntryKind::FileLink),
            Entry::new("gamma", EntryKind::Directory),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.display_name().into_owned()).collect();
        assert_eq!(names, vec!["beta", "gamma", "alpha", "zeta"]);
    }

    #[test]
    fn test_case_ties_are_deterministic() {
        let mut one = vec![
            Entry::new("a", EntryKind::File),
            Entry::new("A", EntryKind::File),
        ];
        let mut two = vec![
            Entry::new("A", EntryKind::File),
            Entry::new("a", EntryKind::File),
        ];
        sort_entries(&mut one);
        sort_entries(&mut two);
        assert_eq!(one, two);
    }
}
