//! The process-owned directory that deleted entries are moved into.

use std::fs;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{OpsError, OpsResult, remove_path};

/// Holding area for staged deletions.
///
/// Every staged entry is stored directly under the directory as a numeric
/// file name assigned by the [`UndoLedger`](crate::UndoLedger).
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    next_id: u64,
}

impl StagingArea {
    /// Create (or reopen) the staging directory at `root`.
    ///
    /// The directory is owner-only. When it already exists, the numbering
    /// resumes above the largest numeric name found in it.
    pub fn open(root: impl Into<PathBuf>) -> OpsResult<Self> {
        let root = root.into();
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(&root)
            .map_err(|e| OpsError::io(&root, e))?;
        fs::set_permissions(&root, fs::Permissions::from_mode(0o700))
            .map_err(|e| OpsError::io(&root, e))?;

        let next_id = fs::read_dir(&root)
            .map_err(|e| OpsError::io(&root, e))?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u64>().ok())
            .max()
            .map_or(0, |max| max + 1);

        info!(path = %root.display(), next_id, "staging area ready");
        Ok(Self { root, next_id })
    }

    /// Path of the staging directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First id that is safe to hand out.
    pub fn first_free_id(&self) -> u64 {
        self.next_id
    }

    /// Path a staged entry with this id lives at.
    pub fn slot(&self, id: u64) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Whether acting on `path` would touch the staging directory: it is
    /// the staging directory, lies inside it, or holds it.
    ///
    /// Both sides are compared after canonicalization when possible, so
    /// `..` detours and symlinked parents are caught.
    pub fn protects(&self, path: &Path) -> bool {
        is_within(path, &self.root) || is_within(&self.root, path)
    }

    /// Remove the staging directory and everything in it.
    pub fn purge(&self) -> OpsResult<()> {
        if !self.root.exists() {
            return Ok(());
        }
        debug!(path = %self.root.display(), "purging staging area");
        remove_path(&self.root).inspect_err(|err| {
            warn!(error = %err, "failed to purge staging area");
        })
    }
}

/// Whether `path` is `dir` or lies below it.
///
/// The last component of `path` is not resolved, so a symlink is judged by
/// where it sits rather than where it points.
pub(crate) fn is_within(path: &Path, dir: &Path) -> bool {
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    resolve_parent(path).starts_with(dir)
}

fn resolve_parent(path: &Path) -> PathBuf {
    let resolved = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            fs::canonicalize(parent).map(|p| p.join(name))
        }
        _ => fs::canonicalize(path),
    };
    resolved.unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_private_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("stage");
        let staging = StagingArea::open(&root).unwrap();

        let mode = fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
        assert_eq!(staging.first_free_id(), 0);
    }

    #[test]
    fn test_reopen_resumes_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("stage");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("3"), b"").unwrap();
        fs::create_dir(root.join("11")).unwrap();
        fs::write(root.join("notes"), b"").unwrap();

        let staging = StagingArea::open(&root).unwrap();
        assert_eq!(staging.first_free_id(), 12);
        assert_eq!(staging.slot(12), root.join("12"));
    }

    #[test]
    fn test_protects_inside_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj/stage");
        let staging = StagingArea::open(&root).unwrap();
        fs::write(dir.path().join("other"), b"").unwrap();

        assert!(staging.protects(&root));
        assert!(staging.protects(&root.join("0")));
        assert!(staging.protects(&dir.path().join("proj/stage/../stage")));
        assert!(staging.protects(&dir.path().join("proj")));
        assert!(staging.protects(dir.path()));
        assert!(!staging.protects(&dir.path().join("other")));
        assert!(!staging.protects(&dir.path().join("proj/sibling")));
    }

    #[test]
    fn test_symlink_to_parent_is_not_protected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj/stage");
        let staging = StagingArea::open(&root).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path().join("proj"), &link).unwrap();

        // Removing the link leaves its target alone.
        assert!(!staging.protects(&link));
        assert!(staging.protects(&link.join("stage")));
    }

    #[test]
    fn test_purge() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("stage");
        let staging = StagingArea::open(&root).unwrap();
        fs::write(staging.slot(0), b"x").unwrap();

        staging.purge().unwrap();
        assert!(!root.exists());
        staging.purge().unwrap();
    }
}
