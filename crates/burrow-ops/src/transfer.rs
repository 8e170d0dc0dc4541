//! Recursive copy, move and removal.

use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, FileTypeExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::FailureSet;
use crate::inode::{InodeDedupSet, InodeKey};
use crate::{OpsError, OpsResult, platform};

/// Permission bits carried over to a copy.
const MODE_MASK: u32 = 0o7777;

/// Copy `src` to `dst` recursively.
///
/// Nothing is ever overwritten: `dst` must not exist, and neither may any
/// path created underneath it. Symlinks are replicated by their link text and
/// never followed. Hard-linked files inside the tree are copied once and
/// linked for every further name. Directories keep going after a child fails
/// and report the failures once the walk is finished.
pub fn copy_tree(src: &Path, dst: &Path) -> OpsResult<()> {
    let mut seen = InodeDedupSet::new();
    let umask = platform::current_umask();
    debug!(src = %src.display(), dst = %dst.display(), "copy");
    copy_entry(src, dst, &mut seen, umask)
}

/// Move `src` to `dst`, falling back to copy-then-remove across devices.
pub fn move_tree(src: &Path, dst: &Path) -> OpsResult<()> {
    ensure_vacant(src, None, dst)?;

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(src = %src.display(), "rename crosses devices, copying");
            copy_tree(src, dst)?;
            remove_path(src)
        }
        Err(err) => Err(OpsError::io(src, err)),
    }
}

/// Remove a file, symlink or whole directory tree.
pub fn remove_path(path: &Path) -> OpsResult<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| OpsError::io(path, e))?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| OpsError::io(path, e))
}

fn copy_entry(src: &Path, dst: &Path, seen: &mut InodeDedupSet, umask: u32) -> OpsResult<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| OpsError::io(src, e))?;
    let file_type = meta.file_type();

    if seen.contains(meta.dev(), meta.ino(), file_type.is_dir()) {
        trace!(path = %src.display(), "skipping inode created by this copy");
        return Ok(());
    }

    ensure_vacant(src, Some(&meta), dst)?;

    if file_type.is_dir() {
        copy_directory(src, dst, &meta, seen, umask)
    } else if file_type.is_file() {
        copy_file(src, dst, &meta, seen)
    } else if file_type.is_symlink() {
        let target = fs::read_link(src).map_err(|e| OpsError::io(src, e))?;
        std::os::unix::fs::symlink(&target, dst).map_err(|e| OpsError::io(dst, e))
    } else if file_type.is_block_device()
        || file_type.is_char_device()
        || file_type.is_fifo()
        || file_type.is_socket()
    {
        platform::make_node(dst, meta.mode(), meta.rdev()).map_err(|e| OpsError::io(dst, e))?;
        preserve(dst, &meta);
        Ok(())
    } else {
        Err(OpsError::Unsupported {
            path: src.to_path_buf(),
        })
    }
}

/// Refuse a destination that exists, and name the same-file case separately.
fn ensure_vacant(src: &Path, src_meta: Option<&Metadata>, dst: &Path) -> OpsResult<()> {
    match fs::symlink_metadata(dst) {
        Ok(existing) => {
            let source = match src_meta {
                Some(meta) => InodeKey::of(meta),
                None => {
                    InodeKey::of(&fs::symlink_metadata(src).map_err(|e| OpsError::io(src, e))?)
                }
            };
            if InodeKey::of(&existing) == source {
                Err(OpsError::SameFile {
                    path: dst.to_path_buf(),
                })
            } else {
                Err(OpsError::AlreadyExists {
                    path: dst.to_path_buf(),
                })
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(OpsError::io(dst, err)),
    }
}

fn copy_directory(
    src: &Path,
    dst: &Path,
    meta: &Metadata,
    seen: &mut InodeDedupSet,
    umask: u32,
) -> OpsResult<()> {
    // Owner rwx until populated, whatever the source says.
    let populate_mode = (meta.mode() & MODE_MASK & !umask) | 0o700;
    fs::DirBuilder::new()
        .mode(populate_mode)
        .create(dst)
        .map_err(|e| OpsError::io(dst, e))?;
    fs::set_permissions(dst, Permissions::from_mode(populate_mode))
        .map_err(|e| OpsError::io(dst, e))?;

    let created = fs::symlink_metadata(dst).map_err(|e| OpsError::io(dst, e))?;
    seen.insert(created.dev(), created.ino(), true);

    let mut failures = FailureSet::default();
    match fs::read_dir(src) {
        Ok(children) => {
            for child in children {
                let child = match child {
                    Ok(child) => child,
                    Err(err) => {
                        failures.record(OpsError::io(src, err));
                        continue;
                    }
                };
                let name = child.file_name();
                if let Err(err) = copy_entry(&src.join(&name), &dst.join(&name), seen, umask) {
                    warn!(error = %err, "copy failed");
                    failures.record(err);
                }
            }
        }
        Err(err) => failures.record(OpsError::io(src, err)),
    }

    // Times last: adding children bumps the directory mtime.
    preserve(dst, meta);
    failures.into_result()
}

fn copy_file(src: &Path, dst: &Path, meta: &Metadata, seen: &mut InodeDedupSet) -> OpsResult<()> {
    let source_key = InodeKey::of(meta);
    if meta.nlink() > 1 {
        if let Some(first) = seen.copied_to(source_key) {
            trace!(path = %src.display(), first = %first.display(), "linking to earlier copy");
            return fs::hard_link(first, dst).map_err(|e| OpsError::io(dst, e));
        }
    }

    let mut reader = File::open(src).map_err(|e| OpsError::io(src, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(meta.mode() & MODE_MASK)
        .open(dst)
        .map_err(|e| OpsError::io(dst, e))?;

    let created = writer.metadata().map_err(|e| OpsError::io(dst, e))?;
    seen.insert(created.dev(), created.ino(), false);

    // io::copy goes through write_all, so a short write surfaces as WriteZero.
    if let Err(err) = io::copy(&mut reader, &mut writer) {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(dst) {
            warn!(path = %dst.display(), error = %cleanup, "failed to remove partial copy");
        }
        return Err(OpsError::io(dst, err));
    }
    drop(writer);

    if meta.nlink() > 1 {
        seen.record_copy(source_key, dst);
    }
    preserve(dst, meta);
    Ok(())
}

/// Best effort: carry over times, owner and mode. Failure is expected when
/// not running as the owner and is only logged.
fn preserve(path: &Path, meta: &Metadata) {
    let atime = (meta.atime(), meta.atime_nsec());
    let mtime = (meta.mtime(), meta.mtime_nsec());
    if let Err(err) = platform::set_times(path, atime, mtime) {
        debug!(path = %path.display(), error = %err, "could not preserve times");
    }
    if let Err(err) = std::os::unix::fs::chown(path, Some(meta.uid()), Some(meta.gid())) {
        debug!(path = %path.display(), error = %err, "could not preserve owner");
    }
    if let Err(err) = fs::set_permissions(path, Permissions::from_mode(meta.mode() & MODE_MASK)) {
        debug!(path = %path.display(), error = %err, "could not preserve mode");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        fs::write(&src, b"hello").unwrap();

        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"x").unwrap();
        platform::set_times(&src, (0, 0), (1_000_000_000, 0)).unwrap();

        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::metadata(&dst).unwrap().mtime(), 1_000_000_000);
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_tree(&dir.path().join("nope"), &dir.path().join("dst")).unwrap_err();
        assert!(matches!(err, OpsError::Io { .. }));
        assert!(!dir.path().join("dst").exists());
    }

    #[test]
    fn test_move_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"a").unwrap();
        fs::write(&dst, b"b").unwrap();

        let err = move_tree(&src, &dst).unwrap_err();
        assert!(matches!(err, OpsError::AlreadyExists { .. }));
        assert_eq!(fs::read(&dst).unwrap(), b"b");
        assert!(src.exists());
    }

    #[test]
    fn test_move_renames() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("inner"), b"x").unwrap();
        let dst = dir.path().join("b");

        move_tree(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("inner")).unwrap(), b"x");
    }

    #[test]
    fn test_remove_path_does_not_follow_links() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_path(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.join("keep").exists());
    }
}
