//! Creating and renaming single entries.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{OpsError, OpsResult};

/// Longest name most filesystems accept, in bytes.
const NAME_MAX: usize = 255;

/// Check a proposed file name.
///
/// Accepts the POSIX portable file name characters (`A-Z a-z 0-9 . _ -`),
/// plus the space when `allow_spaces` is set.
pub fn validate_name(name: &str, allow_spaces: bool) -> OpsResult<()> {
    if name.is_empty() {
        return Err(OpsError::invalid_name(name, "name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(OpsError::invalid_name(name, "reserved name"));
    }
    if name.len() > NAME_MAX {
        return Err(OpsError::invalid_name(
            name,
            format!("name is too long (max {NAME_MAX} bytes)"),
        ));
    }
    if let Some(c) = name.chars().find(|&c| !is_portable(c, allow_spaces)) {
        let reason = match c {
            '/' | '\0' => format!("name cannot contain {c:?}"),
            ' ' => "spaces are not allowed".to_string(),
            _ => format!("{c:?} is not a portable file name character"),
        };
        return Err(OpsError::invalid_name(name, reason));
    }
    Ok(())
}

fn is_portable(c: char, allow_spaces: bool) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') || (allow_spaces && c == ' ')
}

/// Create an empty file `name` in `dir`. Never overwrites.
pub fn create_file(dir: &Path, name: &str, allow_spaces: bool) -> OpsResult<PathBuf> {
    validate_name(name, allow_spaces)?;
    let path = dir.join(name);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| OpsError::io(&path, e))?;
    debug!(path = %path.display(), "created file");
    Ok(path)
}

/// Create a directory `name` in `dir`. Never overwrites.
pub fn create_directory(dir: &Path, name: &str, allow_spaces: bool) -> OpsResult<PathBuf> {
    validate_name(name, allow_spaces)?;
    let path = dir.join(name);
    fs::create_dir(&path).map_err(|e| OpsError::io(&path, e))?;
    debug!(path = %path.display(), "created directory");
    Ok(path)
}

/// Rename `from` to `new_name` within the same directory.
///
/// Refuses to replace an existing entry; renaming to the current name is
/// a no-op.
pub fn rename_entry(from: &Path, new_name: &str, allow_spaces: bool) -> OpsResult<PathBuf> {
    validate_name(new_name, allow_spaces)?;
    let parent = from.parent().unwrap_or(Path::new("/"));
    let to = parent.join(new_name);
    if to == from {
        return Ok(to);
    }
    if fs::symlink_metadata(&to).is_ok() {
        return Err(OpsError::AlreadyExists { path: to });
    }
    fs::rename(from, &to).map_err(|e| OpsError::io(from, e))?;
    debug!(from = %from.display(), to = %to.display(), "renamed");
    Ok(to)
}
