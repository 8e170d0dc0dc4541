//! Ledger of staged deletions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::staging::is_within;
use crate::{OpsError, OpsResult, copy_tree, remove_path};

/// One deleted entry, held in the staging directory under its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedDeletion {
    /// Numeric name of the staged copy. Strictly increasing, never reused.
    pub id: u64,
    /// Where the entry lived before it was deleted.
    pub original: PathBuf,
    /// Whether the entry was deleted as part of a batch.
    pub is_mass: bool,
    /// Batch the entry belongs to; 0 for single deletes.
    pub mass_group_id: u64,
}

impl StagedDeletion {
    /// Path of the staged copy inside `staging_dir`.
    pub fn staged_path(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(self.id.to_string())
    }
}

/// Stack of staged deletions, newest last.
#[derive(Debug, Default)]
pub struct UndoLedger {
    entries: Vec<StagedDeletion>,
    next_id: u64,
    last_group: u64,
}

impl UndoLedger {
    /// Create an empty ledger numbering from 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger whose first staged id is `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: first_id,
            ..Self::default()
        }
    }

    /// Open a new batch and return its group id.
    ///
    /// Call once per multi-entry delete; every call yields a fresh group.
    pub fn begin_mass(&mut self) -> u64 {
        self.last_group += 1;
        self.last_group
    }

    /// Move `original` into `staging_dir` and record it.
    ///
    /// The entry is copied first and the original removed only after the
    /// copy succeeded. If removal then fails the record is dropped and the
    /// error returned, so the ledger never points at an entry that was not
    /// actually deleted.
    ///
    /// An `original` that holds `staging_dir` is refused before anything is
    /// touched; removing it would take every staged entry with it.
    pub fn stage_delete(
        &mut self,
        original: &Path,
        staging_dir: &Path,
        mass_group_id: Option<u64>,
    ) -> OpsResult<StagedDeletion> {
        if is_within(staging_dir, original) {
            return Err(OpsError::HoldsStaging {
                path: original.to_path_buf(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        let entry = StagedDeletion {
            id,
            original: original.to_path_buf(),
            is_mass: mass_group_id.is_some(),
            mass_group_id: mass_group_id.unwrap_or(0),
        };
        let staged = entry.staged_path(staging_dir);
        if fs::symlink_metadata(&staged).is_ok() {
            return Err(OpsError::AlreadyExists { path: staged });
        }

        if let Err(err) = copy_tree(original, &staged) {
            discard_partial(&staged);
            return Err(err);
        }

        if let Err(err) = remove_path(original) {
            if fs::symlink_metadata(original).is_ok_and(|m| !m.is_dir()) {
                // Original untouched; the staged copy is redundant.
                discard_partial(&staged);
            } else {
                // A directory may be half removed. Keep what was staged so
                // nothing is lost before the staging area is purged.
                warn!(
                    original = %original.display(),
                    staged = %staged.display(),
                    "delete incomplete; staged copy kept unrecorded"
                );
            }
            return Err(err);
        }

        debug!(id, original = %original.display(), group = entry.mass_group_id, "staged");
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Restore the newest entry to its original path.
    ///
    /// On failure the entry stays on the ledger so the undo can be retried.
    pub fn undo_one(&mut self, staging_dir: &Path) -> OpsResult<PathBuf> {
        let entry = self.entries.last().ok_or(OpsError::NothingToUndo)?;
        restore(entry, staging_dir)?;

        let original = entry.original.clone();
        self.entries.pop();
        Ok(original)
    }

    /// Restore the newest entry and every directly preceding entry of the
    /// same batch.
    ///
    /// A single delete on top of the stack is restored alone. The first
    /// failure stops the walk; members already restored stay restored.
    pub fn undo_batch(&mut self, staging_dir: &Path) -> OpsResult<Vec<PathBuf>> {
        let top = self.entries.last().ok_or(OpsError::NothingToUndo)?;
        if !top.is_mass {
            return self.undo_one(staging_dir).map(|path| vec![path]);
        }

        let group = top.mass_group_id;
        let mut restored = Vec::new();
        while self
            .entries
            .last()
            .is_some_and(|e| e.is_mass && e.mass_group_id == group)
        {
            restored.push(self.undo_one(staging_dir)?);
        }
        info!(group, count = restored.len(), "batch restored");
        Ok(restored)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn restore(entry: &StagedDeletion, staging_dir: &Path) -> OpsResult<()> {
    let staged = entry.staged_path(staging_dir);
    if fs::symlink_metadata(&entry.original).is_ok() {
        return Err(OpsError::AlreadyExists {
            path: entry.original.clone(),
        });
    }

    if let Err(err) = copy_tree(&staged, &entry.original) {
        discard_partial(&entry.original);
        return Err(err);
    }

    if let Err(err) = remove_path(&staged) {
        warn!(path = %staged.display(), error = %err, "restored, but staged copy remains");
    }
    debug!(id = entry.id, original = %entry.original.display(), "restored");
    Ok(())
}

/// Remove what a failed copy left behind. Only called for paths verified
/// vacant before the copy started.
fn discard_partial(path: &Path) {
    if fs::symlink_metadata(path).is_err() {
        return;
    }
    if let Err(err) = remove_path(path) {
        warn!(path = %path.display(), error = %err, "failed to clean up partial copy");
    }
}
