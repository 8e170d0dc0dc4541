//! File operations engine for burrow.
//!
//! This crate provides the destructive half of the browser: a recursive copy
//! that never overwrites and never loops on hard links or self-nesting, a
//! staging area that turns deletes into moves, and the ledger that lets those
//! moves be undone one at a time or a whole batch at once.
//!
//! Everything here is synchronous. Operations run to completion or to their
//! first unrecoverable error; batch operations keep going past individual
//! failures and report an aggregate error at the end.

mod create;
mod error;
mod inode;
mod platform;
mod staging;
mod transfer;
mod undo;

pub use create::{create_directory, create_file, rename_entry, validate_name};
pub use error::{FailureSet, OpsError, OpsResult};
pub use inode::{InodeDedupSet, InodeKey};
pub use staging::StagingArea;
pub use transfer::{copy_tree, move_tree, remove_path};
pub use undo::{StagedDeletion, UndoLedger};
