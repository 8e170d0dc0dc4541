//! Core types for burrow.
//!
//! This crate provides the pieces every other burrow crate builds on:
//! directory entries and their classification, the locale-free natural
//! ordering used to sort listings, directory snapshots, and the startup
//! configuration.

mod config;
mod entry;
mod error;
mod natural;
mod snapshot;

pub use config::{BrowserConfig, BrowserConfigBuilder, ConfigError, MAX_VIEWS};
pub use entry::{Entry, EntryKind};
pub use error::CoreError;
pub use natural::natural_cmp;
pub use snapshot::{snapshot, sort_entries};
