//! Terminal user interface for burrow.
//!
//! This crate provides the interactive half of the browser, built with
//! ratatui: up to ten independent views of the file system, chorded vi-style
//! commands, an inline prompt for creating and renaming entries, and a
//! renderer that only repaints what a command changed.
//!
//! # Usage
//!
//! ```rust,no_run
//! use burrow_core::BrowserConfig;
//! use std::path::Path;
//!
//! let config = BrowserConfig::load(None).unwrap();
//! burrow_tui::run(config, Path::new(".")).unwrap();
//! ```
//!
//! # Keyboard Navigation
//!
//! - `j`/`k` - Move down/up
//! - `J`/`K` - Page down/up
//! - `gg`/`G` - First/last entry
//! - `h`/`l` - Parent directory/enter directory
//! - `Enter` - Enter directory or open file
//! - `Space` - Mark, `M` mark all, `Esc` clear marks
//! - `dd` - Delete, `D` delete marked
//! - `yy`/`x`/`p` - Yank/cut/paste
//! - `u` - Undo last delete
//! - `a`/`A`/`r` - New file/new directory/rename
//! - `0`-`9`, `Tab`/`Shift-Tab` - Switch view
//! - `q` - Quit, `Q` quit and remember the directory

pub mod app;
mod event;
pub mod render;
pub mod terminal;
mod theme;
mod ui;

use std::path::Path;

use burrow_core::BrowserConfig;

pub use app::{App, AppResult, Mode, Screen};
pub use event::{Chord, ChordState, Command, Key};
pub use render::{Banner, Damage, RenderDiff, RenderSink, Severity, StatusLine};
pub use terminal::{Console, Input, ProcessSpawner, TerminalIo};
pub use theme::Theme;

/// Run the browser on `start` until the user quits.
pub fn run(config: BrowserConfig, start: &Path) -> AppResult<()> {
    let mut app = App::new(config, start)?;

    let result = {
        let mut console = Console::new(Theme::default());
        app.run(&mut console)
    };

    // Terminal is restored by now; cleanup must run even after an error.
    let shutdown = app.shutdown();
    result?;
    shutdown
}
