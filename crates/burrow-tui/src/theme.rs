//! Colors for the browser.
//!
//! Terminal palette colors only, so the listing follows the user's terminal
//! scheme the way classic file listers do.

use burrow_core::EntryKind;
use ratatui::style::{Color, Modifier, Style};

use crate::render::Severity;

/// Styles used by the renderer.
#[derive(Debug, Clone)]
pub struct Theme {
    // Entry kinds
    pub directory: Style,
    pub file: Style,
    pub executable: Style,
    pub file_link: Style,
    pub directory_link: Style,

    // Rows
    pub marked: Style,
    pub pointer: Style,

    // Chrome
    pub header: Style,
    pub status: Style,
    pub prompt: Style,

    // Banners
    pub error: Style,
    pub warning: Style,
}

impl Theme {
    /// Style for an entry of `kind`.
    pub fn entry(&self, kind: EntryKind) -> Style {
        match kind {
            EntryKind::Directory => self.directory,
            EntryKind::DirectoryLink => self.directory_link,
            EntryKind::FileLink => self.file_link,
            EntryKind::Executable => self.executable,
            EntryKind::File => self.file,
        }
    }

    /// Whether `kind` is drawn bold, which also makes a bold pointer.
    pub fn is_bold(&self, kind: EntryKind) -> bool {
        self.entry(kind).add_modifier.contains(Modifier::BOLD)
    }

    pub fn banner(&self, severity: Severity) -> Style {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            directory: Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD),
            file: Style::new(),
            executable: Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
            file_link: Style::new().fg(Color::Cyan),
            directory_link: Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),

            marked: Style::new().fg(Color::Magenta),
            pointer: Style::new(),

            header: Style::new().add_modifier(Modifier::BOLD),
            status: Style::new(),
            prompt: Style::new().fg(Color::Yellow),

            error: Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
            warning: Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        }
    }
}
