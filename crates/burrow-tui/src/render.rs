//! What changed after a state transition, for whoever draws the screen.

use std::io;

use strum::Display;

use crate::app::Screen;

/// Which entry rows need to be redrawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Damage {
    /// Nothing in the list changed.
    #[default]
    None,
    /// Only these entry indices changed.
    Rows(Vec<usize>),
    /// Redraw everything.
    Full,
}

impl Damage {
    /// Rows for a selection that moved from `old` to `new` without scrolling.
    pub fn moved(old: usize, new: usize) -> Self {
        if old == new {
            Damage::None
        } else {
            Damage::Rows(vec![old, new])
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Damage::None)
    }
}

/// The status line's numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusLine {
    /// Selection index (0-based).
    pub position: usize,
    /// Number of entries.
    pub total: usize,
    /// Number of marked entries.
    pub marks: usize,
}

/// Banner prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Severity {
    Error,
    Warning,
}

/// A message shown in place of the status line until the next command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub severity: Severity,
    pub message: String,
}

impl Banner {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Banner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, " {}: {}", self.severity, self.message)
    }
}

/// Emitted after every handled input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderDiff {
    pub damage: Damage,
    pub status: StatusLine,
    pub banner: Option<Banner>,
}

/// Consumer of render diffs.
///
/// The screen gives read access to the state the diff describes, for sinks
/// that draw it. `Damage::Rows` is a hint; a sink may redraw more.
pub trait RenderSink {
    fn present(&mut self, screen: &Screen<'_>, diff: &RenderDiff) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_to_same_row_is_none() {
        assert!(Damage::moved(4, 4).is_none());
    }

    #[test]
    fn test_banner_format() {
        assert_eq!(Banner::error("boom").to_string(), " Error: boom");
        assert_eq!(Banner::warning("careful").to_string(), " Warning: careful");
    }
}
