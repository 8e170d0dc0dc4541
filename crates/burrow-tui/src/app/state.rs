//! Application mode and clipboard.

use std::path::PathBuf;

use strum::Display;

/// What keys are currently fed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// The inline prompt is open.
    Prompt(PromptKind),
    Quit,
}

/// What the inline prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PromptKind {
    #[strum(to_string = "New file")]
    CreateFile,
    #[strum(to_string = "New directory")]
    CreateDirectory,
    #[strum(to_string = "Rename")]
    Rename,
}

/// Clipboard mode determines paste behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMode {
    #[default]
    Empty,
    /// Paste copies.
    Copy,
    /// Paste moves, then empties the clipboard.
    Cut,
}

/// Paths waiting to be pasted.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    pub paths: Vec<PathBuf>,
    pub mode: ClipboardMode,
}

impl Clipboard {
    pub fn yank(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.paths = paths.into_iter().collect();
        self.mode = ClipboardMode::Copy;
    }

    pub fn cut(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.paths = paths.into_iter().collect();
        self.mode = ClipboardMode::Cut;
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.mode = ClipboardMode::Empty;
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_modes() {
        let mut clipboard = Clipboard::default();
        assert!(clipboard.is_empty());

        clipboard.yank([PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(clipboard.mode, ClipboardMode::Copy);
        assert_eq!(clipboard.len(), 2);

        clipboard.cut([PathBuf::from("/c")]);
        assert_eq!(clipboard.mode, ClipboardMode::Cut);
        assert_eq!(clipboard.paths, vec![PathBuf::from("/c")]);

        clipboard.clear();
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.mode, ClipboardMode::Empty);
    }

    #[test]
    fn test_prompt_labels() {
        assert_eq!(PromptKind::CreateFile.to_string(), "New file");
        assert_eq!(PromptKind::Rename.to_string(), "Rename");
    }
}
