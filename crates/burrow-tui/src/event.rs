//! Key decoding: terminal events to keys, keys to commands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use strum::Display;

/// A single pre-decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    ShiftUp,
    ShiftDown,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Backspace,
    Delete,
    Esc,
    Tab,
    BackTab,
}

impl Key {
    /// Convert a crossterm key event. Keys the browser has no use for map to `None`.
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let alt = event.modifiers.contains(KeyModifiers::ALT);
        let shift = event.modifiers.contains(KeyModifiers::SHIFT);

        let key = match event.code {
            KeyCode::Char(c) if ctrl => Key::Ctrl(c.to_ascii_lowercase()),
            KeyCode::Char(_) if alt => return None,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Up if shift => Key::ShiftUp,
            KeyCode::Down if shift => Key::ShiftDown,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Esc => Key::Esc,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            _ => return None,
        };
        Some(key)
    }
}

/// Command issued to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    // Navigation
    MoveDown,
    MoveUp,
    PageDown,
    PageUp,
    GoTop,
    GoBottom,
    Ascend,
    /// Descend into a directory, or edit a file.
    Descend,
    /// Like `Descend`, but files go to the opener when configured so.
    Enter,

    // Marks
    ToggleMark,
    MarkAll,
    ClearMarks,

    // File operations
    Delete,
    MassDelete,
    Yank,
    Cut,
    Paste,
    Undo,
    CreateFile,
    CreateDirectory,
    Rename,

    // External programs
    Edit,
    Open,
    Shell,

    // Display
    ToggleHidden,
    Refresh,
    SwitchView(usize),
    NextView,
    PrevView,

    // Application
    Quit,
    QuitWithCd,

    /// First half of a chord was pressed.
    Pending,
    None,
}

impl Command {
    /// Map a single key press, outside of any chord.
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Char('j') | Key::Down => Command::MoveDown,
            Key::Char('k') | Key::Up => Command::MoveUp,
            Key::Char('J') | Key::PageDown | Key::ShiftDown => Command::PageDown,
            Key::Char('K') | Key::PageUp | Key::ShiftUp => Command::PageUp,
            Key::Home => Command::GoTop,
            Key::Char('G') | Key::End => Command::GoBottom,
            Key::Char('h') | Key::Left | Key::Backspace => Command::Ascend,
            Key::Char('l') | Key::Right => Command::Descend,
            Key::Enter => Command::Enter,

            Key::Char(' ') => Command::ToggleMark,
            Key::Char('M') => Command::MarkAll,
            Key::Esc => Command::ClearMarks,

            Key::Char('D') => Command::MassDelete,
            Key::Char('x') => Command::Cut,
            Key::Char('p') => Command::Paste,
            Key::Char('u') => Command::Undo,
            Key::Char('a') => Command::CreateFile,
            Key::Char('A') => Command::CreateDirectory,
            Key::Char('r') => Command::Rename,

            Key::Char('e') => Command::Edit,
            Key::Char('o') => Command::Open,
            Key::Char('S') => Command::Shell,

            Key::Char('.') => Command::ToggleHidden,
            Key::Char('R') | Key::Ctrl('l') => Command::Refresh,
            Key::Char('0') => Command::SwitchView(9),
            Key::Char(c @ '1'..='9') => Command::SwitchView(c as usize - '1' as usize),
            Key::Tab => Command::NextView,
            Key::BackTab => Command::PrevView,

            Key::Char('q') => Command::Quit,
            Key::Char('Q') => Command::QuitWithCd,

            _ => Command::None,
        }
    }
}

/// Commands that take two identical key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Chord {
    Delete,
    Yank,
    Top,
}

impl Chord {
    fn started_by(key: Key) -> Option<Self> {
        match key {
            Key::Char('d') => Some(Chord::Delete),
            Key::Char('y') => Some(Chord::Yank),
            Key::Char('g') => Some(Chord::Top),
            _ => None,
        }
    }

    fn key(self) -> Key {
        match self {
            Chord::Delete => Key::Char('d'),
            Chord::Yank => Key::Char('y'),
            Chord::Top => Key::Char('g'),
        }
    }

    fn command(self) -> Command {
        match self {
            Chord::Delete => Command::Delete,
            Chord::Yank => Command::Yank,
            Chord::Top => Command::GoTop,
        }
    }
}

/// The half-entered chord of one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChordState {
    pending: Option<Chord>,
}

impl ChordState {
    /// Chord waiting for its second key.
    pub fn pending(&self) -> Option<Chord> {
        self.pending
    }

    /// Drop any half-entered chord.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Decode `key` into a command.
    ///
    /// A second press of the pending chord's key fires it. Any other key
    /// cancels the pending chord and is then decoded on its own, so it may
    /// start a chord of its own.
    pub fn decode(&mut self, key: Key) -> Command {
        if let Some(chord) = self.pending.take() {
            if key == chord.key() {
                return chord.command();
            }
        }
        if let Some(chord) = Chord::started_by(key) {
            self.pending = Some(chord);
            return Command::Pending;
        }
        Command::from_key(key)
    }
}
