//! The terminal and child processes.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crossterm::event::{Event, KeyEventKind};
use ratatui::DefaultTerminal;
use tracing::debug;

use crate::app::Screen;
use crate::event::Key;
use crate::render::{Banner, RenderDiff, RenderSink, StatusLine};
use crate::theme::Theme;
use crate::ui;

/// One input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    Resize { rows: u16, cols: u16 },
}

/// Source of decoded keys.
pub trait TerminalIo {
    /// Block until the next key (or resize).
    fn read_key(&mut self) -> io::Result<Input>;

    /// Current size as `(rows, cols)`.
    fn viewport_size(&self) -> io::Result<(u16, u16)>;
}

/// Runs external programs in the foreground.
pub trait ProcessSpawner {
    /// Run `program` with `arg` in `cwd` and wait for it. The terminal
    /// belongs to the child until it exits.
    fn run_foreground(
        &mut self,
        cwd: &Path,
        program: &str,
        arg: Option<&Path>,
    ) -> io::Result<ExitStatus>;
}

/// Build the command line for `program`, which may carry its own arguments
/// separated by whitespace (`"code -w"`).
pub(crate) fn command_for(cwd: &Path, program: &str, arg: Option<&Path>) -> io::Result<Command> {
    let mut words = program.split_whitespace();
    let binary = words
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty program"))?;
    let mut cmd = Command::new(binary);
    cmd.args(words).current_dir(cwd);
    if let Some(arg) = arg {
        cmd.arg(arg);
    }
    Ok(cmd)
}

/// The real terminal, driven through ratatui and crossterm.
pub struct Console {
    terminal: DefaultTerminal,
    theme: Theme,
    last: Option<(StatusLine, Option<Banner>)>,
}

impl Console {
    /// Enter raw mode and the alternate screen.
    pub fn new(theme: Theme) -> Self {
        Self {
            terminal: ratatui::init(),
            theme,
            last: None,
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        ratatui::restore();
    }
}

impl TerminalIo for Console {
    fn read_key(&mut self) -> io::Result<Input> {
        loop {
            match crossterm::event::read()? {
                Event::Key(event) if event.kind == KeyEventKind::Press => {
                    if let Some(key) = Key::from_event(event) {
                        return Ok(Input::Key(key));
                    }
                }
                Event::Resize(cols, rows) => return Ok(Input::Resize { rows, cols }),
                _ => {}
            }
        }
    }

    fn viewport_size(&self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.height, size.width))
    }
}

impl ProcessSpawner for Console {
    fn run_foreground(
        &mut self,
        cwd: &Path,
        program: &str,
        arg: Option<&Path>,
    ) -> io::Result<ExitStatus> {
        let mut cmd = command_for(cwd, program, arg)?;
        debug!(?cmd, "running in foreground");

        ratatui::restore();
        let status = cmd.status();
        self.terminal = ratatui::init();
        self.last = None;
        status
    }
}

impl RenderSink for Console {
    /// Row damage is not tracked here; ratatui diffs the frame buffer itself.
    fn present(&mut self, screen: &Screen<'_>, diff: &RenderDiff) -> io::Result<()> {
        let summary = (diff.status, diff.banner.clone());
        if diff.damage.is_none() && self.last.as_ref() == Some(&summary) {
            return Ok(());
        }
        let theme = &self.theme;
        self.terminal
            .draw(|frame| ui::draw(frame, screen, theme))?;
        self.last = Some(summary);
        Ok(())
    }
}
