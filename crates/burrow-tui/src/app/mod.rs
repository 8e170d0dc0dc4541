//! Main application state and logic.

mod input;
mod state;
mod view;

pub use input::{InputResult, InputState};
pub use state::{Clipboard, ClipboardMode, Mode, PromptKind};
pub use view::{View, ViewSet};

use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use burrow_core::BrowserConfig;
use burrow_ops::{
    FailureSet, OpsError, StagingArea, UndoLedger, copy_tree, create_directory, create_file,
    move_tree, remove_path, rename_entry,
};
use color_eyre::eyre::WrapErr;
use strum::Display;
use tracing::{debug, error, info, warn};

use crate::event::{Command, Key};
use crate::render::{Banner, Damage, RenderDiff, RenderSink};
use crate::terminal::{Input, ProcessSpawner, TerminalIo};

/// Result type for application operations.
pub type AppResult<T> = color_eyre::Result<T>;

/// Terminal height assumed until the real one is known.
const DEFAULT_ROWS: u16 = 24;

/// Read-only view of the state a renderer needs.
pub struct Screen<'a> {
    pub view: &'a View,
    pub view_index: usize,
    pub config: &'a BrowserConfig,
    pub prompt: Option<(PromptKind, &'a InputState)>,
    /// Home directory, when it should be abbreviated to `~`.
    pub home: Option<&'a Path>,
}

/// External programs the browser can hand the terminal to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
enum External {
    Editor,
    Opener,
    Shell,
}

/// Main application state.
pub struct App {
    /// Startup configuration.
    config: BrowserConfig,
    /// The views; one is active.
    views: ViewSet,
    /// Staged deletions that can be undone.
    ledger: UndoLedger,
    /// `None` when staging is disabled and deletes are permanent.
    staging: Option<StagingArea>,
    clipboard: Clipboard,
    mode: Mode,
    /// Prompt line, live while in `Mode::Prompt`.
    input: InputState,
    home: Option<PathBuf>,
    /// Quit was requested with `Q`.
    cd_on_exit: bool,
}

impl App {
    /// Open `start` and set up the staging area.
    pub fn new(config: BrowserConfig, start: &Path) -> AppResult<Self> {
        let wd = fs::canonicalize(start)
            .wrap_err_with(|| format!("Cannot open {}", start.display()))?;

        let staging = match config.staging_path() {
            Some(dir) => Some(
                StagingArea::open(&dir)
                    .wrap_err_with(|| format!("Cannot create staging directory {}", dir.display()))?,
            ),
            None => {
                info!("staging disabled, deletes are permanent");
                None
            }
        };
        let ledger = staging
            .as_ref()
            .map_or_else(UndoLedger::new, |s| UndoLedger::starting_at(s.first_free_id()));

        let mut views = ViewSet::new(config.view_count, &wd, DEFAULT_ROWS, config.show_hidden);
        views
            .active_mut()
            .refresh()
            .wrap_err("No readable directory to show")?;

        let home = if config.abbreviate_home {
            dirs::home_dir()
        } else {
            None
        };

        Ok(Self {
            config,
            views,
            ledger,
            staging,
            clipboard: Clipboard::default(),
            mode: Mode::Normal,
            input: InputState::new(),
            home,
            cd_on_exit: false,
        })
    }

    /// Run until quit: read a key, handle it, present the result.
    pub fn run<C>(&mut self, console: &mut C) -> AppResult<()>
    where
        C: TerminalIo + ProcessSpawner + RenderSink,
    {
        let (rows, _) = console.viewport_size()?;
        self.views.resize(rows);
        console.present(&self.screen(), &self.diff(Damage::Full))?;

        while self.mode != Mode::Quit {
            let diff = match console.read_key()? {
                Input::Key(key) => self.handle_key(key, console)?,
                Input::Resize { rows, .. } => {
                    self.views.resize(rows);
                    self.diff(Damage::Full)
                }
            };
            console.present(&self.screen(), &diff)?;
        }
        Ok(())
    }

    /// Exit cleanup: purge the staging area and, after `Q`, write the
    /// working directory to the configured file.
    pub fn shutdown(self) -> AppResult<()> {
        if let Some(staging) = &self.staging
            && !self.config.keep_staging
        {
            // Failure is logged by purge; nothing more to do at exit.
            let _ = staging.purge();
        }

        if self.cd_on_exit
            && let Some(file) = &self.config.cd_on_close
        {
            let wd = self.views.active().wd();
            fs::write(file, wd.as_os_str().as_bytes())
                .wrap_err_with(|| format!("Cannot write {}", file.display()))?;
            debug!(file = %file.display(), wd = %wd.display(), "wrote exit directory");
        }
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn view(&self) -> &View {
        self.views.active()
    }

    fn view_mut(&mut self) -> &mut View {
        self.views.active_mut()
    }

    pub fn views(&self) -> &ViewSet {
        &self.views
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    pub fn staging(&self) -> Option<&StagingArea> {
        self.staging.as_ref()
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn screen(&self) -> Screen<'_> {
        Screen {
            view: self.views.active(),
            view_index: self.views.index(),
            config: &self.config,
            prompt: match self.mode {
                Mode::Prompt(kind) => Some((kind, &self.input)),
                _ => None,
            },
            home: self.home.as_deref(),
        }
    }

    fn diff(&self, damage: Damage) -> RenderDiff {
        let view = self.views.active();
        RenderDiff {
            damage,
            status: view.status(),
            banner: view.banner().cloned(),
        }
    }

    /// Handle one key and describe what changed.
    pub fn handle_key<S: ProcessSpawner>(
        &mut self,
        key: Key,
        spawner: &mut S,
    ) -> AppResult<RenderDiff> {
        let damage = match self.mode {
            Mode::Normal => {
                let command = self.view_mut().chord.decode(key);
                self.execute(command, spawner)?
            }
            Mode::Prompt(kind) => self.handle_prompt_key(kind, key)?,
            Mode::Quit => Damage::None,
        };
        Ok(self.diff(damage))
    }

    /// Execute a decoded command.
    ///
    /// Errors from file operations become banners. Only the loss of every
    /// readable directory is returned as an error.
    pub fn execute<S: ProcessSpawner>(
        &mut self,
        command: Command,
        spawner: &mut S,
    ) -> AppResult<Damage> {
        if !matches!(command, Command::None | Command::Pending) {
            debug!(%command, "executing");
            self.view_mut().clear_banner();
        }

        let damage = match command {
            Command::MoveDown => self.view_mut().move_down(),
            Command::MoveUp => self.view_mut().move_up(),
            Command::PageDown => self.view_mut().page_down(),
            Command::PageUp => self.view_mut().page_up(),
            Command::GoTop => self.view_mut().go_top(),
            Command::GoBottom => self.view_mut().go_bottom(),
            Command::Ascend => {
                if self.view_mut().ascend()? {
                    Damage::Full
                } else {
                    Damage::None
                }
            }
            Command::Descend => self.descend_or_open(External::Editor, spawner)?,
            Command::Enter => {
                let program = if self.config.enter_opens {
                    External::Opener
                } else {
                    External::Editor
                };
                self.descend_or_open(program, spawner)?
            }

            Command::ToggleMark => self.toggle_mark(),
            Command::MarkAll => {
                let staging = &self.staging;
                self.views
                    .active_mut()
                    .mark_all(|path| !staging.as_ref().is_some_and(|s| s.protects(path)))
            }
            Command::ClearMarks => self.view_mut().clear_marks(),

            Command::Delete => self.delete_current()?,
            Command::MassDelete => self.delete_marked()?,
            Command::Yank => self.fill_clipboard(ClipboardMode::Copy),
            Command::Cut => self.fill_clipboard(ClipboardMode::Cut),
            Command::Paste => self.paste()?,
            Command::Undo => self.undo()?,
            Command::CreateFile => self.open_prompt(PromptKind::CreateFile),
            Command::CreateDirectory => self.open_prompt(PromptKind::CreateDirectory),
            Command::Rename => self.open_prompt(PromptKind::Rename),

            Command::Edit => {
                let target = self.view().current_path();
                self.spawn(External::Editor, target, spawner)?
            }
            Command::Open => {
                let target = self.view().current_path();
                self.spawn(External::Opener, target, spawner)?
            }
            Command::Shell => self.spawn(External::Shell, None, spawner)?,

            Command::ToggleHidden => {
                self.view_mut().toggle_hidden()?;
                Damage::Full
            }
            Command::Refresh => {
                self.view_mut().refresh()?;
                Damage::Full
            }
            Command::SwitchView(index) => {
                if self.views.switch(index)? {
                    Damage::Full
                } else {
                    Damage::None
                }
            }
            Command::NextView => {
                if self.views.next()? {
                    Damage::Full
                } else {
                    Damage::None
                }
            }
            Command::PrevView => {
                if self.views.prev()? {
                    Damage::Full
                } else {
                    Damage::None
                }
            }

            Command::Quit => {
                self.mode = Mode::Quit;
                Damage::None
            }
            Command::QuitWithCd => {
                self.cd_on_exit = true;
                self.mode = Mode::Quit;
                Damage::None
            }

            Command::Pending | Command::None => Damage::None,
        };
        Ok(damage)
    }

    fn report(&mut self, err: OpsError) {
        let banner = if err.is_warning() {
            Banner::warning(err.to_string())
        } else {
            error!(error = %err, "operation failed");
            Banner::error(err.to_string())
        };
        self.view_mut().set_banner(banner);
    }

    fn warn_user(&mut self, message: impl Into<String>) {
        self.view_mut().set_banner(Banner::warning(message));
    }

    /// The staging directory, anything in it, or any directory holding it.
    fn is_protected(&self, path: &Path) -> bool {
        self.staging.as_ref().is_some_and(|s| s.protects(path))
    }

    fn refuse_protected(&mut self, action: &str) {
        self.warn_user(format!(
            "Cannot {action} the staging directory or a directory holding it"
        ));
    }

    fn descend_or_open<S: ProcessSpawner>(
        &mut self,
        program: External,
        spawner: &mut S,
    ) -> AppResult<Damage> {
        let Some(entry) = self.view().current() else {
            return Ok(Damage::None);
        };
        if entry.is_dir_like() {
            self.view_mut().descend()?;
            return Ok(Damage::Full);
        }
        let target = self.view().current_path();
        self.spawn(program, target, spawner)
    }

    fn spawn<S: ProcessSpawner>(
        &mut self,
        which: External,
        arg: Option<PathBuf>,
        spawner: &mut S,
    ) -> AppResult<Damage> {
        let program = match which {
            External::Editor => self.config.editor.clone(),
            External::Opener => self.config.opener.clone(),
            External::Shell => self.config.shell.clone(),
        };
        let Some(program) = program else {
            self.warn_user(format!("No {which} configured"));
            return Ok(Damage::None);
        };

        let wd = self.view().wd().to_path_buf();
        match spawner.run_foreground(&wd, &program, arg.as_deref()) {
            Ok(status) if status.success() => {}
            Ok(status) => self.warn_user(format!("{program} exited with {status}")),
            Err(err) => {
                error!(%program, error = %err, "failed to run");
                self.view_mut().set_banner(Banner::error(format!("{program}: {err}")));
            }
        }
        // The child may have changed anything.
        self.view_mut().refresh()?;
        Ok(Damage::Full)
    }

    fn toggle_mark(&mut self) -> Damage {
        match self.view().current_path() {
            Some(path) if self.is_protected(&path) => {
                self.refuse_protected("mark");
                Damage::None
            }
            Some(_) => self.view_mut().toggle_mark(),
            None => Damage::None,
        }
    }

    fn delete_current(&mut self) -> AppResult<Damage> {
        let Some(path) = self.view().current_path() else {
            return Ok(Damage::None);
        };
        if self.is_protected(&path) {
            self.refuse_protected("delete");
            return Ok(Damage::None);
        }

        let result = match &self.staging {
            Some(staging) => self.ledger.stage_delete(&path, staging.root(), None).map(drop),
            None => remove_path(&path),
        };
        if let Err(err) = result {
            self.report(err);
        }
        self.view_mut().refresh()?;
        Ok(Damage::Full)
    }

    fn delete_marked(&mut self) -> AppResult<Damage> {
        let marked = self.view().marked_paths();
        if marked.is_empty() {
            self.warn_user("Nothing marked");
            return Ok(Damage::None);
        }
        let (paths, skipped): (Vec<PathBuf>, Vec<PathBuf>) =
            marked.into_iter().partition(|p| !self.is_protected(p));
        if paths.is_empty() {
            self.refuse_protected("delete");
            return Ok(Damage::None);
        }

        // One group per invocation, so the whole batch undoes together.
        let group = self.staging.is_some().then(|| self.ledger.begin_mass());
        let mut failures = FailureSet::default();
        for path in &paths {
            let result = match (&self.staging, group) {
                (Some(staging), Some(group)) => self
                    .ledger
                    .stage_delete(path, staging.root(), Some(group))
                    .map(drop),
                _ => remove_path(path),
            };
            if let Err(err) = result {
                warn!(path = %path.display(), error = %err, "delete failed");
                failures.record(err);
            }
        }
        info!(count = paths.len(), failed = failures.failed(), ?group, "mass delete");

        if let Err(err) = failures.into_result() {
            self.report(err);
        } else if !skipped.is_empty() {
            self.refuse_protected("delete");
        }
        self.view_mut().refresh()?;
        Ok(Damage::Full)
    }

    fn fill_clipboard(&mut self, mode: ClipboardMode) -> Damage {
        let view = self.view();
        let paths = if view.marks() > 0 {
            view.marked_paths()
        } else {
            view.current_path().into_iter().collect()
        };
        if paths.is_empty() {
            return Damage::None;
        }
        if paths.iter().any(|p| self.is_protected(p)) {
            let action = match mode {
                ClipboardMode::Cut => "cut",
                _ => "yank",
            };
            self.refuse_protected(action);
            return Damage::None;
        }
        debug!(count = paths.len(), ?mode, "clipboard filled");
        match mode {
            ClipboardMode::Cut => self.clipboard.cut(paths),
            _ => self.clipboard.yank(paths),
        }
        Damage::None
    }

    fn paste(&mut self) -> AppResult<Damage> {
        if self.clipboard.is_empty() {
            self.warn_user("Clipboard is empty");
            return Ok(Damage::None);
        }
        let wd = self.view().wd().to_path_buf();
        let cut = self.clipboard.mode == ClipboardMode::Cut;

        let mut failures = FailureSet::default();
        let mut remaining = Vec::new();
        let mut last: Option<OsString> = None;
        for src in &self.clipboard.paths {
            let Some(name) = src.file_name() else {
                continue;
            };
            let dst = wd.join(name);
            let result = if cut {
                move_tree(src, &dst)
            } else {
                copy_tree(src, &dst)
            };
            match result {
                Ok(()) => last = Some(name.to_os_string()),
                Err(err) => {
                    warn!(src = %src.display(), error = %err, "paste failed");
                    failures.record(err);
                    remaining.push(src.clone());
                }
            }
        }

        if cut {
            // Keep only what did not move, so a retry does not trip on the rest.
            if remaining.is_empty() {
                self.clipboard.clear();
            } else {
                self.clipboard.cut(remaining);
            }
        }
        if let Some(name) = last {
            self.view_mut().relocate_to(name);
        }
        if let Err(err) = failures.into_result() {
            self.report(err);
        }
        self.view_mut().refresh()?;
        Ok(Damage::Full)
    }

    fn undo(&mut self) -> AppResult<Damage> {
        let Some(staging) = &self.staging else {
            self.report(OpsError::StagingDisabled);
            return Ok(Damage::None);
        };
        let result = self.ledger.undo_batch(staging.root());

        match result {
            Ok(restored) => {
                let wd = self.view().wd().to_path_buf();
                let here = restored
                    .iter()
                    .filter(|p| p.parent() == Some(wd.as_path()))
                    .find_map(|p| p.file_name())
                    .map(|name| name.to_os_string());
                if let Some(name) = here {
                    self.view_mut().relocate_to(name);
                }
            }
            Err(err) => self.report(err),
        }
        self.view_mut().refresh()?;
        Ok(Damage::Full)
    }

    fn open_prompt(&mut self, kind: PromptKind) -> Damage {
        self.input = match kind {
            PromptKind::Rename => {
                if self
                    .view()
                    .current_path()
                    .is_some_and(|path| self.is_protected(&path))
                {
                    self.refuse_protected("rename");
                    return Damage::None;
                }
                let Some(entry) = self.view().current() else {
                    return Damage::None;
                };
                match entry.name().to_str() {
                    Some(name) => InputState::with_initial(name),
                    None => {
                        self.warn_user("Name is not valid UTF-8");
                        return Damage::None;
                    }
                }
            }
            PromptKind::CreateFile | PromptKind::CreateDirectory => InputState::new(),
        };
        self.mode = Mode::Prompt(kind);
        Damage::Full
    }

    fn handle_prompt_key(&mut self, kind: PromptKind, key: Key) -> AppResult<Damage> {
        match self.input.handle_key(key) {
            InputResult::Continue => {}
            InputResult::Cancel => self.mode = Mode::Normal,
            InputResult::Submit(name) => {
                self.mode = Mode::Normal;
                self.submit_prompt(kind, &name)?;
            }
        }
        Ok(Damage::Full)
    }

    fn submit_prompt(&mut self, kind: PromptKind, name: &str) -> AppResult<()> {
        self.view_mut().clear_banner();
        let wd = self.view().wd().to_path_buf();
        let allow_spaces = self.config.allow_spaces;

        let result = match kind {
            PromptKind::CreateFile => create_file(&wd, name, allow_spaces),
            PromptKind::CreateDirectory => create_directory(&wd, name, allow_spaces),
            PromptKind::Rename => match self.view().current_path() {
                Some(path) => rename_entry(&path, name, allow_spaces),
                None => return Ok(()),
            },
        };
        match result {
            Ok(_) => self.view_mut().relocate_to(name),
            Err(err) => self.report(err),
        }
        self.view_mut().refresh()?;
        Ok(())
    }
}
