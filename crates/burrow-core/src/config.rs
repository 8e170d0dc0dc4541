//! Browser configuration.
//!
//! One [`BrowserConfig`] is resolved at startup from, in order of increasing
//! priority: built-in defaults, the TOML config file, and `BURROW_*`
//! environment variables. The generic `EDITOR`, `SHELL` and `OPENER`
//! variables only fill programs that are still unset.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of views.
pub const MAX_VIEWS: usize = 10;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this structure.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value failed validation.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Startup configuration consumed by the browser and its renderer.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct BrowserConfig {
    /// Program used to edit files.
    #[builder(default)]
    pub editor: Option<String>,

    /// Interactive shell spawned in the current directory.
    #[builder(default)]
    pub shell: Option<String>,

    /// Program used to open files with their default application.
    #[builder(default)]
    pub opener: Option<String>,

    /// Staging directory for undoable deletes. `None` picks a per-process
    /// directory under the system temp dir; an empty path disables staging.
    #[builder(default)]
    pub staging_dir: Option<PathBuf>,

    /// Leave the staging directory in place at exit.
    #[builder(default = "false")]
    pub keep_staging: bool,

    /// Enter opens files with the opener instead of the editor.
    #[builder(default = "false")]
    pub enter_opens: bool,

    /// Glyph drawn in front of the selected row.
    #[builder(default = "\"->\".to_string()")]
    pub pointer: String,

    /// Symbol drawn at the start of marked, non-selected rows.
    #[builder(default = "'^'")]
    pub mark_symbol: char,

    /// Draw the pointer bold for entries that are drawn bold.
    #[builder(default = "true")]
    pub bold_pointer: bool,

    /// Reverse video on the selected row.
    #[builder(default = "true")]
    pub invert_selection: bool,

    /// Reverse the whole selected row rather than only the name.
    #[builder(default = "true")]
    pub invert_full_selection: bool,

    /// Only indent the selected row by the pointer width.
    #[builder(default = "true")]
    pub indent_selection: bool,

    /// Number of independent views (1 to 10).
    #[builder(default = "2")]
    pub view_count: usize,

    /// Allow spaces in names of new files and directories.
    #[builder(default = "true")]
    pub allow_spaces: bool,

    /// List dot-files on startup.
    #[builder(default = "false")]
    pub show_hidden: bool,

    /// Show the home directory as `~` in the header.
    #[builder(default = "true")]
    pub abbreviate_home: bool,

    /// File that receives the working directory when quitting with `Q`.
    #[builder(default)]
    pub cd_on_close: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            editor: None,
            shell: None,
            opener: None,
            staging_dir: None,
            keep_staging: false,
            enter_opens: false,
            pointer: "->".to_string(),
            mark_symbol: '^',
            bold_pointer: true,
            invert_selection: true,
            invert_full_selection: true,
            indent_selection: true,
            view_count: 2,
            allow_spaces: true,
            show_hidden: false,
            abbreviate_home: true,
            cd_on_close: None,
        }
    }
}

impl BrowserConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(dir)) = &self.staging_dir {
            check_staging_dir(dir)?;
        }
        if let Some(pointer) = &self.pointer {
            check_pointer(pointer)?;
        }
        Ok(())
    }
}

impl BrowserConfig {
    /// Create a new config builder.
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("burrow").join("config.toml"))
    }

    /// Load configuration from `path` (or the default location) and the
    /// process environment.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.normalize()?;
        Ok(config)
    }

    /// Parse a config file, returning defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        resolve_program(&mut self.editor, &lookup, "BURROW_EDITOR", "EDITOR");
        resolve_program(&mut self.shell, &lookup, "BURROW_SHELL", "SHELL");
        resolve_program(&mut self.opener, &lookup, "BURROW_OPENER", "OPENER");

        if let Some(tmp) = lookup("BURROW_TMP") {
            self.staging_dir = Some(PathBuf::from(tmp));
        }
        if let Some(file) = lookup("BURROW_CD_ON_CLOSE").filter(|f| !f.is_empty()) {
            self.cd_on_close = Some(PathBuf::from(file));
        }
    }

    /// Clamp ranges and validate values.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        self.view_count = self.view_count.clamp(1, MAX_VIEWS);

        if let Some(dir) = &self.staging_dir {
            check_staging_dir(dir).map_err(|message| ConfigError::Invalid { message })?;
        }
        check_pointer(&self.pointer).map_err(|message| ConfigError::Invalid { message })?;
        if self.mark_symbol.is_control() {
            return Err(ConfigError::Invalid {
                message: "mark_symbol cannot be a control character".to_string(),
            });
        }
        Ok(())
    }

    /// Resolved staging directory, or `None` when staging is disabled.
    pub fn staging_path(&self) -> Option<PathBuf> {
        match &self.staging_dir {
            None => Some(std::env::temp_dir().join(format!("burrow-{}", std::process::id()))),
            Some(dir) if dir.as_os_str().is_empty() => None,
            Some(dir) => Some(dir.clone()),
        }
    }

    /// Width taken by the pointer column, including the separating space.
    pub fn pointer_width(&self) -> usize {
        self.pointer.chars().count() + 1
    }
}

fn resolve_program(
    slot: &mut Option<String>,
    lookup: &impl Fn(&str) -> Option<String>,
    specific: &str,
    generic: &str,
) {
    if let Some(value) = lookup(specific).filter(|v| !v.is_empty()) {
        *slot = Some(value);
    } else if slot.is_none() {
        *slot = lookup(generic).filter(|v| !v.is_empty());
    }
}

fn check_staging_dir(dir: &Path) -> Result<(), String> {
    if !dir.as_os_str().is_empty() && !dir.is_absolute() {
        return Err(format!(
            "staging_dir must be an absolute path: {}",
            dir.display()
        ));
    }
    Ok(())
}

fn check_pointer(pointer: &str) -> Result<(), String> {
    if pointer.chars().any(char::is_control) {
        return Err("pointer cannot contain control characters".to_string());
    }
    Ok(())
}
