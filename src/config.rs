//! Global configuration parsing, validation, and path resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::SessionConfig;
use crate::persistence::PuzzleStore;
use crate::{AppError, Result};

/// Directory under the home directory holding persisted application data.
pub const DATA_DIR_NAME: &str = ".chesscli";

/// File under the home directory holding the user's settings.
pub const USER_CONFIG_FILE: &str = ".chesscli.json";

/// Engine launch and timing settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Engine executable, resolved through `PATH`.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments passed to the engine executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Deadline for each readiness handshake step.
    #[serde(default = "default_handshake_timeout_seconds")]
    pub handshake_timeout_seconds: u64,
    /// Deadline for a search; 0 means no deadline.
    #[serde(default)]
    pub search_timeout_seconds: u64,
    /// Search depth used when the caller does not choose one.
    #[serde(default = "default_depth")]
    pub default_depth: u32,
}

impl EngineConfig {
    /// Session settings derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            program: self.program.clone(),
            args: self.args.clone(),
            handshake_timeout: Duration::from_secs(self.handshake_timeout_seconds),
            search_timeout: (self.search_timeout_seconds > 0)
                .then(|| Duration::from_secs(self.search_timeout_seconds)),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            handshake_timeout_seconds: default_handshake_timeout_seconds(),
            search_timeout_seconds: 0,
            default_depth: default_depth(),
        }
    }
}

/// Sound playback settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SoundConfig {
    /// Whether sounds are played at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// External program invoked with the audio file path.
    #[serde(default = "default_player")]
    pub player: String,
    /// Development asset directory holding the audio files.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: default_player(),
            asset_dir: default_asset_dir(),
        }
    }
}

/// Top-level application configuration.
///
/// Every field has a default, so an absent or empty file is valid.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Override for the persisted data directory (default `~/.chesscli`).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Sound settings.
    #[serde(default)]
    pub sound: SoundConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding persisted data, if one can be determined.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(DATA_DIR_NAME)))
    }

    /// Puzzle store rooted in [`data_dir`](Self::data_dir).
    #[must_use]
    pub fn puzzle_store(&self) -> Option<PuzzleStore> {
        self.data_dir().map(|dir| PuzzleStore::in_dir(&dir))
    }

    fn validate(&self) -> Result<()> {
        if self.engine.program.trim().is_empty() {
            return Err(AppError::Config("engine.program must not be empty".into()));
        }

        if self.engine.handshake_timeout_seconds == 0 {
            return Err(AppError::Config(
                "engine.handshake_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.engine.default_depth == 0 {
            return Err(AppError::Config(
                "engine.default_depth must be greater than zero".into(),
            ));
        }

        if self.sound.enabled && self.sound.player.trim().is_empty() {
            return Err(AppError::Config(
                "sound.player must not be empty when sound is enabled".into(),
            ));
        }

        Ok(())
    }
}

fn default_program() -> String {
    "stockfish".into()
}

fn default_handshake_timeout_seconds() -> u64 {
    10
}

fn default_depth() -> u32 {
    18
}

fn default_true() -> bool {
    true
}

fn default_player() -> String {
    "afplay".into()
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("priv").join("sound").join("lisp")
}
