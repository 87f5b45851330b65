//! Best-effort sound effects through an external player process.
//!
//! Audio files are located through a [`SoundPaths`] record built once at
//! startup and handed to the [`SoundPlayer`]: either the development asset
//! directory, or bundled bytes extracted to a fresh temp directory so that an
//! external player can open them.
//!
//! The `chesscli` binary has no embedded audio and always plays from the
//! configured asset directory. An application that ships its sounds inside
//! the executable embeds them with `include_bytes!`, passes them as a
//! [`SoundBundle`] to [`SoundPaths::extract_bundled`] once at startup, and
//! keeps the returned [`SoundPaths`] alive for as long as it plays sounds.
//!
//! `castle` has no asset of its own and reuses `Move.mp3`.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Prefix of the temp directory bundled sounds are extracted into.
const EXTRACT_PREFIX: &str = "chesscli-sounds-";

/// Board events that have a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    /// A quiet move.
    Move,
    /// A capture.
    Capture,
    /// A move giving check.
    Check,
    /// Castling.
    Castle,
}

impl SoundEvent {
    /// Every event.
    pub const ALL: [Self; 4] = [Self::Move, Self::Capture, Self::Check, Self::Castle];

    /// Event key as used by callers (`move`, `capture`, `check`, `castle`).
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Capture => "capture",
            Self::Check => "check",
            Self::Castle => "castle",
        }
    }

    /// Look up an event by key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.key() == key)
    }

    /// File name of the asset played for this event.
    #[must_use]
    pub fn asset_file(self) -> &'static str {
        match self {
            Self::Move | Self::Castle => "Move.mp3",
            Self::Capture => "Capture.mp3",
            Self::Check => "Check.mp3",
        }
    }
}

impl Display for SoundEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SoundEvent {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s).ok_or_else(|| AppError::Config(format!("unknown sound event '{s}'")))
    }
}

/// Audio bytes shipped inside the application, typically via
/// `include_bytes!` in the embedding binary.
#[derive(Debug, Clone, Copy)]
pub struct SoundBundle<'a> {
    /// `Move.mp3`.
    pub move_mp3: &'a [u8],
    /// `Capture.mp3`.
    pub capture_mp3: &'a [u8],
    /// `Check.mp3`.
    pub check_mp3: &'a [u8],
}

/// Resolved on-disk location of every sound.
#[derive(Debug)]
pub struct SoundPaths {
    dir: PathBuf,
    /// Keeps extracted files alive; removed on drop.
    _extracted: Option<TempDir>,
}

impl SoundPaths {
    /// Sounds read straight from `dir` (the development asset directory).
    #[must_use]
    pub fn from_asset_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _extracted: None,
        }
    }

    /// Write the bundled sounds into a new temp directory.
    ///
    /// The directory lives as long as the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the directory or a file cannot be written.
    pub fn extract_bundled(bundle: &SoundBundle<'_>) -> Result<Self> {
        let tmp = tempfile::Builder::new()
            .prefix(EXTRACT_PREFIX)
            .tempdir()
            .map_err(|err| AppError::Io(format!("failed to create sound dir: {err}")))?;

        for (name, bytes) in [
            ("Move.mp3", bundle.move_mp3),
            ("Capture.mp3", bundle.capture_mp3),
            ("Check.mp3", bundle.check_mp3),
        ] {
            let path = tmp.path().join(name);
            fs::write(&path, bytes).map_err(|err| {
                AppError::Io(format!("failed to extract {}: {err}", path.display()))
            })?;
        }

        debug!(dir = %tmp.path().display(), "bundled sounds extracted");
        Ok(Self {
            dir: tmp.path().to_path_buf(),
            _extracted: Some(tmp),
        })
    }

    /// Directory the sounds are read from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file played for `event`.
    #[must_use]
    pub fn path_for(&self, event: SoundEvent) -> PathBuf {
        self.dir.join(event.asset_file())
    }
}

/// Plays sounds by spawning an external player and never waiting on it.
#[derive(Debug)]
pub struct SoundPlayer {
    program: String,
    paths: SoundPaths,
    enabled: bool,
}

impl SoundPlayer {
    /// Player invoking `program <file>` for each sound.
    #[must_use]
    pub fn new(program: impl Into<String>, paths: SoundPaths) -> Self {
        Self {
            program: program.into(),
            paths,
            enabled: true,
        }
    }

    /// A player that never plays anything.
    #[must_use]
    pub fn disabled(paths: SoundPaths) -> Self {
        Self {
            program: String::new(),
            paths,
            enabled: false,
        }
    }

    /// Resolved sound locations.
    #[must_use]
    pub fn paths(&self) -> &SoundPaths {
        &self.paths
    }

    /// Start playing `event`. Returns whether the player process spawned.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "playback may not have started"]
    pub fn play(&self, event: SoundEvent) -> bool {
        if !self.enabled {
            return false;
        }

        let path = self.paths.path_for(event);
        match tokio::process::Command::new(&self.program)
            .arg(&path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
        {
            Ok(_child) => {
                debug!(%event, path = %path.display(), "sound started");
                true
            }
            Err(err) => {
                warn!(%event, program = %self.program, error = %err, "sound player unavailable");
                false
            }
        }
    }

    /// Play by event key; unknown keys fall back to the move sound.
    #[must_use = "playback may not have started"]
    pub fn play_key(&self, key: &str) -> bool {
        self.play(SoundEvent::from_key(key).unwrap_or(SoundEvent::Move))
    }
}
