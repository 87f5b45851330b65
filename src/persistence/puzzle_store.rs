//! Puzzle collection file (`~/.chesscli/puzzles.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DATA_DIR_NAME;
use crate::models::Puzzle;
use crate::persistence::read_optional;

/// File name of the puzzle collection inside the data directory.
pub const PUZZLES_FILE: &str = "puzzles.json";

/// Reads and writes the saved puzzle collection as a JSON array.
#[derive(Debug, Clone)]
pub struct PuzzleStore {
    path: PathBuf,
}

impl PuzzleStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/puzzles.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PUZZLES_FILE))
    }

    /// Store at `~/.chesscli/puzzles.json`, if the home directory is known.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::in_dir(&home.join(DATA_DIR_NAME)))
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved puzzles, in file order.
    ///
    /// `None` if the file is missing, is not valid JSON, is not an array,
    /// or holds an element that is not a JSON object. Malformed fields
    /// inside an object take their defaults (see [`Puzzle`]).
    #[must_use]
    pub fn read_puzzles(&self) -> Option<Vec<Puzzle>> {
        let raw = read_optional(&self.path)?;

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt puzzle file");
                return None;
            }
        };

        let Value::Array(items) = value else {
            warn!(path = %self.path.display(), "puzzle file is not a JSON array");
            return None;
        };

        match items
            .into_iter()
            .map(Puzzle::from_json)
            .collect::<serde_json::Result<Vec<_>>>()
        {
            Ok(puzzles) => {
                debug!(count = puzzles.len(), "puzzles loaded");
                Some(puzzles)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring undecodable puzzle file");
                None
            }
        }
    }

    /// Replace the file with `puzzles`, creating the directory if needed.
    ///
    /// Returns `false` (and logs) if the write failed.
    #[must_use = "the write may have failed"]
    pub fn write_puzzles(&self, puzzles: &[Puzzle]) -> bool {
        match self.try_write(puzzles) {
            Ok(()) => {
                debug!(count = puzzles.len(), "puzzles saved");
                true
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to write puzzle file");
                false
            }
        }
    }

    fn try_write(&self, puzzles: &[Puzzle]) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(puzzles)
            .map_err(|err| crate::AppError::Io(format!("failed to serialize puzzles: {err}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
