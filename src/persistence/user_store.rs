//! User settings file (`~/.chesscli.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::USER_CONFIG_FILE;
use crate::persistence::read_optional;

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

/// Reads and writes the remembered username.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.chesscli.json`, if the home directory is known.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(USER_CONFIG_FILE)))
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored username; `None` if the file is missing, corrupt, or
    /// holds no non-empty name.
    #[must_use]
    pub fn read_username(&self) -> Option<String> {
        let raw = read_optional(&self.path)?;
        match serde_json::from_str::<UserFile>(&raw) {
            Ok(file) => file.username.filter(|name| !name.is_empty()),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt user settings");
                None
            }
        }
    }

    /// Replace the file with one holding `username`.
    ///
    /// Returns `false` (and logs) if the write failed.
    #[must_use = "the write may have failed"]
    pub fn write_username(&self, username: &str) -> bool {
        match self.try_write(username) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to write user settings");
                false
            }
        }
    }

    fn try_write(&self, username: &str) -> crate::Result<()> {
        let file = UserFile {
            username: Some(username.to_owned()),
        };
        let raw = serde_json::to_string(&file)
            .map_err(|err| crate::AppError::Io(format!("failed to serialize settings: {err}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
