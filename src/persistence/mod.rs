//! Local JSON persistence.
//!
//! Both stores degrade silently: a missing, unreadable, or corrupt file reads
//! as `None`, and a failed write returns `false`. Failures are logged at
//! `WARN` and never propagate, so a damaged data file cannot crash the
//! application.

pub mod puzzle_store;
pub mod user_store;

pub use puzzle_store::PuzzleStore;
pub use user_store::UserStore;

use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

/// Read `path` as UTF-8, treating a missing file as absent without a warning.
fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read data file");
            None
        }
    }
}
