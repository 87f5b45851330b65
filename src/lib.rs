#![forbid(unsafe_code)]

//! Session layer between an interactive chess application and a UCI engine
//! process, plus the small local collaborators around it: user settings,
//! the puzzle store, and sound playback.

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod sound;

pub use config::GlobalConfig;
pub use engine::{Session, SessionConfig};
pub use errors::{AppError, Result};
