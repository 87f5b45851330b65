//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// The engine executable could not be spawned.
    EngineUnavailable(String),
    /// The engine process exited, or the session was stopped, while a
    /// command was outstanding.
    EngineTerminated(String),
    /// The engine never produced its readiness token.
    HandshakeFailed(String),
    /// A wait exceeded its configured deadline.
    Timeout(String),
    /// A second wait was requested while one is still outstanding.
    Busy(String),
    /// Malformed or unexpected protocol traffic.
    Protocol(String),
    /// Configuration parsing or validation failure.
    Config(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether the session that produced this error is unusable and must be
    /// restarted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_) | Self::EngineTerminated(_) | Self::HandshakeFailed(_)
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EngineUnavailable(msg) => write!(f, "engine unavailable: {msg}"),
            Self::EngineTerminated(msg) => write!(f, "engine terminated: {msg}"),
            Self::HandshakeFailed(msg) => write!(f, "handshake failed: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Busy(msg) => write!(f, "busy: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
