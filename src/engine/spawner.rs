//! Engine process spawner.
//!
//! Spawns the engine executable with all three standard streams piped and
//! `kill_on_drop(true)`, so a session that is dropped without an explicit
//! stop still takes its process with it. Stderr is drained by a background
//! task and logged at `DEBUG`; an engine that writes diagnostics there can
//! never stall on a full pipe.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::engine::codec::LineFramer;
use crate::engine::session::SessionConfig;
use crate::{AppError, Result};

/// A freshly spawned engine process and its captured pipes.
#[derive(Debug)]
pub struct EngineProcess {
    /// Child process handle; kept alive so `kill_on_drop` works.
    pub child: Child,
    /// Engine's stdin, for commands.
    pub stdin: ChildStdin,
    /// Engine's stdout, for protocol lines.
    pub stdout: ChildStdout,
}

/// Spawn the engine described by `config`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// - [`AppError::EngineUnavailable`] if the executable cannot be spawned or
///   its pipes cannot be captured.
pub fn spawn_engine(config: &SessionConfig) -> Result<EngineProcess> {
    let mut cmd = Command::new(&config.program);
    cmd.args(&config.args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|err| {
        AppError::EngineUnavailable(format!("failed to spawn '{}': {err}", config.program))
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::EngineUnavailable("failed to capture engine stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::EngineUnavailable("failed to capture engine stdout".into()))?;

    if let Some(stderr) = child.stderr.take() {
        // Detached: the task ends on its own when the pipe closes.
        drop(drain_stderr(config.program.clone(), stderr));
    }

    info!(program = %config.program, pid = ?child.id(), "engine process spawned");

    Ok(EngineProcess {
        child,
        stdin,
        stdout,
    })
}

/// Spawn a task that logs every line of `stderr` until it closes.
#[must_use]
pub fn drain_stderr<R>(program: String, stderr: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = FramedRead::new(stderr, LineFramer::new());
        while let Some(item) = lines.next().await {
            match item {
                Ok(line) => debug!(program, %line, "engine stderr"),
                Err(err) => {
                    debug!(program, error = %err, "engine stderr: read failed, stopping");
                    break;
                }
            }
        }
    })
}
