//! Engine session: ordered request/response calls over a UCI process.
//!
//! A [`Session`] owns one engine process (or any pair of async byte
//! streams), the background reader task, and the control channel into it.
//! Every public operation follows the same shape:
//!
//! 1. clear the line buffer so the next match window starts empty,
//! 2. write one or more commands to the engine's stdin,
//! 3. register a wait and suspend until a line satisfies it.
//!
//! UCI has no request identifiers, so only one wait may be outstanding at a
//! time. A second concurrent call fails fast with [`AppError::Busy`] instead
//! of interleaving with the first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::command::{UciCommand, BEST_MOVE, READY_OK, UCI_OK};
use crate::engine::reader::{spawn_reader, Control};
use crate::engine::spawner::{spawn_engine, EngineProcess};
use crate::engine::waiter::Expect;
use crate::{AppError, Result};

/// Capacity of the control channel into the reader task.
const CONTROL_CAPACITY: usize = 16;

/// How long `stop` lets the engine act on `quit` before killing it.
const QUIT_GRACE: Duration = Duration::from_millis(250);

/// How long a timed-out search may take to honour `stop`.
const STOP_GRACE: Duration = Duration::from_secs(2);

type EngineInput = Box<dyn AsyncWrite + Send + Unpin>;

/// Settings for launching and talking to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Engine executable, resolved through `PATH`.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Deadline for each step of the readiness handshake (and for
    /// `readyok` after `ucinewgame`).
    pub handshake_timeout: Duration,
    /// Deadline for a search to produce `bestmove`; `None` waits forever.
    pub search_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: "stockfish".into(),
            args: Vec::new(),
            handshake_timeout: Duration::from_secs(10),
            search_timeout: None,
        }
    }
}

/// A ready engine session.
///
/// All methods take `&self`; wrap the session in an `Arc` to call
/// [`stop`](Self::stop) from another task while a search is running.
pub struct Session {
    config: SessionConfig,
    stdin: Mutex<Option<EngineInput>>,
    child: Mutex<Option<Child>>,
    control_tx: mpsc::Sender<Control>,
    /// Held for the duration of each request/response exchange.
    exchange: Mutex<()>,
    reader: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    stopped: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("program", &self.config.program)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Spawn the engine and complete the readiness handshake.
    ///
    /// The handshake sends `uci` and waits for `uciok`, then sends `isready`
    /// and waits for `readyok`, discarding everything the engine printed
    /// along the way.
    ///
    /// # Errors
    ///
    /// - [`AppError::EngineUnavailable`]: the executable cannot be spawned.
    /// - [`AppError::EngineTerminated`]: the engine exited during the
    ///   handshake.
    /// - [`AppError::HandshakeFailed`]: a readiness token did not arrive
    ///   within [`SessionConfig::handshake_timeout`].
    pub async fn start(config: SessionConfig) -> Result<Self> {
        let EngineProcess {
            child,
            stdin,
            stdout,
        } = spawn_engine(&config)?;
        Self::launch(stdout, Box::new(stdin), Some(child), config).await
    }

    /// Run the session protocol over existing streams instead of a spawned
    /// process. `stdout` carries engine output, `stdin` receives commands.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start), minus spawn failures.
    pub async fn connect<R, W>(stdout: R, stdin: W, config: SessionConfig) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::launch(stdout, Box::new(stdin), None, config).await
    }

    async fn launch<R>(
        stdout: R,
        stdin: EngineInput,
        child: Option<Child>,
        config: SessionConfig,
    ) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let reader = spawn_reader(stdout, control_rx, cancel.clone());

        let session = Self {
            config,
            stdin: Mutex::new(Some(stdin)),
            child: Mutex::new(child),
            control_tx,
            exchange: Mutex::new(()),
            reader: Mutex::new(Some(reader)),
            cancel,
            stopped: AtomicBool::new(false),
        };

        if let Err(err) = session.handshake().await {
            warn!(program = %session.config.program, error = %err, "engine handshake failed");
            session.stop().await;
            return Err(err);
        }

        info!(program = %session.config.program, "engine session ready");
        Ok(session)
    }

    async fn handshake(&self) -> Result<()> {
        for (command, token) in [(UciCommand::Uci, UCI_OK), (UciCommand::IsReady, READY_OK)] {
            self.send(&command).await?;
            self.wait_for(Expect::exact(token), Some(self.config.handshake_timeout))
                .await
                .map_err(|err| match err {
                    AppError::Timeout(msg) => {
                        AppError::HandshakeFailed(format!("'{token}' not received: {msg}"))
                    }
                    other => other,
                })?;
            self.clear().await?;
        }
        Ok(())
    }

    /// Search the position given as a FEN string to `depth` plies.
    ///
    /// Returns every line the engine printed for this search, ending with
    /// the `bestmove` line.
    ///
    /// # Errors
    ///
    /// - [`AppError::EngineTerminated`]: the engine exited or the session
    ///   was stopped.
    /// - [`AppError::Busy`]: another call is still waiting for its reply.
    /// - [`AppError::Timeout`]: [`SessionConfig::search_timeout`] elapsed.
    /// - [`AppError::Protocol`]: `fen` contains a line break.
    pub async fn evaluate(&self, fen: &str, depth: u32) -> Result<Vec<String>> {
        self.search(UciCommand::PositionFen(fen.to_owned()), depth)
            .await
    }

    /// Like [`evaluate`](Self::evaluate), with a caller-built position
    /// command such as `position startpos moves e2e4 e7e5`.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub async fn evaluate_incremental(
        &self,
        position_command: &str,
        depth: u32,
    ) -> Result<Vec<String>> {
        self.search(UciCommand::Position(position_command.to_owned()), depth)
            .await
    }

    async fn search(&self, position: UciCommand, depth: u32) -> Result<Vec<String>> {
        let _exchange = self.begin()?;
        position.validate()?;

        self.clear().await?;
        self.send(&position).await?;
        self.send(&UciCommand::GoDepth(depth)).await?;

        match self
            .wait_for(Expect::prefix(BEST_MOVE), self.config.search_timeout)
            .await
        {
            Ok(lines) => {
                debug!(depth, lines = lines.len(), "engine search complete");
                Ok(lines)
            }
            Err(AppError::Timeout(msg)) => {
                self.abandon_search().await;
                Err(AppError::Timeout(format!("search to depth {depth}: {msg}")))
            }
            Err(err) => Err(err),
        }
    }

    /// Stop a search whose caller gave up, and swallow its late `bestmove`
    /// so it cannot satisfy the next request.
    ///
    /// The discard wait is queued ahead of any later request, so the late
    /// reply is dropped whenever it arrives. Waiting up to [`STOP_GRACE`]
    /// only keeps the engine quiet before the next command.
    async fn abandon_search(&self) {
        if let Err(err) = self.send(&UciCommand::Stop).await {
            debug!(error = %err, "could not stop abandoned search");
            return;
        }
        let drained = match self.discard_through(Expect::prefix(BEST_MOVE)).await {
            Ok(rx) => rx,
            Err(err) => {
                debug!(error = %err, "could not queue discard for abandoned search");
                return;
            }
        };
        match tokio::time::timeout(STOP_GRACE, drained).await {
            Ok(Ok(Ok(lines))) => debug!(discarded = lines.len(), "abandoned search drained"),
            Ok(_) => debug!("engine output ended before abandoned search drained"),
            Err(_) => warn!(
                grace = ?STOP_GRACE,
                "abandoned search still running; its bestmove will be discarded on arrival"
            ),
        }
    }

    /// Tell the engine a new, unrelated game starts, and wait until it has
    /// reset its internal state.
    ///
    /// # Errors
    ///
    /// - [`AppError::EngineTerminated`]: the engine exited or the session
    ///   was stopped.
    /// - [`AppError::Busy`]: another call is still waiting for its reply.
    /// - [`AppError::Timeout`]: `readyok` did not arrive within
    ///   [`SessionConfig::handshake_timeout`].
    pub async fn reset_for_new_game(&self) -> Result<()> {
        let _exchange = self.begin()?;

        self.clear().await?;
        self.send(&UciCommand::UciNewGame).await?;
        self.send(&UciCommand::IsReady).await?;
        if let Err(err) = self
            .wait_for(Expect::exact(READY_OK), Some(self.config.handshake_timeout))
            .await
        {
            if matches!(err, AppError::Timeout(_)) {
                // A late `readyok` must not answer the next reset.
                let _ = self.discard_through(Expect::exact(READY_OK)).await;
            }
            return Err(err);
        }
        self.clear().await?;

        debug!("engine reset for new game");
        Ok(())
    }

    /// Lines received from the engine and not yet delivered to any wait.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EngineTerminated`] once the reader has stopped.
    pub async fn buffered_lines(&self) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Snapshot { reply })
            .await
            .map_err(|_| reader_gone())?;
        rx.await.map_err(|_| reader_gone())
    }

    /// Send `quit`, kill the engine, and release any outstanding wait with
    /// [`AppError::EngineTerminated`].
    ///
    /// Idempotent; calls after the first return immediately.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        // Releases waiters before anything below can block.
        self.cancel.cancel();

        let quit = async {
            let mut stdin = self.stdin.lock().await;
            if let Some(mut writer) = stdin.take() {
                writer.write_all(UciCommand::Quit.to_wire().as_bytes()).await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        match tokio::time::timeout(QUIT_GRACE, quit).await {
            Ok(Ok(())) => debug!("quit sent to engine"),
            Ok(Err(err)) => debug!(error = %err, "quit not delivered"),
            Err(_) => debug!("quit write timed out"),
        }

        if let Some(mut child) = self.child.lock().await.take() {
            if let Ok(Ok(status)) = tokio::time::timeout(QUIT_GRACE, child.wait()).await {
                debug!(%status, "engine exited after quit");
            } else if let Err(err) = child.kill().await {
                debug!(error = %err, "engine kill failed; process already gone");
            }
        }

        if let Some(handle) = self.reader.lock().await.take() {
            let _ = handle.await;
        }

        info!(program = %self.config.program, "engine session stopped");
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// The configuration this session was started with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Claim the single exchange slot.
    fn begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.ensure_live()?;
        self.exchange.try_lock().map_err(|_| {
            AppError::Busy("another engine command is still awaiting its reply".into())
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(AppError::EngineTerminated("session stopped".into()));
        }
        Ok(())
    }

    /// Write one command line to the engine.
    async fn send(&self, command: &UciCommand) -> Result<()> {
        self.ensure_live()?;
        command.validate()?;

        let mut stdin = self.stdin.lock().await;
        let writer = stdin
            .as_mut()
            .ok_or_else(|| AppError::EngineTerminated("engine input closed".into()))?;

        writer
            .write_all(command.to_wire().as_bytes())
            .await
            .map_err(|err| AppError::EngineTerminated(format!("write failed: {err}")))?;
        writer
            .flush()
            .await
            .map_err(|err| AppError::EngineTerminated(format!("flush failed: {err}")))?;

        debug!(%command, "engine <-");
        Ok(())
    }

    /// Drop every buffered line.
    async fn clear(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Clear { done })
            .await
            .map_err(|_| reader_gone())?;
        let dropped = rx.await.map_err(|_| reader_gone())?;
        if dropped > 0 {
            debug!(dropped, "discarded buffered engine lines");
        }
        Ok(())
    }

    /// Register `expect` and suspend until it matches, the reader stops, or
    /// `timeout` elapses. On timeout the wait is abandoned in place; the
    /// reader prunes it without touching buffered lines.
    async fn wait_for(&self, expect: Expect, timeout: Option<Duration>) -> Result<Vec<String>> {
        let (reply, mut rx) = oneshot::channel();
        self.control_tx
            .send(Control::Register { expect, reply })
            .await
            .map_err(|_| reader_gone())?;

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    // Closing first settles the race with a reply sent just
                    // as the deadline fired: either it is already here, or
                    // the reader keeps the lines buffered.
                    rx.close();
                    return match rx.try_recv() {
                        Ok(delivered) => delivered,
                        Err(_) => Err(AppError::Timeout(format!(
                            "no matching engine line within {limit:?}"
                        ))),
                    };
                }
            },
            None => rx.await,
        };

        outcome.map_err(|_| reader_gone())?
    }

    /// Queue a discard wait for `expect` behind any outstanding wait.
    async fn discard_through(
        &self,
        expect: Expect,
    ) -> Result<oneshot::Receiver<Result<Vec<String>>>> {
        let (reply, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Discard { expect, reply })
            .await
            .map_err(|_| reader_gone())?;
        Ok(rx)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // The child itself is reaped by `kill_on_drop`.
        self.cancel.cancel();
    }
}

fn reader_gone() -> AppError {
    AppError::EngineTerminated("engine reader stopped".into())
}
