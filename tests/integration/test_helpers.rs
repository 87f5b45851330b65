//! Shared helpers for session integration tests.
//!
//! Provides an in-memory stub engine wired to a [`Session`] through
//! `tokio::io::duplex`, so tests can script the engine's replies to each
//! command line and inspect exactly what the session wrote.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use chesscli_engine::{Result, Session, SessionConfig};

/// Default search reply: one info line followed by the best move.
pub const SEARCH_REPLY: &str = "info depth 1 score cp 20\nbestmove e2e4 ponder e7e5\n";

/// What the stub engine does after receiving a command line.
#[derive(Debug, Clone)]
pub enum StubAction {
    /// Write this text (already newline-terminated).
    Reply(String),
    /// Write raw bytes.
    Bytes(Vec<u8>),
    /// Stall for the given time, then write the text. Commands arriving
    /// meanwhile queue up unread, as with a busy engine.
    Delayed(Duration, String),
    /// Write nothing.
    Silent,
    /// Close both streams, as if the engine exited.
    Hangup,
}

/// Commands received by the stub, in order.
pub type Received = Arc<Mutex<Vec<String>>>;

/// Answers a well-behaved engine gives.
pub fn default_response(command: &str) -> StubAction {
    match command {
        "uci" => StubAction::Reply("id name Stub\nid author Tests\nuciok\n".into()),
        "isready" => StubAction::Reply("readyok\n".into()),
        "quit" => StubAction::Hangup,
        cmd if cmd.starts_with("go") => StubAction::Reply(SEARCH_REPLY.into()),
        _ => StubAction::Silent,
    }
}

/// Session settings with short deadlines suitable for tests.
pub fn test_config() -> SessionConfig {
    SessionConfig {
        program: "stub".into(),
        args: Vec::new(),
        handshake_timeout: Duration::from_secs(2),
        search_timeout: None,
    }
}

/// Connect a session to a stub engine driven by `responder`.
///
/// Returns the handshake outcome together with the log of received
/// commands.
pub async fn connect_stub<F>(config: SessionConfig, mut responder: F) -> (Result<Session>, Received)
where
    F: FnMut(&str) -> StubAction + Send + 'static,
{
    let (session_side, engine_side) = tokio::io::duplex(64 * 1024);
    let (session_out, session_in) = tokio::io::split(session_side);
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&received);
    tokio::spawn(async move {
        let (engine_in, mut engine_out) = tokio::io::split(engine_side);
        let mut lines = BufReader::new(engine_in).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            log.lock().expect("command log").push(line.clone());
            let written = match responder(&line) {
                StubAction::Reply(text) => engine_out.write_all(text.as_bytes()).await,
                StubAction::Bytes(bytes) => engine_out.write_all(&bytes).await,
                StubAction::Delayed(delay, text) => {
                    tokio::time::sleep(delay).await;
                    engine_out.write_all(text.as_bytes()).await
                }
                StubAction::Silent => Ok(()),
                StubAction::Hangup => break,
            };
            if written.is_err() {
                break;
            }
        }
    });

    let session = Session::connect(session_out, session_in, config).await;
    (session, received)
}

/// Connect a session to a well-behaved stub engine and complete the
/// handshake.
pub async fn ready_stub() -> (Session, Received) {
    let (session, received) = connect_stub(test_config(), default_response).await;
    (session.expect("handshake succeeds"), received)
}

/// Snapshot of the commands received so far.
pub fn commands(received: &Received) -> Vec<String> {
    received.lock().expect("command log").clone()
}

/// Poll until the stub has received `command`, or panic after one second.
pub async fn wait_for_command(received: &Received, command: &str) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !commands(received).iter().any(|c| c == command) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("stub never received {command:?}"));
}
