//! Engine reader task.
//!
//! The single consumer of the engine's stdout. It frames the byte stream
//! with [`LineFramer`], feeds every line into a [`WaiterQueue`] it owns
//! outright, and services [`Control`] messages from the session over an
//! [`mpsc`] channel. Because the buffer and the queue never leave this task,
//! registration, clearing, and delivery cannot interleave.
//!
//! The task ends when the stream closes, the stream errors, the session
//! cancels it, or the session drops its control sender. Whatever the cause,
//! every outstanding wait is resolved with
//! [`AppError::EngineTerminated`](crate::AppError::EngineTerminated) before
//! the task returns; the loop is never re-entered.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::engine::codec::LineFramer;
use crate::engine::waiter::{Expect, Reply, WaiterQueue};
use crate::AppError;

/// Requests from the session to the reader task.
#[derive(Debug)]
pub enum Control {
    /// Queue a wait; `reply` receives the delivered lines.
    Register {
        /// Condition that completes the wait.
        expect: Expect,
        /// Delivery channel.
        reply: Reply,
    },
    /// Queue a discard wait: the lines through the first match are dropped
    /// instead of reaching any later wait. `reply` is notified if still
    /// listened to.
    Discard {
        /// Condition that ends the discarded reply.
        expect: Expect,
        /// Optional notification channel.
        reply: Reply,
    },
    /// Drop all buffered lines; `done` receives how many were dropped.
    Clear {
        /// Acknowledgement channel.
        done: oneshot::Sender<usize>,
    },
    /// Copy the buffered lines without consuming them.
    Snapshot {
        /// Channel receiving the copy.
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// Spawn [`run_reader`] on the current tokio runtime.
#[must_use]
pub fn spawn_reader<R>(
    stdout: R,
    control_rx: mpsc::Receiver<Control>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(run_reader(stdout, control_rx, cancel))
}

/// Reader task body. Drains `stdout` until it closes or `cancel` fires.
pub async fn run_reader<R>(
    stdout: R,
    mut control_rx: mpsc::Receiver<Control>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, LineFramer::new());
    let mut queue = WaiterQueue::new();

    let reason = loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("engine reader: cancellation received, stopping");
                break "session stopped";
            }

            control = control_rx.recv() => match control {
                Some(Control::Register { expect, reply }) => {
                    trace!(?expect, "engine reader: wait registered");
                    queue.register(expect, reply);
                }
                Some(Control::Discard { expect, reply }) => {
                    trace!(?expect, "engine reader: discard wait registered");
                    queue.register_discard(expect, reply);
                }
                Some(Control::Clear { done }) => {
                    let _ = done.send(queue.clear_lines());
                }
                Some(Control::Snapshot { reply }) => {
                    let _ = reply.send(queue.buffered().to_vec());
                }
                None => {
                    debug!("engine reader: session dropped, stopping");
                    break "session dropped";
                }
            },

            item = framed.next() => match item {
                Some(Ok(line)) => {
                    trace!(%line, "engine ->");
                    queue.push_line(line);
                }
                Some(Err(err)) => {
                    warn!(error = %err, "engine reader: stream error, stopping");
                    break "engine output failed";
                }
                None => {
                    debug!("engine reader: EOF detected");
                    break "engine output closed";
                }
            },
        }
    };

    queue.fail_all(reason);

    // Waits that were sent but not yet received must not hang either.
    control_rx.close();
    while let Ok(control) = control_rx.try_recv() {
        if let Control::Register { reply, .. } | Control::Discard { reply, .. } = control {
            let _ = reply.send(Err(AppError::EngineTerminated(reason.to_owned())));
        }
    }
}
