//! Line buffer and FIFO queue of predicate-matched waits.
//!
//! [`WaiterQueue`] holds every line received since the last delivery and the
//! outstanding requests in arrival order. Only the head request is tested.
//! When a buffered line satisfies it, the buffered prefix ending at that line
//! is delivered through the request's one-shot reply and removed; the
//! remainder stays buffered for the next request.
//!
//! A discard wait (see [`WaiterQueue::register_discard`]) stands in for a
//! request whose caller already gave up but whose answer is still owed by
//! the engine. It keeps its place in the queue after the caller stops
//! listening, and the lines it matches are dropped, so a late answer can
//! never be delivered to a newer request.
//!
//! The queue is plain synchronous state. It is owned by the reader task (see
//! [`run_reader`](super::reader::run_reader)), which is the only code that
//! mutates it, so no lock protects it.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

use tokio::sync::oneshot;
use tracing::debug;

use crate::{AppError, Result};

/// One-shot reply carrying the delivered lines or a termination error.
pub type Reply = oneshot::Sender<Result<Vec<String>>>;

/// Condition a line must satisfy to complete a wait.
pub enum Expect {
    /// The line equals the given text.
    Exact(String),
    /// The line starts with the given text.
    Prefix(String),
    /// Arbitrary predicate.
    Custom(Box<dyn Fn(&str) -> bool + Send>),
}

impl Expect {
    /// Match a line equal to `text`.
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Match a line starting with `text`.
    #[must_use]
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::Prefix(text.into())
    }

    /// Match any line for which `predicate` returns `true`.
    #[must_use]
    pub fn custom(predicate: impl Fn(&str) -> bool + Send + 'static) -> Self {
        Self::Custom(Box::new(predicate))
    }

    /// Test a single line.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Exact(text) => line == text,
            Self::Prefix(text) => line.starts_with(text.as_str()),
            Self::Custom(predicate) => predicate(line),
        }
    }
}

impl Debug for Expect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(text) => f.debug_tuple("Exact").field(text).finish(),
            Self::Prefix(text) => f.debug_tuple("Prefix").field(text).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug)]
struct Waiter {
    expect: Expect,
    reply: Reply,
    /// Consume the matched lines even if nobody receives them.
    discard: bool,
}

/// Buffered engine lines plus the outstanding waits, in arrival order.
#[derive(Debug, Default)]
pub struct WaiterQueue {
    lines: Vec<String>,
    waiters: VecDeque<Waiter>,
}

impl WaiterQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed line and deliver to the head wait if it matches.
    pub fn push_line(&mut self, line: String) {
        self.lines.push(line);
        self.settle();
    }

    /// Register a wait at the back of the queue.
    ///
    /// Lines already buffered are scanned immediately, so an answer that
    /// arrived before the wait was registered is still delivered.
    pub fn register(&mut self, expect: Expect, reply: Reply) {
        self.waiters.push_back(Waiter {
            expect,
            reply,
            discard: false,
        });
        self.settle();
    }

    /// Register a wait whose matched lines are dropped.
    ///
    /// Unlike [`register`](Self::register), the wait is not pruned when
    /// `reply`'s receiver goes away; it stays queued until a line matches
    /// or the queue is failed. `reply` still receives the dropped lines if
    /// anyone is listening.
    pub fn register_discard(&mut self, expect: Expect, reply: Reply) {
        self.waiters.push_back(Waiter {
            expect,
            reply,
            discard: true,
        });
        self.settle();
    }

    /// Discard all buffered lines, returning how many were dropped.
    pub fn clear_lines(&mut self) -> usize {
        let dropped = self.lines.len();
        self.lines.clear();
        dropped
    }

    /// Lines received but not yet delivered.
    #[must_use]
    pub fn buffered(&self) -> &[String] {
        &self.lines
    }

    /// Number of waits still queued, including ones whose caller has gone.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.waiters.len()
    }

    /// Resolve every outstanding wait with [`AppError::EngineTerminated`].
    pub fn fail_all(&mut self, reason: &str) {
        let count = self.waiters.len();
        for waiter in self.waiters.drain(..) {
            // A dropped receiver means the caller already gave up.
            let _ = waiter
                .reply
                .send(Err(AppError::EngineTerminated(reason.to_owned())));
        }
        if count > 0 {
            debug!(count, reason, "waiter queue: failed outstanding waits");
        }
    }

    fn settle(&mut self) {
        loop {
            // Cancelled waits are removed without consuming any lines.
            while self
                .waiters
                .front()
                .is_some_and(|waiter| !waiter.discard && waiter.reply.is_closed())
            {
                self.waiters.pop_front();
                debug!("waiter queue: pruned cancelled wait");
            }

            let Some(head) = self.waiters.front() else {
                return;
            };
            let Some(pos) = self.lines.iter().position(|line| head.expect.matches(line)) else {
                return;
            };
            let Some(waiter) = self.waiters.pop_front() else {
                return;
            };

            let delivered: Vec<String> = self.lines.drain(..=pos).collect();
            if waiter.discard {
                debug!(count = delivered.len(), "waiter queue: discarded late reply");
                let _ = waiter.reply.send(Ok(delivered));
            } else if let Err(Ok(lines)) = waiter.reply.send(Ok(delivered)) {
                // Receiver vanished between the check and the send.
                let rest = std::mem::replace(&mut self.lines, lines);
                self.lines.extend(rest);
            }
        }
    }
}
