//! UCI engine session adapter.
//!
//! Drives an external line-oriented chess engine as if it exposed ordered,
//! asynchronous request/response calls.
//!
//! Submodules:
//! - `codec`: [`LineFramer`](codec::LineFramer), lossy newline framing of
//!   the engine's output.
//! - `command`: the UCI commands written to the engine and the reply tokens
//!   recognised from it.
//! - `waiter`: the line buffer and FIFO queue of predicate-matched waits.
//! - `reader`: the background task that owns the buffer and the queue.
//! - `spawner`: process spawning with piped stdio.
//! - `session`: [`Session`], the public entry point.

pub mod codec;
pub mod command;
pub mod reader;
pub mod session;
pub mod spawner;
pub mod waiter;

pub use command::{BestMove, UciCommand};
pub use session::{Session, SessionConfig};
