//! UCI commands written to the engine and the reply tokens recognised from it.

use std::fmt::{Display, Formatter};

use crate::{AppError, Result};

/// Reply to `uci` once the engine has listed its identity and options.
pub const UCI_OK: &str = "uciok";

/// Reply to `isready` once the engine has finished pending work.
pub const READY_OK: &str = "readyok";

/// Prefix of the line that terminates a search.
pub const BEST_MOVE: &str = "bestmove";

/// A single command line sent to the engine's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    /// `uci`: switch the engine to UCI mode.
    Uci,
    /// `isready`: synchronisation ping.
    IsReady,
    /// `ucinewgame`: forget state from the previous game.
    UciNewGame,
    /// `position fen <FEN>`.
    PositionFen(String),
    /// A pre-built position command, e.g. `position startpos moves e2e4`.
    Position(String),
    /// `go depth <N>`.
    GoDepth(u32),
    /// `stop`: end the current search as soon as possible.
    Stop,
    /// `quit`: terminate the engine.
    Quit,
}

impl UciCommand {
    /// Build `position startpos` followed by the given moves, if any.
    #[must_use]
    pub fn startpos_with_moves<I, S>(moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = String::from("position startpos");
        let mut first = true;
        for mv in moves {
            let mv = mv.as_ref().trim();
            if mv.is_empty() {
                continue;
            }
            if first {
                cmd.push_str(" moves");
                first = false;
            }
            cmd.push(' ');
            cmd.push_str(mv);
        }
        Self::Position(cmd)
    }

    /// Reject commands that would not fit on a single wire line.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Protocol`] if the rendered command contains a line
    /// break or is blank.
    pub fn validate(&self) -> Result<()> {
        let rendered = self.to_string();
        if rendered.contains(['\n', '\r']) {
            return Err(AppError::Protocol(format!(
                "command must be a single line: {rendered:?}"
            )));
        }
        if rendered.trim().is_empty() {
            return Err(AppError::Protocol("command must not be empty".into()));
        }
        Ok(())
    }

    /// The command as written to the engine, terminated by one newline.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{self}\n")
    }
}

impl Display for UciCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::IsReady => f.write_str("isready"),
            Self::UciNewGame => f.write_str("ucinewgame"),
            Self::PositionFen(fen) => write!(f, "position fen {fen}"),
            Self::Position(raw) => f.write_str(raw),
            Self::GoDepth(depth) => write!(f, "go depth {depth}"),
            Self::Stop => f.write_str("stop"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// The move chosen at the end of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// Chosen move in long algebraic notation (`e2e4`, `e7e8q`, `(none)`).
    pub mv: String,
    /// Expected reply, when the engine reports one.
    pub ponder: Option<String>,
}

impl BestMove {
    /// Parse a `bestmove <mv> [ponder <mv>]` line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != BEST_MOVE {
            return None;
        }
        let mv = tokens.next()?.to_owned();
        let ponder = match (tokens.next(), tokens.next()) {
            (Some("ponder"), Some(reply)) => Some(reply.to_owned()),
            _ => None,
        };
        Some(Self { mv, ponder })
    }

    /// Extract the best move from a search result, which ends with the
    /// `bestmove` line.
    #[must_use]
    pub fn from_lines(lines: &[String]) -> Option<Self> {
        lines.last().and_then(|line| Self::parse(line))
    }
}
