//! Puzzle record and its enumerated fields.
//!
//! The JSON encoding is lenient on input so that files written by older
//! versions keep loading. A field that is missing or has the wrong type
//! takes a default instead of failing the record: unknown classifications
//! become [`Classification::Good`], player names become `"?"`, other text
//! fields become empty, and continuations and solve counts become empty /
//! zero. Only an element that is not a JSON object fails to decode.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Placeholder for an unknown player name.
pub const UNKNOWN_PLAYER: &str = "?";

/// Side to move in a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// White to move.
    White,
    /// Black to move.
    Black,
}

impl Color {
    /// Textual encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }

    /// Decode; anything other than `"White"` is black.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "White" {
            Self::White
        } else {
            Self::Black
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(label) => Self::from_label(&label),
            _ => Self::Black,
        })
    }
}

/// Quality of the move a puzzle was extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The engine's top choice.
    Best,
    /// Nearly as good as the best move.
    Excellent,
    /// A sound move.
    #[default]
    Good,
    /// A missed opportunity.
    Miss,
    /// A small loss of advantage.
    Inaccuracy,
    /// A significant loss of advantage.
    Mistake,
    /// A decisive loss of advantage.
    Blunder,
}

impl Classification {
    /// Every classification, best first.
    pub const ALL: [Self; 7] = [
        Self::Best,
        Self::Excellent,
        Self::Good,
        Self::Miss,
        Self::Inaccuracy,
        Self::Mistake,
        Self::Blunder,
    ];

    /// Textual encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Best => "Best",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Miss => "Miss",
            Self::Inaccuracy => "Inaccuracy",
            Self::Mistake => "Mistake",
            Self::Blunder => "Blunder",
        }
    }

    /// Decode; unknown text maps to [`Classification::Good`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or_default()
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(label) => Self::from_label(&label),
            _ => Self::default(),
        })
    }
}

/// A training puzzle extracted from a played game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Puzzle {
    /// Position before the move, as FEN.
    #[serde(default, deserialize_with = "lenient_text")]
    pub fen: String,
    /// Side the solver plays.
    #[serde(default = "default_color")]
    pub player_color: Color,
    /// Engine's best move in UCI notation.
    #[serde(default, deserialize_with = "lenient_text")]
    pub solution_uci: String,
    /// Move actually played in the game.
    #[serde(default, deserialize_with = "lenient_text")]
    pub played_uci: String,
    /// Engine line following the solution.
    #[serde(default, deserialize_with = "lenient_moves")]
    pub continuation: Vec<String>,
    /// Evaluation before the move.
    #[serde(default, deserialize_with = "lenient_text")]
    pub eval_before: String,
    /// Evaluation after the played move.
    #[serde(default, deserialize_with = "lenient_text")]
    pub eval_after: String,
    /// Where the puzzle came from (game, opponent, date).
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_label: String,
    /// Quality of the played move.
    #[serde(default)]
    pub classification: Classification,
    /// White player's name.
    #[serde(default = "unknown_player", deserialize_with = "player_name")]
    pub white_name: String,
    /// Black player's name.
    #[serde(default = "unknown_player", deserialize_with = "player_name")]
    pub black_name: String,
    /// Times the puzzle has been solved.
    #[serde(default, deserialize_with = "lenient_count")]
    pub solve_count: u32,
}

impl Puzzle {
    /// Encode as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; plain records never produce one.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Decode from a JSON object, applying the lenient defaults.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if `value` is not a JSON object.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

fn default_color() -> Color {
    Color::Black
}

fn unknown_player() -> String {
    UNKNOWN_PLAYER.to_owned()
}

fn player_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) if !name.is_empty() => name,
        _ => unknown_player(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        _ => String::new(),
    })
}

/// Non-array values read as no continuation; non-string moves are skipped.
fn lenient_moves<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(mv) => Some(mv),
            _ => None,
        })
        .collect())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_u64()
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0))
}
