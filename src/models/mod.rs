//! Domain model module declarations.

pub mod puzzle;

pub use puzzle::{Classification, Color, Puzzle};
