//! Minimal s-expression codec used on the Vetclix wire.
//!
//! Only four kinds of data exist on the wire: double-quoted strings with
//! backslash escapes, non-negative integers, non-negative floats, and lists of
//! any of those. This module provides the [`Value`] tree, the [`parse`]
//! state machine, the canonical [`dump`] serializer, and a few helpers for
//! reading structured payloads out of positional lists.

/// Canonical text serializer.
pub mod dump;
/// Character-level state machine parser.
pub mod parser;
/// Keyed and positional views over list values.
pub mod structure;
/// Wire value tree.
pub mod value;

pub use dump::dump;
pub use parser::{MAX_DEPTH, parse};
pub use structure::{Shape, structure, verify};
pub use value::Value;

use thiserror::Error;

/// Convenience result alias for codec operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors surfaced while parsing wire text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input ended while one or more lists were still open.
    #[error("unclosed list: {depth} list(s) still open at end of input")]
    UnclosedList {
        /// Number of lists left open.
        depth: usize,
    },

    /// A top-level string atom was never closed.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Lists were nested deeper than [`MAX_DEPTH`].
    #[error("lists nested deeper than {limit}")]
    TooDeep {
        /// The nesting limit that was exceeded.
        limit: usize,
    },

    /// A run of digits and dots did not form a number.
    #[error("invalid number literal: {0:?}")]
    InvalidNumber(String),
}
