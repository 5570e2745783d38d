//! Error types for matrix and message construction.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("buffer of {len} elements does not fit a {rows}x{cols} matrix")]
    BufferLength { rows: usize, cols: usize, len: usize },

    #[error("ragged rows: row {row} has {len} elements, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },

    #[error("row block {offset}..{end} is outside a matrix with {rows} rows")]
    RowBlock { offset: usize, end: usize, rows: usize },

    #[error("malformed shape message: {0:?}")]
    MalformedShape(Vec<crate::Element>),

    #[error("value {0} does not fit in a wire element")]
    OutOfRange(usize),
}
