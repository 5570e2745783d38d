//! Error types for transport operations.

use matmul_types::{Rank, Tag};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("participant group aborted with code {code}")]
    Aborted { code: i32 },

    #[error("connection to rank {0} closed")]
    Disconnected(Rank),

    #[error("message from rank {src} with tag {tag} has {actual} elements, expected {expected}")]
    LengthMismatch {
        src: Rank,
        tag: Tag,
        expected: usize,
        actual: usize,
    },

    #[error("rank {rank} is outside a group of {size}")]
    UnknownRank { rank: Rank, size: usize },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("malformed frame: {0}")]
    Wire(String),

    #[error("could not reach rank {rank} after {attempts} attempts")]
    Unreachable { rank: Rank, attempts: usize },
}
