//! Deterministic message tags.
//!
//! Tags are derived from the rank and the message role, so messages to and
//! from different workers never share a tag. Negative tags are reserved for
//! the transport's own collectives.

use crate::{Rank, Tag};

/// Tag of the [`ShapeMessage`](crate::ShapeMessage) sent to `rank`.
pub fn shape(rank: Rank) -> Tag {
    3 * rank as Tag
}

/// Tag of the row-block payload sent to `rank`.
pub fn block(rank: Rank) -> Tag {
    3 * rank as Tag + 1
}

/// Tag of the partial result `rank` sends back to the coordinator.
pub fn result(participants: usize, rank: Rank) -> Tag {
    4 * participants as Tag + rank as Tag
}

pub const BROADCAST: Tag = -1;
pub const BARRIER_ENTER: Tag = -2;
pub const BARRIER_RELEASE: Tag = -3;
