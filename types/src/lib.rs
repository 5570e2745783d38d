//! Shared types for distributed row-block matrix multiplication.
//!
//! Everything a coordinator and its workers must agree on lives here: the
//! dense [`Matrix`] they exchange, the [`ShapeMessage`] header sent ahead of
//! every row block, the [`WorkAssignment`] produced by partitioning, and the
//! [`tag`] arithmetic that keeps concurrent messages apart.
//!
//! # Wire Layout
//!
//! - **Shape**: three elements `[rows, shared_side, columns]`, tag `3*rank`
//! - **Row block**: `rows * shared_side` elements, tag `3*rank+1`
//! - **Broadcast**: `shared_side * columns` elements (the right-hand matrix)
//! - **Result**: `rows * columns` elements, tag `4*participants+rank`

mod error;
mod matrix;
mod message;

pub mod tag;

pub use error::Error;
pub use matrix::Matrix;
pub use message::{ShapeMessage, WorkAssignment};

/// Matrix element. Products and sums wrap on overflow.
pub type Element = i32;

/// Participant identifier within a fixed group, `0..size`.
pub type Rank = usize;

/// Message discriminator.
pub type Tag = i32;
