//! Distributed integer matrix multiplication over a fixed participant group.
//!
//! `matrix-mul` computes C = A × B by splitting the rows of A between the
//! ranks of a [`Transport`](matmul_comm::Transport) group. Rank 0 is the
//! coordinator: it sends every worker a shape header and its block of rows,
//! broadcasts B to everyone, multiplies the leftover rows itself and gathers
//! the partial products back in rank order.
//!
//! # Partitioning
//!
//! With `n` participants each of the `n - 1` workers gets
//! `rows / (n - 1)` contiguous rows starting at row 0. The remainder stays
//! with the coordinator, at the tail of the row range.
//!
//! # Faults
//!
//! Transport faults are fatal. [`run_participant`] aborts the whole group
//! when one happens, so no rank is left waiting forever.
//!
//! # Example
//!
//! ```no_run
//! use matmul_types::Matrix;
//! use matrix_mul::{Config, run_local};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![7, 8]])?;
//!     let b = Matrix::from_rows(vec![vec![1, 0], vec![0, 1]])?;
//!
//!     let config = Config::default().with_min_rows_per_participant(0);
//!     let c = run_local(a.clone(), b, 2, &config).await?;
//!     assert_eq!(c, a);
//!
//!     Ok(())
//! }
//! ```

mod bench;
mod config;
mod coordinator;
mod error;
mod group;
mod worker;

pub mod kernel;
pub mod matrix_file;
pub mod partition;

pub use bench::Stopwatch;
pub use config::{Config, DEFAULT_MIN_ROWS_PER_PARTICIPANT, MIN_ROWS_ENV};
pub use coordinator::{Coordinator, plan};
pub use error::{AtStep, Error, Step};
pub use group::{Outcome, run_group, run_local, run_participant};
pub use partition::{Plan, partition};
pub use worker::{Worker, WorkerReport};
