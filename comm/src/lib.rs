//! Rank-addressed messaging for a fixed group of participants.
//!
//! `matmul-comm` provides the [`Transport`] trait: point-to-point `send` and
//! `recv` matched on `(source, tag)`, plus the `barrier` and `broadcast`
//! collectives built on top of them. Two implementations ship with it:
//!
//! - [`LocalGroup`]: every participant lives in the same process, one
//!   mailbox per rank. Used for tests and single-machine runs.
//! - [`TcpGroup`]: every participant is its own process, connected in a
//!   full mesh over TCP.
//!
//! Any failed receive is fatal. [`Transport::abort`] fails every pending and
//! future receive on every rank of the group.
//!
//! # Example
//!
//! ```no_run
//! use matmul_comm::{LocalGroup, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut group = LocalGroup::new(2).into_iter();
//!     let (root, peer) = (group.next().unwrap(), group.next().unwrap());
//!
//!     root.send(1, 7, vec![1, 2, 3]).await?;
//!     assert_eq!(peer.recv(0, 7, 3).await?, vec![1, 2, 3]);
//!     Ok(())
//! }
//! ```

mod error;
mod frame;
mod local;
mod mailbox;
mod reader;
mod tcp;
mod transport;

pub use error::Error;
pub use local::{LocalGroup, LocalTransport};
pub use tcp::{ConnectOptions, TcpGroup, TcpTransport};
pub use transport::{ROOT, Transport};
