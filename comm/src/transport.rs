//! The transport contract shared by every participant group.

use async_trait::async_trait;
use matmul_types::{Element, Rank, Tag, tag};
use tracing::trace;

use crate::Error;

/// Rank that roots the barrier.
pub const ROOT: Rank = 0;

/// Point-to-point and collective messaging among a fixed set of ranks.
///
/// Implementations only provide addressing, `send`, `recv` and `abort`;
/// [`Transport::barrier`] and [`Transport::broadcast`] are built on top of
/// them with reserved tags, so every transport gets identical collective
/// semantics.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Rank of this participant.
    fn rank(&self) -> Rank;

    /// Number of participants in the group.
    fn size(&self) -> usize;

    /// Hands `payload` to the transport for delivery to `dest`.
    async fn send(&self, dest: Rank, tag: Tag, payload: Vec<Element>) -> Result<(), Error>;

    /// Receives the next message from `src` with `tag`.
    ///
    /// Fails with [`Error::LengthMismatch`] unless the message holds exactly
    /// `expected_len` elements.
    async fn recv(&self, src: Rank, tag: Tag, expected_len: usize) -> Result<Vec<Element>, Error>;

    /// Tears down the whole group: every pending and future receive on
    /// every rank fails with [`Error::Aborted`].
    async fn abort(&self, code: i32);

    /// Blocks until every rank has entered the barrier.
    async fn barrier(&self) -> Result<(), Error> {
        if self.rank() == ROOT {
            for rank in 1..self.size() {
                self.recv(rank, tag::BARRIER_ENTER, 0).await?;
            }
            for rank in 1..self.size() {
                self.send(rank, tag::BARRIER_RELEASE, Vec::new()).await?;
            }
        } else {
            self.send(ROOT, tag::BARRIER_ENTER, Vec::new()).await?;
            self.recv(ROOT, tag::BARRIER_RELEASE, 0).await?;
        }
        trace!(rank = self.rank(), "barrier passed");
        Ok(())
    }

    /// Copies `root`'s `buf` into `buf` on every other rank.
    ///
    /// All ranks must pass buffers of the same length. The call returns only
    /// after every rank has entered it.
    async fn broadcast(&self, root: Rank, buf: &mut [Element]) -> Result<(), Error> {
        if self.rank() == root {
            for rank in (0..self.size()).filter(|&rank| rank != root) {
                self.send(rank, tag::BROADCAST, buf.to_vec()).await?;
            }
        } else {
            let received = self.recv(root, tag::BROADCAST, buf.len()).await?;
            buf.copy_from_slice(&received);
        }
        self.barrier().await
    }
}

pub(crate) fn check_rank(rank: Rank, size: usize) -> Result<(), Error> {
    if rank < size {
        Ok(())
    } else {
        Err(Error::UnknownRank { rank, size })
    }
}

pub(crate) fn check_len(
    src: Rank,
    tag: Tag,
    expected: usize,
    payload: Vec<Element>,
) -> Result<Vec<Element>, Error> {
    if payload.len() == expected {
        Ok(payload)
    } else {
        Err(Error::LengthMismatch {
            src,
            tag,
            expected,
            actual: payload.len(),
        })
    }
}
