//! In-process participant group.

use std::sync::Arc;

use async_trait::async_trait;
use matmul_types::{Element, Rank, Tag};
use tracing::{trace, warn};

use crate::mailbox::Mailbox;
use crate::transport::{Transport, check_len, check_rank};
use crate::Error;

/// Builds groups whose participants share one process.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `size` connected transports, indexed by rank.
    pub fn new(size: usize) -> Vec<LocalTransport> {
        let mailboxes: Arc<[Mailbox]> = (0..size).map(|_| Mailbox::new()).collect();
        (0..size)
            .map(|rank| LocalTransport {
                rank,
                mailboxes: Arc::clone(&mailboxes),
            })
            .collect()
    }
}

/// One rank's handle into a [`LocalGroup`].
pub struct LocalTransport {
    rank: Rank,
    mailboxes: Arc<[Mailbox]>,
}

impl LocalTransport {
    /// Returns the abort code if any rank has aborted the group.
    pub fn aborted(&self) -> Option<i32> {
        self.mailboxes[self.rank].aborted()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.mailboxes.len()
    }

    async fn send(&self, dest: Rank, tag: Tag, payload: Vec<Element>) -> Result<(), Error> {
        check_rank(dest, self.size())?;
        trace!(src = self.rank, dest, tag, len = payload.len(), "send");
        self.mailboxes[dest].deliver(self.rank, tag, payload);
        Ok(())
    }

    async fn recv(&self, src: Rank, tag: Tag, expected_len: usize) -> Result<Vec<Element>, Error> {
        check_rank(src, self.size())?;
        let payload = self.mailboxes[self.rank].take(src, tag).await?;
        trace!(src, dest = self.rank, tag, len = payload.len(), "recv");
        check_len(src, tag, expected_len, payload)
    }

    async fn abort(&self, code: i32) {
        warn!(rank = self.rank, code, "aborting local group");
        for mailbox in self.mailboxes.iter() {
            mailbox.abort(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn point_to_point() {
        let group = LocalGroup::new(3);
        group[2].send(1, 5, vec![7, 8]).await.unwrap();
        assert_eq!(group[1].recv(2, 5, 2).await.unwrap(), vec![7, 8]);
    }

    #[tokio::test]
    async fn rejects_unknown_rank() {
        let group = LocalGroup::new(2);
        let err = group[0].send(2, 0, vec![]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownRank { rank: 2, size: 2 }));
    }

    #[tokio::test]
    async fn length_mismatch_is_an_error() {
        let group = LocalGroup::new(2);
        group[0].send(1, 3, vec![1, 2, 3]).await.unwrap();
        let err = group[1].recv(0, 3, 4).await.unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn abort_reaches_every_rank() {
        let group = LocalGroup::new(3);
        group[2].abort(5).await;
        for transport in &group {
            assert_eq!(transport.aborted(), Some(5));
        }
        assert!(matches!(
            group[0].recv(1, 0, 0).await,
            Err(Error::Aborted { code: 5 })
        ));
    }
}
