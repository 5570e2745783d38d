//! Per-rank queue of delivered messages, matched on `(source, tag)`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use matmul_types::{Element, Rank, Tag};
use tokio::sync::Notify;

use crate::Error;

/// Incoming messages for one rank.
///
/// Messages for the same `(source, tag)` pair are handed out in delivery
/// order. Messages nobody is waiting for yet are queued until someone asks.
/// Once the group is aborted every take fails, queued messages included.
pub(crate) struct Mailbox {
    inner: Mutex<Inner>,
    notify: Notify,
}

#[derive(Default)]
struct Inner {
    queues: HashMap<(Rank, Tag), VecDeque<Vec<Element>>>,
    disconnected: HashSet<Rank>,
    aborted: Option<i32>,
}

impl Mailbox {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
        }
    }

    pub(crate) fn deliver(&self, src: Rank, tag: Tag, payload: Vec<Element>) {
        self.lock()
            .queues
            .entry((src, tag))
            .or_default()
            .push_back(payload);
        self.notify.notify_waiters();
    }

    /// Waits for the next message from `src` carrying `tag`.
    pub(crate) async fn take(&self, src: Rank, tag: Tag) -> Result<Vec<Element>, Error> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.try_take(src, tag) {
                return result;
            }
            notified.await;
        }
    }

    /// Marks `src` as gone. Messages it already delivered can still be taken.
    pub(crate) fn disconnect(&self, src: Rank) {
        self.lock().disconnected.insert(src);
        self.notify.notify_waiters();
    }

    pub(crate) fn abort(&self, code: i32) {
        self.lock().aborted.get_or_insert(code);
        self.notify.notify_waiters();
    }

    pub(crate) fn aborted(&self) -> Option<i32> {
        self.lock().aborted
    }

    fn try_take(&self, src: Rank, tag: Tag) -> Option<Result<Vec<Element>, Error>> {
        let mut inner = self.lock();
        if let Some(code) = inner.aborted {
            return Some(Err(Error::Aborted { code }));
        }
        if let Some(queue) = inner.queues.get_mut(&(src, tag)) {
            let payload = queue.pop_front();
            if queue.is_empty() {
                inner.queues.remove(&(src, tag));
            }
            if let Some(payload) = payload {
                return Some(Ok(payload));
            }
        }
        if inner.disconnected.contains(&src) {
            return Some(Err(Error::Disconnected(src)));
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn preserves_order_per_source_and_tag() {
        let mailbox = Mailbox::new();
        mailbox.deliver(1, 4, vec![1]);
        mailbox.deliver(2, 4, vec![2]);
        mailbox.deliver(1, 4, vec![3]);

        assert_eq!(mailbox.take(1, 4).await.unwrap(), vec![1]);
        assert_eq!(mailbox.take(1, 4).await.unwrap(), vec![3]);
        assert_eq!(mailbox.take(2, 4).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn wakes_waiting_take() {
        let mailbox = Arc::new(Mailbox::new());
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.take(3, 9).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        mailbox.deliver(3, 8, vec![0]);
        mailbox.deliver(3, 9, vec![42]);

        assert_eq!(waiter.await.unwrap().unwrap(), vec![42]);
        assert_eq!(mailbox.take(3, 8).await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn abort_fails_pending_take() {
        let mailbox = Arc::new(Mailbox::new());
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.take(1, 1).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        mailbox.abort(5);
        mailbox.abort(7);

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Aborted { code: 5 }));
        assert_eq!(mailbox.aborted(), Some(5));
    }

    #[tokio::test]
    async fn disconnect_drains_queue_first() {
        let mailbox = Mailbox::new();
        mailbox.deliver(2, 0, vec![1, 2]);
        mailbox.disconnect(2);

        assert_eq!(mailbox.take(2, 0).await.unwrap(), vec![1, 2]);
        assert!(matches!(
            mailbox.take(2, 0).await,
            Err(Error::Disconnected(2))
        ));
    }
}
