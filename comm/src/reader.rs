//! Background task feeding one peer connection into the local mailbox.

use std::sync::Arc;

use matmul_types::Rank;
use tokio::net::tcp::OwnedReadHalf;
use tracing::{debug, warn};

use crate::frame::{Frame, read_frame};
use crate::mailbox::Mailbox;
use crate::Error;

pub(crate) struct PeerReader {
    peer: Rank,
    stream: OwnedReadHalf,
    mailbox: Arc<Mailbox>,
}

impl PeerReader {
    pub(crate) fn new(peer: Rank, stream: OwnedReadHalf, mailbox: Arc<Mailbox>) -> Self {
        Self {
            peer,
            stream,
            mailbox,
        }
    }

    /// Delivers frames until the peer goes away. The peer is marked
    /// disconnected however the loop ends.
    pub(crate) async fn run(mut self) {
        if let Err(e) = self.pump().await {
            warn!(peer = self.peer, error = %e, "peer connection failed");
        }
        debug!(peer = self.peer, "peer disconnected");
        self.mailbox.disconnect(self.peer);
    }

    async fn pump(&mut self) -> Result<(), Error> {
        while let Some(frame) = read_frame(&mut self.stream).await? {
            match frame {
                Frame::Data { tag, payload } => self.mailbox.deliver(self.peer, tag, payload),
                Frame::Abort { code } => {
                    warn!(peer = self.peer, code, "peer aborted the group");
                    self.mailbox.abort(code);
                }
            }
        }
        Ok(())
    }
}
