//! Full-mesh TCP participant group, one process per rank.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future;
use matmul_types::{Element, Rank, Tag};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::frame::{Frame, read_hello, write_frame, write_hello};
use crate::mailbox::Mailbox;
use crate::reader::PeerReader;
use crate::transport::{Transport, check_len, check_rank};
use crate::Error;

/// How hard to try reaching peers that have not started listening yet.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub max_retries: usize,
    pub initial_backoff: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// A bound listener waiting to join a TCP participant group.
///
/// Binding and joining are separate so every rank can listen before any
/// rank starts connecting.
///
/// # Connection Layout
///
/// Rank `r` connects to every rank below it and accepts a connection from
/// every rank above it. The connecting side opens with a hello carrying its
/// rank and the group size.
///
/// # Example
///
/// ```no_run
/// use matmul_comm::{ConnectOptions, TcpGroup, Transport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let peers = vec!["127.0.0.1:7000".parse()?, "127.0.0.1:7001".parse()?];
///     let group = TcpGroup::bind(peers[0]).await?;
///     let transport = group.join(0, &peers, &ConnectOptions::default()).await?;
///
///     transport.send(1, 3, vec![4, 2, 2]).await?;
///     Ok(())
/// }
/// ```
pub struct TcpGroup {
    listener: TcpListener,
}

impl TcpGroup {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Connects this listener into the group described by `peers`, where
    /// `peers[r]` is the listening address of rank `r`.
    pub async fn join(
        self,
        rank: Rank,
        peers: &[SocketAddr],
        options: &ConnectOptions,
    ) -> Result<TcpTransport, Error> {
        let size = peers.len();
        check_rank(rank, size)?;

        let mut streams = HashMap::with_capacity(size.saturating_sub(1));
        for (peer, addr) in peers.iter().enumerate().take(rank) {
            let mut stream = connect_with_retry(peer, *addr, options).await?;
            write_hello(&mut stream, rank, size).await?;
            debug!(rank, peer, %addr, "connected to peer");
            streams.insert(peer, stream);
        }

        while streams.len() + 1 < size {
            let (mut stream, from) = self.listener.accept().await?;
            let peer = read_hello(&mut stream, size).await?;
            if peer <= rank || peer >= size || streams.contains_key(&peer) {
                return Err(Error::Handshake(format!(
                    "unexpected connection from rank {} at {}",
                    peer, from
                )));
            }
            debug!(rank, peer, %from, "accepted peer");
            streams.insert(peer, stream);
        }

        info!(rank, size, "joined participant group");
        TcpTransport::from_streams(rank, size, streams)
    }
}

async fn connect_with_retry(
    peer: Rank,
    addr: SocketAddr,
    options: &ConnectOptions,
) -> Result<TcpStream, Error> {
    let mut retries = 0;
    let mut delay = options.initial_backoff;

    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                retries += 1;
                if retries > options.max_retries {
                    warn!(peer, %addr, error = %e, "giving up on peer");
                    return Err(Error::Unreachable {
                        rank: peer,
                        attempts: retries,
                    });
                }
                trace!(peer, %addr, retries, "peer not listening yet");
            }
        }

        tokio::time::sleep(delay).await;
        delay *= 2;
    }
}

/// One rank's handle into a [`TcpGroup`].
pub struct TcpTransport {
    rank: Rank,
    size: usize,
    mailbox: Arc<Mailbox>,
    writers: HashMap<Rank, Mutex<OwnedWriteHalf>>,
    readers: Vec<JoinHandle<()>>,
}

impl TcpTransport {
    /// Binds `peers[rank]` and joins the group in one step.
    pub async fn connect(
        rank: Rank,
        peers: &[SocketAddr],
        options: &ConnectOptions,
    ) -> Result<Self, Error> {
        let addr = *peers.get(rank).ok_or(Error::UnknownRank {
            rank,
            size: peers.len(),
        })?;
        TcpGroup::bind(addr).await?.join(rank, peers, options).await
    }

    fn from_streams(
        rank: Rank,
        size: usize,
        streams: HashMap<Rank, TcpStream>,
    ) -> Result<Self, Error> {
        let mailbox = Arc::new(Mailbox::new());
        let mut writers = HashMap::with_capacity(streams.len());
        let mut readers = Vec::with_capacity(streams.len());

        for (peer, stream) in streams {
            stream.set_nodelay(true)?;
            let (read, write) = stream.into_split();
            let reader = PeerReader::new(peer, read, Arc::clone(&mailbox));
            readers.push(tokio::spawn(reader.run()));
            writers.insert(peer, Mutex::new(write));
        }

        Ok(Self {
            rank,
            size,
            mailbox,
            writers,
            readers,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn send(&self, dest: Rank, tag: Tag, payload: Vec<Element>) -> Result<(), Error> {
        check_rank(dest, self.size)?;
        trace!(src = self.rank, dest, tag, len = payload.len(), "send");
        if dest == self.rank {
            self.mailbox.deliver(self.rank, tag, payload);
            return Ok(());
        }

        let writer = self.writers.get(&dest).ok_or(Error::Disconnected(dest))?;
        let mut writer = writer.lock().await;
        write_frame(&mut *writer, &Frame::Data { tag, payload }).await
    }

    async fn recv(&self, src: Rank, tag: Tag, expected_len: usize) -> Result<Vec<Element>, Error> {
        check_rank(src, self.size)?;
        let payload = self.mailbox.take(src, tag).await?;
        trace!(src, dest = self.rank, tag, len = payload.len(), "recv");
        check_len(src, tag, expected_len, payload)
    }

    async fn abort(&self, code: i32) {
        warn!(rank = self.rank, code, "aborting participant group");
        self.mailbox.abort(code);

        let notices = self.writers.iter().map(|(&peer, writer)| async move {
            let mut writer = writer.lock().await;
            if let Err(e) = write_frame(&mut *writer, &Frame::Abort { code }).await {
                debug!(peer, error = %e, "could not deliver abort");
            }
        });
        future::join_all(notices).await;
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}
