//! Little-endian framing for the TCP transport.
//!
//! A frame is a kind byte, an `i32` tag, a `u32` element count, then that
//! many `i32` elements. Abort frames carry the abort code in the tag field
//! and no payload.

use matmul_types::{Element, Rank, Tag};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::Error;

const KIND_DATA: u8 = 0;
const KIND_ABORT: u8 = 1;

/// Largest payload a single frame may carry, in elements.
pub(crate) const MAX_FRAME_ELEMENTS: usize = 1 << 28;

const HELLO_MAGIC: &[u8; 4] = b"RBMM";
const HELLO_VERSION: u32 = 1;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Data { tag: Tag, payload: Vec<Element> },
    Abort { code: i32 },
}

pub(crate) async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let (kind, tag, payload) = match frame {
        Frame::Data { tag, payload } => (KIND_DATA, *tag, payload.as_slice()),
        Frame::Abort { code } => (KIND_ABORT, *code, &[][..]),
    };
    if payload.len() > MAX_FRAME_ELEMENTS {
        return Err(Error::Wire(format!(
            "payload of {} elements exceeds the frame limit of {}",
            payload.len(),
            MAX_FRAME_ELEMENTS
        )));
    }
    let len = payload.len() as u32;

    let mut buf = Vec::with_capacity(9 + payload.len() * 4);
    buf.push(kind);
    buf.extend_from_slice(&tag.to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    for value in payload {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next frame, or `None` if the peer closed the connection
/// cleanly between frames.
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, Error>
where
    R: AsyncRead + Unpin,
{
    let kind = match reader.read_u8().await {
        Ok(kind) => kind,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let tag = reader.read_i32_le().await?;
    let len = reader.read_u32_le().await? as usize;
    if len > MAX_FRAME_ELEMENTS {
        return Err(Error::Wire(format!(
            "frame of {} elements exceeds the limit of {}",
            len, MAX_FRAME_ELEMENTS
        )));
    }

    let mut bytes = vec![0u8; len * 4];
    reader.read_exact(&mut bytes).await?;
    let payload = bytes
        .chunks_exact(4)
        .map(|c| Element::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    match kind {
        KIND_DATA => Ok(Some(Frame::Data { tag, payload })),
        KIND_ABORT => Ok(Some(Frame::Abort { code: tag })),
        other => Err(Error::Wire(format!("unknown frame kind {}", other))),
    }
}

/// Sent by the connecting side right after the socket opens.
pub(crate) async fn write_hello<W>(writer: &mut W, rank: Rank, size: usize) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(16);
    buf.extend_from_slice(HELLO_MAGIC);
    buf.extend_from_slice(&HELLO_VERSION.to_le_bytes());
    buf.extend_from_slice(&(rank as u32).to_le_bytes());
    buf.extend_from_slice(&(size as u32).to_le_bytes());
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a hello and returns the peer's rank after checking it belongs to
/// a group of `size`.
pub(crate) async fn read_hello<R>(reader: &mut R, size: usize) -> Result<Rank, Error>
where
    R: AsyncRead + Unpin,
{
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).await?;
    if &magic != HELLO_MAGIC {
        return Err(Error::Handshake(format!(
            "invalid magic: {}",
            String::from_utf8_lossy(&magic)
        )));
    }

    let version = reader.read_u32_le().await?;
    if version != HELLO_VERSION {
        return Err(Error::Handshake(format!("unsupported version {}", version)));
    }

    let rank = reader.read_u32_le().await? as Rank;
    let peer_size = reader.read_u32_le().await? as usize;
    if peer_size != size {
        return Err(Error::Handshake(format!(
            "rank {} expects a group of {}, this group has {}",
            rank, peer_size, size
        )));
    }
    Ok(rank)
}
