//! Length-prefixed framing over an async byte stream (spec §4.F): a 4-byte
//! big-endian length, then exactly that many bytes of message body. Only
//! this outer length is big-endian; every integer inside the body (encoded
//! by [`crate::net::protocol`]) is little-endian, matching the original
//! server's FlatBuffers-derived wire layout byte-for-byte.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::MAX_FRAME_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum FrameIoError {
    #[error("peer closed the connection")]
    Closed,
    #[error("frame of {size} bytes exceeds the {limit}-byte maximum")]
    Oversized { size: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads one length-prefixed frame's body. Returns `Ok(None)` on a clean
/// EOF at a frame boundary (the peer hung up between messages, not an
/// error); an EOF mid-frame is `Err(FrameIoError::Closed)`.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, FrameIoError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        // Drain and discard so the stream stays byte-aligned for the next
        // frame; the caller turns this into a wire `Error` and keeps
        // reading (spec §7).
        let mut remaining = len;
        let mut sink = [0u8; 4096];
        while remaining > 0 {
            let take = remaining.min(sink.len());
            reader.read_exact(&mut sink[..take]).await?;
            remaining -= take;
        }
        return Err(FrameIoError::Oversized {
            size: len,
            limit: MAX_FRAME_SIZE,
        });
    }
    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameIoError::Closed
        } else {
            FrameIoError::Io(e)
        })?;
    Ok(Some(body))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), FrameIoError> {
    let len = u32::try_from(body.len()).map_err(|_| FrameIoError::Oversized {
        size: body.len(),
        limit: MAX_FRAME_SIZE,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(body).await?;
    Ok(())
}
