//! Framed channel over a byte stream
//!
//! Two wire framings are supported:
//! - `Fixed`: each message kind has a length both sides know in advance
//! - `Prefixed`: [2-byte big-endian length][ASCII payload]
//!
//! Nothing is buffered across calls. A stream that ends mid-frame is reported
//! as `Error::ShortRead`, never as a truncated success.

use noughts_core::Framing;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol;

/// Largest payload accepted in prefixed mode
pub const MAX_FRAME_SIZE: usize = 64;

/// One peer's connection, read and written a whole frame at a time
pub struct FramedChannel<S> {
    stream: S,
    framing: Framing,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedChannel<S> {
    pub fn new(stream: S, framing: Framing) -> Self {
        Self { stream, framing }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Pull from the stream until exactly `n` bytes are assembled
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = match self.stream.read(&mut buf[filled..]).await {
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if filled > 0 || is_disconnect(&e) => {
                    return Err(Error::ShortRead {
                        expected: n,
                        received: filled,
                    })
                }
                Err(e) => return Err(Error::Io(e)),
            };
            if read == 0 {
                return Err(Error::ShortRead {
                    expected: n,
                    received: filled,
                });
            }
            filled += read;
        }
        Ok(buf)
    }

    /// Write every byte, then flush
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one frame whose fixed-mode length is `fixed_len`
    pub async fn recv_frame(&mut self, fixed_len: usize) -> Result<Vec<u8>> {
        match self.framing {
            Framing::Fixed => self.read_exact(fixed_len).await,
            Framing::Prefixed => self.recv_prefixed().await,
        }
    }

    /// Read one server-to-client frame without knowing its kind up front.
    ///
    /// In fixed mode the 2-byte head decides how many bytes follow.
    pub async fn recv_server_frame(&mut self) -> Result<Vec<u8>> {
        match self.framing {
            Framing::Fixed => {
                let mut frame = self.read_exact(protocol::HEAD_LEN).await?;
                let rest = protocol::server_frame_len(&frame) - protocol::HEAD_LEN;
                if rest > 0 {
                    frame.extend(self.read_exact(rest).await?);
                }
                Ok(frame)
            }
            Framing::Prefixed => self.recv_prefixed().await,
        }
    }

    /// Write one frame
    pub async fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        match self.framing {
            Framing::Fixed => self.write_all(payload).await,
            Framing::Prefixed => {
                if payload.is_empty() || payload.len() > MAX_FRAME_SIZE {
                    return Err(Error::Protocol(format!(
                        "Frame size {} out of range (1..={})",
                        payload.len(),
                        MAX_FRAME_SIZE
                    )));
                }
                let mut buf = Vec::with_capacity(2 + payload.len());
                buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
                buf.extend_from_slice(payload);
                self.write_all(&buf).await
            }
        }
    }

    /// Shut down the write half; errors are ignored since the peer may be gone
    pub async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn recv_prefixed(&mut self) -> Result<Vec<u8>> {
        let len_buf = self.read_exact(2).await?;
        let len = u16::from_be_bytes([len_buf[0], len_buf[1]]) as usize;

        if len == 0 {
            return Err(Error::Protocol("Empty frame".into()));
        }
        if len > MAX_FRAME_SIZE {
            return Err(Error::Protocol(format!(
                "Frame too large: {} bytes (max {})",
                len, MAX_FRAME_SIZE
            )));
        }

        self.read_exact(len).await
    }
}

fn is_disconnect(e: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        e.kind(),
        UnexpectedEof | ConnectionReset | ConnectionAborted | BrokenPipe
    )
}
