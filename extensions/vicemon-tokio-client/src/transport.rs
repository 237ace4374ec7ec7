use crate::ClientConfig;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use vicemon::MonitorError;
use vicemon::constants::FRAME_HEADER_SIZE;
use vicemon::frame::{FrameCodec, RawResponse};

/// Initial capacity of a connection's read buffer. Grows on demand for large
/// memory reads.
pub(crate) const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Opens the TCP connection described by `config`.
///
/// An OS-level failure (nothing listening, unreachable host, failed name
/// resolution) is `ConnectionRefused`; running out of `connect_timeout` is
/// `Timeout`.
pub(crate) async fn connect_stream(config: &ClientConfig) -> Result<TcpStream, MonitorError> {
    let address = config.address();

    let stream = match timeout(config.connect_timeout, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!(%address, error = %e, "Monitor connection failed");
            return Err(MonitorError::ConnectionRefused(e.to_string()));
        }
        Err(_) => {
            tracing::warn!(%address, timeout = ?config.connect_timeout, "Monitor connection timed out");
            return Err(MonitorError::Timeout(config.connect_timeout));
        }
    };

    // Requests are small and latency bound.
    stream
        .set_nodelay(true)
        .map_err(|e| MonitorError::ConnectionRefused(e.to_string()))?;

    tracing::debug!(%address, "Connected to monitor");

    Ok(stream)
}

/// Writes a whole frame. `write_all` keeps going across partial writes.
pub(crate) async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), MonitorError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(frame)
        .await
        .map_err(|e| MonitorError::WriteFailed(e.to_string()))?;

    writer
        .flush()
        .await
        .map_err(|e| MonitorError::WriteFailed(e.to_string()))
}

/// Reads one frame at a time from a byte stream: the 12 header bytes first,
/// then exactly as many body bytes as the header declares.
///
/// Bytes are accumulated in a buffer owned by the reader, never in the
/// future, so [`read_frame`](Self::read_frame) is cancel safe: dropping it
/// mid-frame (a timeout, a `select!`) loses nothing and the next call resumes
/// where it left off.
pub(crate) struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    pub(crate) fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
        }
    }

    /// Drops any partially received frame.
    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
    }

    pub(crate) async fn read_frame<R>(&mut self, reader: &mut R) -> Result<RawResponse, MonitorError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(frame) = self.next_buffered()? {
                return Ok(frame);
            }

            match reader.read_buf(&mut self.buffer).await {
                Ok(0) => return Err(MonitorError::ConnectionClosed),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Monitor read failed");
                    return Err(MonitorError::ConnectionClosed);
                }
            }
        }
    }

    fn next_buffered(&mut self) -> Result<Option<RawResponse>, MonitorError> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        header_bytes.copy_from_slice(&self.buffer[..FRAME_HEADER_SIZE]);
        let header = FrameCodec::decode_header(&header_bytes)?;

        let body_length = header.body_length as usize;
        let total = FRAME_HEADER_SIZE + body_length;
        if self.buffer.len() < total {
            self.buffer.reserve(total - self.buffer.len());
            return Ok(None);
        }

        self.buffer.advance(FRAME_HEADER_SIZE);
        let body = self.buffer.split_to(body_length).to_vec();

        Ok(Some(FrameCodec::decode_body(header, body)?))
    }
}
