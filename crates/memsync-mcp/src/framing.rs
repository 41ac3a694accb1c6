//! Content-Length framing for the stdio transport
//!
//! Every message is a `Content-Length: <N>\r\n\r\n` header followed by exactly
//! N body bytes. [`FrameReader`] keeps an accumulation buffer so frames are
//! reassembled the same way no matter how the pipe chunks the bytes.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 4096;

/// Errors produced while reading frames
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("timed out after {0:?} waiting for data")]
    Timeout(Duration),

    #[error("peer closed the stream")]
    Closed,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame header: {0}")]
    InvalidHeader(String),
}

/// Prefix a message body with its Content-Length header
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    frame.extend_from_slice(body);
    frame
}

/// Parse the Content-Length value out of a header block.
///
/// Header names are matched case-insensitively; other headers are ignored.
pub fn parse_content_length(header: &str) -> Result<usize, FrameError> {
    for line in header.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse().map_err(|_| {
                FrameError::InvalidHeader(format!("bad Content-Length value {:?}", value.trim()))
            });
        }
    }
    Err(FrameError::InvalidHeader(format!(
        "missing Content-Length in {:?}",
        header
    )))
}

/// Reads framed messages from a byte stream
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Bytes received but not yet returned as part of a frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Read exactly one frame body.
    ///
    /// `timeout` bounds each individual wait for data, not the whole frame.
    /// Bytes past the end of the frame stay buffered for the next call.
    pub async fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, FrameError> {
        let header_end = loop {
            if let Some(pos) = find(&self.buf, HEADER_TERMINATOR) {
                break pos;
            }
            self.fill(timeout).await?;
        };
        let body_start = header_end + HEADER_TERMINATOR.len();

        let header = String::from_utf8_lossy(&self.buf[..header_end]).into_owned();
        let length = match parse_content_length(&header) {
            Ok(length) => length,
            Err(e) => {
                // Discard the broken header so the next read can resync
                self.buf.drain(..body_start);
                return Err(e);
            }
        };

        while self.buf.len() - body_start < length {
            self.fill(timeout).await?;
        }

        let body = self.buf[body_start..body_start + length].to_vec();
        self.buf.drain(..body_start + length);
        Ok(body)
    }

    async fn fill(&mut self, timeout: Duration) -> Result<(), FrameError> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = tokio::time::timeout(timeout, self.inner.read(&mut chunk))
            .await
            .map_err(|_| FrameError::Timeout(timeout))??;
        if n == 0 {
            return Err(FrameError::Closed);
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
