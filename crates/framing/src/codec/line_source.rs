//! Buffered line reading over an async byte stream.
//!
//! [`LineSource`] is the only reader of the wrapped stream once it is created.
//! Header blocks are pulled from it line by line while bodies use its raw
//! [`read`](LineSource::read), which drains bytes already buffered before
//! touching the stream again.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::trace;

use crate::config::Limits;
use crate::protocol::ParseError;

/// A line-oriented reader over an async byte stream.
///
/// Lines are terminated by LF or CRLF and returned without the terminator.
/// A line longer than the internal buffer is re-assembled from several
/// buffer-sized fragments, up to [`Limits::max_line_continuations`] extra reads.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: BufReader<R>,
    limits: Limits,
}

/// One piece of a line as handed out by the buffered reader.
struct Fragment {
    bytes: BytesMut,
    /// The buffer filled up before a line terminator was seen
    is_prefix: bool,
}

impl<R> LineSource<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self { reader: BufReader::with_capacity(limits.line_buffer_size.max(1), reader), limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Reads one logical line.
    ///
    /// # Returns
    /// - `Ok(Some(line))` with the terminator stripped; the bytes are owned by the caller
    /// - `Ok(None)` when the stream ended before any byte of a new line
    /// - `Err(ParseError::LineTooLong)` when the line did not end within the continuation budget
    pub async fn read_line(&mut self) -> Result<Option<Bytes>, ParseError> {
        let Some(first) = self.read_fragment().await? else {
            return Ok(None);
        };

        let mut line = first.bytes;
        if !first.is_prefix {
            return Ok(Some(strip_line_ending(line)));
        }

        for _ in 0..self.limits.max_line_continuations {
            let Some(fragment) = self.read_fragment().await? else {
                // the stream ended in the middle of a long line, hand out what we have
                return Ok(Some(strip_line_ending(line)));
            };

            line.extend_from_slice(&fragment.bytes);
            if !fragment.is_prefix {
                trace!(len = line.len(), "re-assembled continued line");
                return Ok(Some(strip_line_ending(line)));
            }
        }

        Err(ParseError::line_too_long(self.limits.max_line_continuations))
    }

    /// Reads raw body bytes into `buf`, returning how many were read.
    ///
    /// Bytes already buffered by line reads are returned first. `Ok(0)` with a
    /// non-empty `buf` means the stream has ended.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ParseError> {
        Ok(self.reader.read(buf).await?)
    }

    /// Fills `buf` completely or fails with an `UnexpectedEof` io error.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.reader.read_exact(buf).await?;
        Ok(())
    }

    /// Returns the wrapped stream, dropping any bytes still buffered.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Collects bytes until a LF, a full buffer's worth of bytes, or the end of the stream.
    async fn read_fragment(&mut self) -> Result<Option<Fragment>, ParseError> {
        let capacity = self.limits.line_buffer_size.max(1);
        let mut bytes = BytesMut::new();

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                // an unterminated tail at the end of the stream still counts as a line
                return Ok((!bytes.is_empty()).then(|| Fragment { bytes, is_prefix: false }));
            }

            let window = &available[..available.len().min(capacity - bytes.len())];
            if let Some(index) = memchr_lf(window) {
                bytes.extend_from_slice(&window[..=index]);
                self.reader.consume(index + 1);
                return Ok(Some(Fragment { bytes, is_prefix: false }));
            }

            let taken = window.len();
            bytes.extend_from_slice(window);
            self.reader.consume(taken);

            if bytes.len() >= capacity {
                return Ok(Some(Fragment { bytes, is_prefix: true }));
            }
        }
    }
}

fn memchr_lf(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|b| *b == b'\n')
}

fn strip_line_ending(mut line: BytesMut) -> Bytes {
    if line.ends_with(b"\n") {
        line.truncate(line.len() - 1);
        if line.ends_with(b"\r") {
            line.truncate(line.len() - 1);
        }
    }
    line.freeze()
}
