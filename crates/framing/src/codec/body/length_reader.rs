//! Reader for bodies delimited by a `Content-Length` header, as defined in
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use std::cmp;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::LineSource;
use crate::protocol::{ParseError, PayloadItem};

/// A reader for a body of known length.
///
/// The reader tracks the bytes still expected and never reads past them, so
/// the next message on the stream stays untouched.
#[derive(Debug)]
pub struct LengthReader<R> {
    source: LineSource<R>,
    /// The number of bytes remaining to be read from the body
    remaining: u64,
    /// First failure, returned again on every later read
    error: Option<ParseError>,
}

impl<R> LengthReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a new LengthReader.
    ///
    /// # Arguments
    /// * `source` - The stream positioned at the first body byte
    /// * `length` - The body length announced by the `Content-Length` header
    pub fn new(source: LineSource<R>, length: u64) -> Self {
        Self { source, remaining: length, error: None }
    }

    /// Bytes of the body not read yet.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Reads the next block of at most [`Limits::body_block_size`](crate::config::Limits::body_block_size) bytes.
    ///
    /// # Returns
    /// * `Ok(PayloadItem::Chunk(bytes))` for every block read
    /// * `Ok(PayloadItem::Eof)` once all announced bytes have been read
    /// * `Err(ParseError::IncompleteBody)` if the stream ends early; the error is latched
    pub async fn read(&mut self) -> Result<PayloadItem, ParseError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }

        if self.remaining == 0 {
            return Ok(PayloadItem::Eof);
        }

        match self.read_block().await {
            Ok(bytes) => {
                self.remaining -= bytes.len() as u64;
                trace!(len = bytes.len(), remaining = self.remaining, "read content-length block");
                Ok(PayloadItem::Chunk(bytes))
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Returns the stream once every byte of the body has been read.
    pub fn into_source(self) -> Option<LineSource<R>> {
        (self.remaining == 0 && self.error.is_none()).then_some(self.source)
    }

    async fn read_block(&mut self) -> Result<Bytes, ParseError> {
        let block_size = self.source.limits().body_block_size.max(1) as u64;
        // bounded by the block size, so it fits in usize
        let size = cmp::min(self.remaining, block_size) as usize;

        let mut buf = BytesMut::zeroed(size);
        let n = self.source.read(&mut buf).await?;
        if n == 0 {
            return Err(ParseError::incomplete_body(self.remaining));
        }

        buf.truncate(n);
        Ok(buf.freeze())
    }
}
