//! Reader for bodies that run until the peer closes the connection.

use bytes::BytesMut;
use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::LineSource;
use crate::protocol::{ParseError, PayloadItem};

/// Reads blocks until the end of the stream, which is the clean end of the body.
#[derive(Debug)]
pub struct ClosingReader<R> {
    source: LineSource<R>,
    closed: bool,
    error: Option<ParseError>,
}

impl<R> ClosingReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(source: LineSource<R>) -> Self {
        Self { source, closed: false, error: None }
    }

    /// Reads the next block of at most [`Limits::body_block_size`](crate::config::Limits::body_block_size) bytes.
    ///
    /// The end of the stream turns into `PayloadItem::Eof`, returned again on
    /// every later call. Other io errors are returned unchanged and latched.
    pub async fn read(&mut self) -> Result<PayloadItem, ParseError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if self.closed {
            return Ok(PayloadItem::Eof);
        }

        let mut buf = BytesMut::zeroed(self.source.limits().body_block_size.max(1));
        let n = match self.source.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                self.error = Some(e.clone());
                return Err(e);
            }
        };

        if n == 0 {
            trace!("stream closed, end of body");
            self.closed = true;
            return Ok(PayloadItem::Eof);
        }

        buf.truncate(n);
        trace!(len = n, "read until-close block");
        Ok(PayloadItem::Chunk(buf.freeze()))
    }
}
