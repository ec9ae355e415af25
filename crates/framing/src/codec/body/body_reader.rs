//! The body of a parsed message, whichever way it is delimited.
//!
//! [`Body`] hides the framing behind one pull-based [`read`](Body::read):
//! - Content-Length based bodies ([`LengthReader`])
//! - Chunked transfer encoding ([`ChunkedReader`])
//! - Bodies running until the connection closes ([`ClosingReader`])
//! - Messages with no body
//!
//! Every variant owns the [`LineSource`] the head was read from. Once the body
//! is read to its end, [`Body::into_source`] hands the stream back for the
//! next message.

use tokio::io::AsyncRead;

use crate::codec::body::chunked_reader::{ChunkedMode, ChunkedReader};
use crate::codec::body::closing_reader::ClosingReader;
use crate::codec::body::length_reader::LengthReader;
use crate::codec::LineSource;
use crate::protocol::{Headers, ParseError, PayloadItem, PayloadSize};

#[derive(Debug)]
pub struct Body<R> {
    /// The specific reading strategy to use
    kind: Kind<R>,
}

/// Enum representing different body reading strategies.
#[derive(Debug)]
enum Kind<R> {
    /// Read a fixed number of bytes
    Length(LengthReader<R>),

    /// Decode chunked transfer encoding
    Chunked(ChunkedReader<R>),

    /// Read until the peer closes the stream
    Closing(ClosingReader<R>),

    /// No body, the source is kept for the next message
    Empty(LineSource<R>),
}

impl<R> Body<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Creates a Body for messages with no body.
    pub fn empty(source: LineSource<R>) -> Self {
        Self { kind: Kind::Empty(source) }
    }

    /// Creates a Body for chunked transfer encoding.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime, see [`ChunkedReader::new`].
    pub fn chunked(source: LineSource<R>, mode: ChunkedMode) -> Self {
        Self { kind: Kind::Chunked(ChunkedReader::new(source, mode)) }
    }

    /// Creates a Body for a fixed-length payload.
    ///
    /// # Arguments
    /// * `size` - The expected content length in bytes
    pub fn fix_length(source: LineSource<R>, size: u64) -> Self {
        Self { kind: Kind::Length(LengthReader::new(source, size)) }
    }

    /// Creates a Body read until the end of the stream.
    pub fn until_close(source: LineSource<R>) -> Self {
        Self { kind: Kind::Closing(ClosingReader::new(source)) }
    }

    /// Creates the Body matching a resolved [`PayloadSize`].
    ///
    /// # Panics
    ///
    /// Panics if `size` is chunked and this is called outside of a tokio runtime.
    pub fn from_size(source: LineSource<R>, size: PayloadSize, mode: ChunkedMode) -> Self {
        match size {
            PayloadSize::Length(length) => Self::fix_length(source, length),
            PayloadSize::Chunked => Self::chunked(source, mode),
            PayloadSize::UntilClose => Self::until_close(source),
            PayloadSize::Empty => Self::empty(source),
        }
    }

    /// Reads the next block of the body.
    ///
    /// # Returns
    /// * `Ok(PayloadItem::Chunk(bytes))` for each block, each at most
    ///   [`Limits::body_block_size`](crate::config::Limits::body_block_size) long
    /// * `Ok(PayloadItem::Eof)` once the body is complete, and on every later call
    /// * `Err(ParseError)` if the body is malformed or the stream fails
    pub async fn read(&mut self) -> Result<PayloadItem, ParseError> {
        match &mut self.kind {
            Kind::Length(reader) => reader.read().await,
            Kind::Chunked(reader) => reader.read().await,
            Kind::Closing(reader) => reader.read().await,
            Kind::Empty(_) => Ok(PayloadItem::Eof),
        }
    }

    /// Returns whether this body uses chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this is a message without a body.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Empty(_))
    }

    /// Returns whether this body has a fixed length.
    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    /// Returns whether this body runs until the stream closes.
    pub fn is_until_close(&self) -> bool {
        matches!(self.kind, Kind::Closing(_))
    }

    /// The chunked reader behind this body, if it is chunked.
    pub fn as_chunked(&self) -> Option<&ChunkedReader<R>> {
        match &self.kind {
            Kind::Chunked(reader) => Some(reader),
            _ => None,
        }
    }

    /// Trailer fields of a chunked body once it has been read to its end.
    pub fn trailers(&self) -> Option<&Headers> {
        self.as_chunked().and_then(ChunkedReader::trailers)
    }

    /// Takes the stream back once the body is complete.
    ///
    /// Returns `None` while the body has not been read to its end, after a
    /// failure, and for bodies running until the stream closes.
    pub async fn into_source(self) -> Option<LineSource<R>> {
        match self.kind {
            Kind::Length(reader) => reader.into_source(),
            Kind::Chunked(reader) => reader.into_source().await,
            Kind::Closing(_) => None,
            Kind::Empty(source) => Some(source),
        }
    }
}
