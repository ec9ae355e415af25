use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Every recoverable failure raised while framing a message.
///
/// The type is `Clone` so a body reader can latch the first failure and hand
/// it back on every later call; io errors are shared through an `Arc` for
/// that reason.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("malformed response line")]
    MalformedStatusLine,

    #[error("malformed http version: {version}")]
    MalformedVersion { version: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("header field delimiter(':') not found")]
    FieldDelimiterNotFound,

    #[error("end of header(empty line) not found within {max_lines} lines")]
    EndOfHeadersNotFound { max_lines: usize },

    #[error("line too long, still unterminated after {max_continuations} continued reads")]
    LineTooLong { max_continuations: usize },

    #[error("too large chunk header, current: {current_size} exceed the limit {max_size}")]
    ChunkHeaderTooLarge { current_size: usize, max_size: usize },

    #[error("invalid chunk size: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("multiple content-length value found: {count}")]
    MultipleContentLength { count: usize },

    #[error("unsupported transfer-encoding, last encoding is not chunked")]
    UnsupportedTransferEncoding,

    #[error("incomplete body read, {remaining} bytes still expected")]
    IncompleteBody { remaining: u64 },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<ParseError>,
    },

    #[error("io error: {source}")]
    Io {
        #[source]
        source: Arc<io::Error>,
    },
}

impl ParseError {
    pub fn malformed_version<S: ToString>(version: S) -> Self {
        Self::MalformedVersion { version: version.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn end_of_headers_not_found(max_lines: usize) -> Self {
        Self::EndOfHeadersNotFound { max_lines }
    }

    pub fn line_too_long(max_continuations: usize) -> Self {
        Self::LineTooLong { max_continuations }
    }

    pub fn chunk_header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::ChunkHeaderTooLarge { current_size, max_size }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn incomplete_body(remaining: u64) -> Self {
        Self::IncompleteBody { remaining }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: Arc::new(e.into()) }
    }

    /// Wraps `self` with a description of the operation that failed.
    #[must_use]
    pub fn context(self, context: &'static str) -> Self {
        Self::Context { context, source: Box::new(self) }
    }

    /// Follows the context chain down to the error that started it.
    pub fn root_cause(&self) -> &ParseError {
        let mut current = self;
        while let ParseError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if the root cause is the stream ending before the message did.
    pub fn is_unexpected_eof(&self) -> bool {
        match self.root_cause() {
            ParseError::Io { source } => source.kind() == io::ErrorKind::UnexpectedEof,
            ParseError::IncompleteBody { .. } => true,
            _ => false,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_cause_chain() {
        let error = ParseError::FieldDelimiterNotFound.context("reading trailer failed");

        assert_eq!(error.to_string(), "reading trailer failed: header field delimiter(':') not found");
        assert!(matches!(error.root_cause(), ParseError::FieldDelimiterNotFound));

        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "header field delimiter(':') not found");
    }

    #[test]
    fn unexpected_eof_is_detected_through_context() {
        let error = ParseError::io(io::Error::from(io::ErrorKind::UnexpectedEof)).context("reading chunk header failed");
        assert!(error.is_unexpected_eof());

        assert!(ParseError::incomplete_body(3).is_unexpected_eof());
        assert!(!ParseError::MalformedRequestLine.is_unexpected_eof());
    }

    #[test]
    fn latched_copies_share_the_io_source() {
        let error = ParseError::io(io::Error::other("broken pipe"));
        let copy = error.clone();
        match (&error, &copy) {
            (ParseError::Io { source: a }, ParseError::Io { source: b }) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }
}
