//! HTTP request decoder.
//!
//! Decoding happens in two phases on the same [`LineSource`]:
//! 1. Head parsing: the request line, then the header block through [`read_headers`]
//! 2. Body selection: the length rules pick the [`Body`] reader, which takes
//!    the source over so the body can be read after the request is returned
//!
//! # Example
//!
//! ```no_run
//! use micro_framing::codec::{read_request, LineSource};
//! use micro_framing::protocol::PayloadItem;
//! use tokio::net::TcpStream;
//!
//! # async fn run(stream: TcpStream) -> Result<(), micro_framing::protocol::ParseError> {
//! let Some(mut request) = read_request(LineSource::new(stream)).await? else {
//!     return Ok(()); // closed before a new request
//! };
//!
//! println!("{}", request.head());
//! while let PayloadItem::Chunk(bytes) = request.body_mut().read().await? {
//!     println!("{} body bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use http::Method;
use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::body::{request_payload_size, Body, ChunkedMode};
use crate::codec::header::read_headers;
use crate::codec::LineSource;
use crate::ensure;
use crate::protocol::{HttpVersion, ParseError, Request, RequestHead};

/// A decoder for HTTP requests.
///
/// The decoder only carries options; every call works on the source it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDecoder {
    chunked_mode: ChunkedMode,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` handing out decoded chunked bodies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what chunked bodies yield, see [`ChunkedMode`].
    #[must_use]
    pub fn with_chunked_mode(mut self, mode: ChunkedMode) -> Self {
        self.chunked_mode = mode;
        self
    }

    /// Reads a request line and its header block.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))` if a complete head was read
    /// - `Ok(None)` if the stream ended cleanly before the request line
    /// - `Err(ParseError)` if the head is malformed or the stream failed
    pub async fn decode_head<R>(&self, source: &mut LineSource<R>) -> Result<Option<RequestHead>, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let Some(line) = source.read_line().await? else {
            return Ok(None);
        };

        let (method, target, version) = parse_request_line(&line)?;
        trace!(%method, %target, %version, "parsed request line");

        let headers = read_headers(source).await.map_err(|e| e.context("reading request headers failed"))?;
        Ok(Some(RequestHead { method, target, version, headers }))
    }

    /// Reads a complete request head and attaches the body reader.
    ///
    /// The returned request owns `source`; take it back with
    /// [`Body::into_source`] once the body has been read.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))` if a request was read
    /// - `Ok(None)` if the stream ended cleanly before the request line
    /// - `Err(ParseError)` if the head or its framing headers are malformed
    pub async fn decode<R>(&self, mut source: LineSource<R>) -> Result<Option<Request<R>>, ParseError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let Some(head) = self.decode_head(&mut source).await? else {
            return Ok(None);
        };

        let size = request_payload_size(&head.headers).map_err(|e| e.context("resolving request body length failed"))?;
        let body = Body::from_size(source, size, self.chunked_mode);
        Ok(Some(Request::from_parts(head, body)))
    }
}

/// Reads a request with a decoded chunked body, see [`RequestDecoder::decode`].
///
/// # Errors
///
/// Returns an error if the head or its framing headers are malformed, or if reading the stream fails.
pub async fn read_request<R>(source: LineSource<R>) -> Result<Option<Request<R>>, ParseError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    RequestDecoder::new().decode(source).await
}

/// Splits `METHOD SP TARGET SP HTTP-VERSION`.
fn parse_request_line(line: &Bytes) -> Result<(Method, String, HttpVersion), ParseError> {
    let mut parts = line.splitn(3, |b| *b == b' ');
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::MalformedRequestLine);
    };
    ensure!(!target.is_empty(), ParseError::MalformedRequestLine);

    let Ok(method) = Method::from_bytes(method) else {
        return Err(ParseError::MalformedRequestLine);
    };
    let Ok(target) = String::from_utf8(target.to_vec()) else {
        return Err(ParseError::MalformedRequestLine);
    };
    let version = HttpVersion::parse(version)?;

    Ok((method, target, version))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::protocol::PayloadItem;

    fn source(input: &'static str) -> LineSource<&'static [u8]> {
        LineSource::new(input.as_bytes())
    }

    #[tokio::test]
    async fn from_curl() {
        let input = indoc! {"
            GET /index.html HTTP/1.1\r
            Host: 127.0.0.1:8080\r
            User-Agent: curl/7.79.1\r
            Accept: */*\r
            \r
        "};

        let mut request = read_request(source(input)).await.unwrap().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.target(), "/index.html");
        assert_eq!(request.version(), HttpVersion::HTTP_11);
        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.headers().get("user-agent"), vec![Bytes::from_static(b"curl/7.79.1")]);

        assert!(request.body().is_empty());
        assert!(request.body_mut().read().await.unwrap().is_eof());
        assert_eq!(request.head().to_bytes(), Bytes::from_static(input.as_bytes()));
    }

    #[tokio::test]
    async fn content_length_body() {
        let input = indoc! {"
            POST /submit HTTP/1.1\r
            Content-Length: 5\r
            \r
            helloGET / HTTP/1.1\r
            \r
        "};

        let mut request = read_request(source(input)).await.unwrap().unwrap();
        assert!(request.body().is_fix_length());
        assert_eq!(request.body_mut().read().await.unwrap(), PayloadItem::Chunk(Bytes::from_static(b"hello")));
        assert!(request.body_mut().read().await.unwrap().is_eof());

        // the next request on the same stream
        let source = request.into_body().into_source().await.unwrap();
        let next = read_request(source).await.unwrap().unwrap();
        assert_eq!(next.target(), "/");
    }

    #[tokio::test]
    async fn chunked_body() {
        let input = "POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

        let mut request = read_request(source(input)).await.unwrap().unwrap();
        assert!(request.body().is_chunked());

        let mut body = Vec::new();
        while let PayloadItem::Chunk(bytes) = request.body_mut().read().await.unwrap() {
            body.extend_from_slice(&bytes);
        }
        assert_eq!(body, b"Wikipedia");
        assert!(request.body().trailers().unwrap().is_empty());
    }

    #[tokio::test]
    async fn raw_chunked_body() {
        let input = "POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3;x=y\r\nabc\r\n0\r\n\r\n";
        let decoder = RequestDecoder::new().with_chunked_mode(ChunkedMode::Raw);

        let mut request = decoder.decode(source(input)).await.unwrap().unwrap();
        let mut body = Vec::new();
        while let PayloadItem::Chunk(bytes) = request.body_mut().read().await.unwrap() {
            body.extend_from_slice(&bytes);
        }
        assert_eq!(body, b"3;x=y\r\nabc\r\n0\r\n");
    }

    #[tokio::test]
    async fn clean_end_of_stream_is_no_request() {
        assert!(read_request(source("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_request_lines() {
        for line in ["GET /\r\n\r\n", "GET\r\n\r\n", "GET  HTTP/1.1\r\n\r\n", "G(T / HTTP/1.1\r\n\r\n", "\r\n"] {
            let error = read_request(source(line)).await.unwrap_err();
            assert!(matches!(error, ParseError::MalformedRequestLine), "{line:?}");
        }

        let error = read_request(source("GET / HTTP/x\r\n\r\n")).await.unwrap_err();
        assert!(matches!(error, ParseError::MalformedVersion { .. }));
    }

    #[tokio::test]
    async fn unsupported_transfer_encoding() {
        let input = "POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n";
        let error = read_request(source(input)).await.unwrap_err();

        assert!(matches!(error.root_cause(), ParseError::UnsupportedTransferEncoding));
        assert_eq!(
            error.to_string(),
            "resolving request body length failed: unsupported transfer-encoding, last encoding is not chunked"
        );
    }

    #[tokio::test]
    async fn double_content_length() {
        let input = "POST / HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\nabcd";
        let error = read_request(source(input)).await.unwrap_err();

        assert!(matches!(error.root_cause(), ParseError::MultipleContentLength { count: 2 }));
    }

    #[tokio::test]
    async fn header_error_has_context() {
        let error = read_request(source("GET / HTTP/1.1\r\nbroken\r\n\r\n")).await.unwrap_err();

        assert!(matches!(error.root_cause(), ParseError::FieldDelimiterNotFound));
        assert!(error.to_string().starts_with("reading request headers failed"));
    }
}
