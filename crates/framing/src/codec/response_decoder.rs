//! HTTP response decoder.
//!
//! Unlike a request, a response cannot be framed from its head alone: the
//! request method matters too (a response to `HEAD` never has a body). The
//! head and the body are therefore decoded by two separate calls, and
//! [`ResponseDecoder::decode`] simply chains them.

use bytes::Bytes;
use http::{Method, StatusCode};
use tokio::io::{self, AsyncRead};
use tracing::trace;

use crate::codec::body::{response_payload_size, Body, ChunkedMode};
use crate::codec::header::read_headers;
use crate::codec::LineSource;
use crate::protocol::{HttpVersion, ParseError, Response, ResponseHead};

/// A decoder for HTTP responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder {
    chunked_mode: ChunkedMode,
}

impl ResponseDecoder {
    /// Creates a new `ResponseDecoder` handing out decoded chunked bodies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what chunked bodies yield, see [`ChunkedMode`].
    #[must_use]
    pub fn with_chunked_mode(mut self, mode: ChunkedMode) -> Self {
        self.chunked_mode = mode;
        self
    }

    /// Reads a status line and its header block, leaving the body on the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the head is malformed or the stream ends before it is complete.
    pub async fn decode_head<R>(&self, source: &mut LineSource<R>) -> Result<ResponseHead, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let Some(line) = source.read_line().await? else {
            return Err(ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended before the status line")));
        };

        let (version, status, reason) = parse_status_line(&line)?;
        trace!(%version, status = status.as_u16(), ?reason, "parsed status line");

        let headers = read_headers(source).await.map_err(|e| e.context("reading response headers failed"))?;
        Ok(ResponseHead { version, status, reason, headers })
    }

    /// Attaches the body reader matching `head` and the `method` of the request it answers.
    ///
    /// Pairs with [`read_response_head`] when the head has to be inspected before
    /// the body is framed.
    ///
    /// # Errors
    ///
    /// Returns an error if the framing headers of `head` are invalid.
    ///
    /// # Panics
    ///
    /// Panics if the body is chunked and this is called outside of a tokio runtime.
    pub fn decode_body<R>(&self, head: ResponseHead, source: LineSource<R>, method: &Method) -> Result<Response<R>, ParseError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let size = response_payload_size(method, head.status, &head.headers)
            .map_err(|e| e.context("resolving response body length failed"))?;
        let body = Body::from_size(source, size, self.chunked_mode);
        Ok(Response::from_parts(head, body))
    }

    /// Reads a complete response head and attaches the body reader.
    ///
    /// # Errors
    ///
    /// See [`decode_head`](Self::decode_head) and [`decode_body`](Self::decode_body).
    pub async fn decode<R>(&self, mut source: LineSource<R>, method: &Method) -> Result<Response<R>, ParseError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let head = self.decode_head(&mut source).await?;
        self.decode_body(head, source, method)
    }
}

/// Reads a status line and its headers, see [`ResponseDecoder::decode_head`].
///
/// # Errors
///
/// Returns an error if the head is malformed or the stream ends before it is complete.
pub async fn read_response_head<R>(source: &mut LineSource<R>) -> Result<ResponseHead, ParseError>
where
    R: AsyncRead + Unpin,
{
    ResponseDecoder::new().decode_head(source).await
}

/// Reads a response with a decoded chunked body, see [`ResponseDecoder::decode`].
///
/// # Errors
///
/// Returns an error if the head or its framing headers are malformed, or if reading the stream fails.
pub async fn read_response<R>(source: LineSource<R>, method: &Method) -> Result<Response<R>, ParseError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    ResponseDecoder::new().decode(source, method).await
}

/// Splits `HTTP-VERSION SP STATUS [SP REASON]`.
fn parse_status_line(line: &Bytes) -> Result<(HttpVersion, StatusCode, Option<String>), ParseError> {
    let mut parts = line.splitn(3, |b| *b == b' ');
    let (Some(version), Some(status)) = (parts.next(), parts.next()) else {
        return Err(ParseError::MalformedStatusLine);
    };
    let reason = parts.next().map(|reason| String::from_utf8_lossy(reason).into_owned());

    let version = HttpVersion::parse(version)?;
    let Ok(status) = StatusCode::from_bytes(status) else {
        return Err(ParseError::MalformedStatusLine);
    };

    Ok((version, status, reason))
}
