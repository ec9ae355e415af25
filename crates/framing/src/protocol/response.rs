//! HTTP response types.
//!
//! A response head can be read on its own: how its body is delimited depends
//! on the request it answers, so the body is attached in a second step by
//! [`ResponseDecoder::decode_body`](crate::codec::ResponseDecoder::decode_body).

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use http::StatusCode;

use crate::codec::body::Body;
use crate::protocol::{Headers, HttpVersion};

/// The status line and header fields of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: HttpVersion,
    pub status: StatusCode,
    /// The reason phrase as sent; `None` when the status line ends right
    /// after the status code, `Some("")` when a space follows it
    pub reason: Option<String>,
    pub headers: Headers,
}

impl ResponseHead {
    /// Creates a head using the canonical reason phrase of `status`, if it has one.
    pub fn new(version: HttpVersion, status: StatusCode) -> Self {
        let reason = Some(status.canonical_reason().unwrap_or_default().to_owned());
        Self { version, status, reason, headers: Headers::new() }
    }

    /// Writes the status line, every surviving header line and the closing empty line.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_slice(self.version.to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status.as_str().as_bytes());
        if let Some(reason) = &self.reason {
            dst.put_u8(b' ');
            dst.put_slice(reason.as_bytes());
        }
        dst.put_slice(b"\r\n");
        self.headers.encode(dst);
        dst.put_slice(b"\r\n");
    }

    /// The serialized head, see [`encode`](Self::encode).
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(256);
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Renders the status line and header lines, each followed by CRLF.
impl fmt::Display for ResponseHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.version, self.status.as_str())?;
        if let Some(reason) = &self.reason {
            write!(f, " {reason}")?;
        }
        f.write_str("\r\n")?;
        for line in self.headers.list() {
            write!(f, "{}\r\n", String::from_utf8_lossy(line))?;
        }
        Ok(())
    }
}

/// A parsed response with its body still on the stream.
#[derive(Debug)]
pub struct Response<R> {
    head: ResponseHead,
    body: Body<R>,
}

impl<R> Response<R> {
    pub fn from_parts(head: ResponseHead, body: Body<R>) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut ResponseHead {
        &mut self.head
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// The reason phrase, empty when none was sent.
    pub fn reason(&self) -> &str {
        self.head.reason.as_deref().unwrap_or_default()
    }

    pub fn version(&self) -> HttpVersion {
        self.head.version
    }

    pub fn headers(&self) -> &Headers {
        &self.head.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.head.headers
    }

    pub fn body(&self) -> &Body<R> {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body<R> {
        &mut self.body
    }

    pub fn into_body(self) -> Body<R> {
        self.body
    }

    pub fn into_parts(self) -> (ResponseHead, Body<R>) {
        (self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_reason() {
        assert_eq!(ResponseHead::new(HttpVersion::HTTP_11, StatusCode::NOT_FOUND).reason.as_deref(), Some("Not Found"));
        assert_eq!(ResponseHead::new(HttpVersion::HTTP_11, StatusCode::from_u16(599).unwrap()).reason.as_deref(), Some(""));
    }

    #[test]
    fn encode_head() {
        let mut head = ResponseHead::new(HttpVersion::HTTP_11, StatusCode::OK);
        head.headers.set("Content-Length", "5");

        assert_eq!(head.to_bytes(), Bytes::from_static(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n"));
        assert_eq!(head.to_string(), "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n");
    }

    #[test]
    fn encode_keeps_custom_reason() {
        let mut head = ResponseHead::new(HttpVersion::HTTP_10, StatusCode::OK);
        head.reason = Some("Fine".to_owned());

        assert_eq!(head.to_bytes(), Bytes::from_static(b"HTTP/1.0 200 Fine\r\n\r\n"));
    }

    #[test]
    fn encode_without_reason_separator() {
        let mut head = ResponseHead::new(HttpVersion::HTTP_11, StatusCode::NO_CONTENT);
        head.reason = None;

        assert_eq!(head.to_bytes(), Bytes::from_static(b"HTTP/1.1 204\r\n\r\n"));
        assert_eq!(head.to_string(), "HTTP/1.1 204\r\n");
    }
}
