//! HTTP request types.
//!
//! [`RequestHead`] is the parsed request line plus headers; it can be written
//! back to the wire unchanged with [`RequestHead::encode`]. [`Request`] pairs
//! a head with the [`Body`] reader positioned right after it.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use http::Method;

use crate::codec::body::Body;
use crate::protocol::{Headers, HttpVersion};

/// The request line and header fields of a request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// The request target exactly as sent, usually origin-form (`/path?query`)
    pub target: String,
    pub version: HttpVersion,
    pub headers: Headers,
}

impl RequestHead {
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion) -> Self {
        Self { method, target: target.into(), version, headers: Headers::new() }
    }

    /// Writes the request line, every surviving header line and the closing empty line.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_slice(self.method.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.target.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.version.to_string().as_bytes());
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

/// Renders the request line and header lines, each followed by CRLF.
impl fmt::Display for RequestHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.target, self.version)?;
        for line in self.headers.list() {
            write!(f, "{}\r\n", String::from_utf8_lossy(line))?;
        }
        Ok(())
    }
}

/// A parsed request with its body still on the stream.
#[derive(Debug)]
pub struct Request<R> {
    head: RequestHead,
    body: Body<R>,
}

impl<R> Request<R> {
    pub fn from_parts(head: RequestHead, body: Body<R>) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut RequestHead {
        &mut self.head
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn target(&self) -> &str {
        &self.head.target
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

    pub fn into_parts(self) -> (RequestHead, Body<R>) {
        (self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn head() -> RequestHead {
        let mut head = RequestHead::new(Method::GET, "/index.html?q=1", HttpVersion::HTTP_11);
        head.headers.set("Host", "127.0.0.1:8080");
        head.headers.set("Accept", "*/*");
        head
    }

    #[test]
    fn encode_head() {
        let expected = indoc! {"
            GET /index.html?q=1 HTTP/1.1\r
            Host: 127.0.0.1:8080\r
            Accept: */*\r
            \r
        "};
        assert_eq!(head().to_bytes(), Bytes::from_static(expected.as_bytes()));
    }

    #[test]
    fn encode_skips_deleted_fields() {
        let mut head = head();
        head.headers.del("host");

        assert_eq!(head.to_bytes(), Bytes::from_static(b"GET /index.html?q=1 HTTP/1.1\r\nAccept: */*\r\n\r\n"));
    }

    #[test]
    fn display_dump() {
        assert_eq!(head().to_string(), "GET /index.html?q=1 HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nAccept: */*\r\n");
    }
}
