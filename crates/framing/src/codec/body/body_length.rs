//! Message body length rules from
//! [RFC 7230 Section 3.3.3](https://tools.ietf.org/html/rfc7230#section-3.3.3).
//!
//! Each function looks at a parsed head and tells which reader frames the
//! body that follows it.

use bytes::Bytes;
use http::{Method, StatusCode};
use tracing::debug;

use crate::ensure;
use crate::protocol::{Headers, ParseError, PayloadSize};

/// Decides how the body of a request is delimited.
///
/// # Returns
///
/// - `PayloadSize::Chunked` if `Transfer-Encoding` is present and its last coding is `chunked`
/// - `PayloadSize::Length(n)` if `Content-Length` is present
/// - `PayloadSize::Empty` otherwise
///
/// # Errors
///
/// - [`ParseError::UnsupportedTransferEncoding`] if the last coding is anything but `chunked`
/// - [`ParseError::MultipleContentLength`] or [`ParseError::InvalidContentLength`]
///   for a `Content-Length` that is not a single decimal number
pub fn request_payload_size(headers: &Headers) -> Result<PayloadSize, ParseError> {
    let size = if headers.contains(http::header::TRANSFER_ENCODING) {
        ensure!(is_chunked(&headers.get(http::header::TRANSFER_ENCODING)), ParseError::UnsupportedTransferEncoding);
        PayloadSize::Chunked
    } else if headers.contains(http::header::CONTENT_LENGTH) {
        PayloadSize::Length(parse_content_length(&headers.get(http::header::CONTENT_LENGTH))?)
    } else {
        PayloadSize::Empty
    };

    debug!(?size, "resolved request body length");
    Ok(size)
}

/// Decides how the body of a response to a `method` request is delimited.
///
/// Responses to `HEAD`, informational responses, `204 No Content` and
/// `304 Not Modified` carry no body. A successful `CONNECT` turns the
/// connection into a tunnel, read until it closes. Otherwise the rules match
/// [`request_payload_size`], except that an unknown transfer coding and a
/// missing length both mean the body runs until the connection closes.
pub fn response_payload_size(method: &Method, status: StatusCode, headers: &Headers) -> Result<PayloadSize, ParseError> {
    let size = if method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
    {
        PayloadSize::Empty
    } else if method == Method::CONNECT && status == StatusCode::OK {
        PayloadSize::UntilClose
    } else if headers.contains(http::header::TRANSFER_ENCODING) {
        if is_chunked(&headers.get(http::header::TRANSFER_ENCODING)) { PayloadSize::Chunked } else { PayloadSize::UntilClose }
    } else if headers.contains(http::header::CONTENT_LENGTH) {
        PayloadSize::Length(parse_content_length(&headers.get(http::header::CONTENT_LENGTH))?)
    } else {
        PayloadSize::UntilClose
    };

    debug!(%method, status = status.as_u16(), ?size, "resolved response body length");
    Ok(size)
}

/// The last transfer coding decides; the comparison is case-sensitive.
fn is_chunked(codings: &[Bytes]) -> bool {
    codings.last().is_some_and(|coding| coding.as_ref() == b"chunked")
}

fn parse_content_length(values: &[Bytes]) -> Result<u64, ParseError> {
    ensure!(values.len() == 1, ParseError::MultipleContentLength { count: values.len() });

    let value = &values[0];
    ensure!(
        !value.is_empty() && value.iter().all(u8::is_ascii_digit),
        ParseError::invalid_content_length(String::from_utf8_lossy(value))
    );

    String::from_utf8_lossy(value).parse().map_err(ParseError::invalid_content_length)
}
