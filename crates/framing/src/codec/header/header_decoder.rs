//! Header block parser.
//!
//! Reads field lines from a [`LineSource`] up to the empty line closing the
//! block and records them in a [`Headers`] store:
//!
//! - a line starting with space or tab continues the previous field
//! - any other line is a new field whose name ends at the first `:`
//! - the name is indexed lowercased; the value is kept raw and only trimmed on lookup
//!
//! The same parser serves message heads and chunked trailers.

use bytes::Bytes;
use tokio::io::{self, AsyncRead};
use tracing::trace;

use crate::codec::LineSource;
use crate::protocol::{Headers, ParseError};

/// Reads header fields up to and including the terminating empty line.
///
/// # Returns
///
/// The parsed headers, empty when the block holds no field at all.
///
/// # Errors
///
/// - [`ParseError::EndOfHeadersNotFound`] when no empty line shows up within
///   [`Limits::max_header_lines`](crate::config::Limits::max_header_lines) lines
/// - [`ParseError::FieldDelimiterNotFound`] for a field line without a colon
/// - an `UnexpectedEof` io error when the stream ends inside the block
/// - any error raised by [`LineSource::read_line`]
///
/// No partially parsed headers are returned on failure.
pub async fn read_headers<R>(source: &mut LineSource<R>) -> Result<Headers, ParseError>
where
    R: AsyncRead + Unpin,
{
    let max_lines = source.limits().max_header_lines;
    let mut headers = Headers::with_capacity(16);

    for _ in 0..max_lines {
        let Some(line) = source.read_line().await? else {
            return Err(ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended inside a header block")));
        };

        if line.is_empty() {
            trace!(fields = headers.len(), "parsed header block");
            return Ok(headers);
        }

        if line[0] == b' ' || line[0] == b'\t' {
            headers.push_continuation(line);
            continue;
        }

        push_field(&mut headers, line).map_err(|e| e.context("parsing header field failed"))?;
    }

    Err(ParseError::end_of_headers_not_found(max_lines))
}

fn push_field(headers: &mut Headers, line: Bytes) -> Result<(), ParseError> {
    let Some(colon) = line.iter().position(|b| *b == b':') else {
        return Err(ParseError::FieldDelimiterNotFound);
    };

    let name = Bytes::from(line[..colon].to_ascii_lowercase());
    headers.push_field(line, name, colon + 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::config::Limits;

    async fn parse(input: &'static str) -> Result<Headers, ParseError> {
        let mut source = LineSource::new(input.as_bytes());
        read_headers(&mut source).await
    }

    #[tokio::test]
    async fn parses_fields_until_empty_line() {
        let input = indoc! {"
            Host: example.com\r
            Accept-Encoding: gzip, br\r
            \r
            body"};
        let mut source = LineSource::new(input.as_bytes());
        let headers = read_headers(&mut source).await.unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("host"), vec![Bytes::from_static(b"example.com")]);
        assert_eq!(headers.get("accept-encoding"), vec![Bytes::from_static(b"gzip"), Bytes::from_static(b"br")]);

        // the body stays in the source
        let mut rest = [0u8; 8];
        let n = source.read(&mut rest).await.unwrap();
        assert_eq!(&rest[..n], b"body");
    }

    #[tokio::test]
    async fn keeps_raw_lines_in_order() {
        let headers = parse("B: 2\r\nA:1\r\nB:  3\r\n\r\n").await.unwrap();
        let lines: Vec<&Bytes> = headers.list().collect();

        assert_eq!(lines, vec![&Bytes::from_static(b"B: 2"), &Bytes::from_static(b"A:1"), &Bytes::from_static(b"B:  3")]);
    }

    #[tokio::test]
    async fn folds_continuation_lines() {
        let input = indoc! {"
            X-Long: first\r
               second\r
            \tthird\r
            Host: a\r
            \r
        "};
        let headers = parse(input).await.unwrap();

        let (_, folded) = headers.iter().next().unwrap();
        assert_eq!(folded, Bytes::from_static(b" first second third"));
        assert_eq!(headers.get("x-long"), vec![Bytes::from_static(b"firstsecondthird")]);
        assert_eq!(headers.list().count(), 4);
    }

    #[tokio::test]
    async fn empty_block_is_empty_headers() {
        let headers = parse("\r\n").await.unwrap();
        assert!(headers.is_empty());
        assert_eq!(headers.list().count(), 0);
    }

    #[tokio::test]
    async fn missing_colon_is_rejected() {
        let error = parse("Host example.com\r\n\r\n").await.unwrap_err();
        assert!(matches!(error.root_cause(), ParseError::FieldDelimiterNotFound));
    }

    #[tokio::test]
    async fn end_of_stream_inside_block() {
        let error = parse("Host: a\r\n").await.unwrap_err();
        assert!(error.is_unexpected_eof());
    }

    #[tokio::test]
    async fn too_many_lines() {
        let limits = Limits::default().with_max_header_lines(2);
        let mut source = LineSource::with_limits(&b"A: 1\r\nB: 2\r\n\r\n"[..], limits);

        let error = read_headers(&mut source).await.unwrap_err();
        assert!(matches!(error, ParseError::EndOfHeadersNotFound { max_lines: 2 }));
    }

    #[tokio::test]
    #[should_panic(expected = "continuation line without a preceding field")]
    async fn leading_continuation_line_panics() {
        let _ = parse(" orphan\r\n\r\n").await;
    }
}
