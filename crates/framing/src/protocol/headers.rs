//! Multi-value header store that keeps raw field lines for re-serialization.
//!
//! Field lines are stored exactly as read, one slot per line including
//! continuation lines, next to an index from the lowercased field name to the
//! slots holding its values:
//!
//! ```text
//!  lines                   index
//!  [0] Some("A: B")  <---- "a" => [ {line: 0, value: 2, continuations: 0},
//!  [1] None           |             {line: 2, value: 2, continuations: 0} ]
//!  [2] Some("A: C")  <-'
//!  [3] Some("D: E")  <---- "d" => [ {line: 3, value: 2, continuations: 1} ]
//!  [4] Some(" F")
//! ```
//!
//! Slot 1 above belonged to a deleted field. Deleting only blanks the slots so
//! the line numbers recorded in the index stay valid.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::protocol::ParseError;

/// Position of one field occurrence among the stored lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldIndex {
    /// Slot of the first line of the field
    line: usize,
    /// Offset of the value in the first line, right after the colon
    value: usize,
    /// Number of continuation lines following the first line
    continuations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Headers {
    lines: Vec<Option<Bytes>>,
    index: HashMap<Bytes, Vec<FieldIndex>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(lines: usize) -> Self {
        Self { lines: Vec::with_capacity(lines), index: HashMap::new() }
    }

    /// Returns the comma separated values of every field named `name`.
    ///
    /// The lookup ignores ASCII case. Each occurrence is folded with its
    /// continuation lines (leading whitespace dropped, joined by one space),
    /// split on commas, and every piece is reduced to visible field-value
    /// characters. Values come back in field order. An absent field yields an
    /// empty vector.
    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Vec<Bytes> {
        let Some(indices) = self.index.get(name.as_ref().to_ascii_lowercase().as_slice()) else {
            return Vec::new();
        };

        let mut values = Vec::with_capacity(indices.len());
        for index in indices {
            let folded = self.folded_value(index);
            values.extend(folded.split(|b| *b == b',').map(trim_as_field_value));
        }
        values
    }

    /// Replaces every field named `name` with a single `name: value` line.
    pub fn set<N: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, name: N, value: V) {
        let name = name.as_ref();
        let value = value.as_ref();
        self.del(name);

        let mut line = BytesMut::with_capacity(name.len() + 2 + value.len());
        line.put_slice(name);
        line.put_slice(b": ");
        line.put_slice(value);

        let index = FieldIndex { line: self.lines.len(), value: name.len() + 2, continuations: 0 };
        self.lines.push(Some(line.freeze()));
        self.index.entry(Bytes::from(name.to_ascii_lowercase())).or_default().push(index);
    }

    /// Removes every field named `name`, leaving tombstones in its line slots.
    pub fn del<N: AsRef<[u8]>>(&mut self, name: N) {
        let Some(indices) = self.index.remove(name.as_ref().to_ascii_lowercase().as_slice()) else {
            return;
        };

        for index in indices {
            for slot in &mut self.lines[index.line..=index.line + index.continuations] {
                *slot = None;
            }
        }
    }

    pub fn contains<N: AsRef<[u8]>>(&self, name: N) -> bool {
        self.index.contains_key(name.as_ref().to_ascii_lowercase().as_slice())
    }

    /// Raw field lines in their original order, continuation lines included, tombstones skipped.
    pub fn list(&self) -> impl Iterator<Item = &Bytes> {
        self.lines.iter().flatten()
    }

    /// Number of fields, not counting continuation lines.
    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fields in line order as `(lowercased name, folded raw value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, Bytes)> {
        let mut fields: Vec<(&Bytes, &FieldIndex)> =
            self.index.iter().flat_map(|(name, indices)| indices.iter().map(move |index| (name, index))).collect();
        fields.sort_unstable_by_key(|(_, index)| index.line);

        fields.into_iter().map(move |(name, index)| (name, self.folded_value(index)))
    }

    /// Writes every surviving line followed by CRLF.
    pub fn encode(&self, dst: &mut BytesMut) {
        for line in self.list() {
            dst.put_slice(line);
            dst.put_slice(b"\r\n");
        }
    }

    /// Converts into an [`http::HeaderMap`], trimming surrounding whitespace of each value.
    pub fn to_header_map(&self) -> Result<HeaderMap, ParseError> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (name, value) in self.iter() {
            let header_name = HeaderName::from_bytes(name).map_err(ParseError::invalid_header)?;
            let header_value = HeaderValue::from_bytes(value.trim_ascii()).map_err(ParseError::invalid_header)?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }

    /// Appends a new field line whose lowercased name is `name` and whose value starts at `value`.
    pub(crate) fn push_field(&mut self, line: Bytes, name: Bytes, value: usize) {
        let index = FieldIndex { line: self.lines.len(), value, continuations: 0 };
        self.lines.push(Some(line));
        self.index.entry(name).or_default().push(index);
    }

    /// Appends a continuation line to the most recently pushed field.
    ///
    /// # Panics
    ///
    /// Panics if no field has been pushed yet. Header parsing only calls this
    /// after a field line, so reaching the panic is a logic defect.
    pub(crate) fn push_continuation(&mut self, line: Bytes) {
        let last = self.lines.len().checked_sub(1);
        let previous = self
            .index
            .values_mut()
            .flat_map(|indices| indices.last_mut())
            .find(|index| Some(index.line + index.continuations) == last)
            .expect("continuation line without a preceding field");

        previous.continuations += 1;
        self.lines.push(Some(line));
    }

    fn folded_value(&self, index: &FieldIndex) -> Bytes {
        let first = self.line(index.line);
        if index.continuations == 0 {
            return first.slice(index.value.min(first.len())..);
        }

        let mut folded = BytesMut::from(&first[index.value.min(first.len())..]);
        for slot in index.line + 1..=index.line + index.continuations {
            folded.put_u8(b' ');
            folded.put_slice(trim_leading_whitespace(&self.line(slot)));
        }
        folded.freeze()
    }

    fn line(&self, slot: usize) -> Bytes {
        self.lines.get(slot).cloned().flatten().unwrap_or_default()
    }
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != b' ' && *b != b'\t').unwrap_or(bytes.len());
    &bytes[start..]
}

/// Keeps only the bytes allowed in a field value token: `!` and `#` through `~`.
fn trim_as_field_value(bytes: &[u8]) -> Bytes {
    bytes.iter().copied().filter(|b| *b == 0x21 || (0x23..=0x7e).contains(b)).collect::<Vec<u8>>().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(lines: &[&'static str]) -> Headers {
        let mut headers = Headers::new();
        for line in lines {
            let line = Bytes::from_static(line.as_bytes());
            if line.starts_with(b" ") || line.starts_with(b"\t") {
                headers.push_continuation(line);
            } else {
                let colon = line.iter().position(|b| *b == b':').unwrap();
                let name = Bytes::from(line[..colon].to_ascii_lowercase());
                headers.push_field(line, name, colon + 1);
            }
        }
        headers
    }

    #[test]
    fn get_is_case_insensitive() {
        let headers = headers(&["X-Cache: HIT", "Content-Length: 1270"]);

        let expected = vec![Bytes::from_static(b"HIT")];
        assert_eq!(headers.get("X-Cache"), expected);
        assert_eq!(headers.get("x-cache"), expected);
        assert_eq!(headers.get("X-CACHE"), expected);
        assert!(headers.get("x-missing").is_empty());
    }

    #[test]
    fn get_splits_and_trims_values() {
        let headers = headers(&["Transfer-Encoding: gzip, chunked", "Etag: \"359670651\""]);

        assert_eq!(headers.get("transfer-encoding"), vec![Bytes::from_static(b"gzip"), Bytes::from_static(b"chunked")]);
        // the double quote is outside the accepted character set
        assert_eq!(headers.get("etag"), vec![Bytes::from_static(b"359670651")]);
    }

    #[test]
    fn repeated_fields_keep_their_values_apart() {
        let headers = headers(&["Content-Length: 10", "Host: a", "content-length: 20"]);

        assert_eq!(headers.get("Content-Length"), vec![Bytes::from_static(b"10"), Bytes::from_static(b"20")]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn continuation_lines_are_folded() {
        let headers = headers(&["X-Folded: first,", " second", "\tthird", "Host: a"]);

        assert_eq!(
            headers.get("x-folded"),
            vec![Bytes::from_static(b"first"), Bytes::from_static(b"secondthird")]
        );
        let (name, value) = headers.iter().next().unwrap();
        assert_eq!(name, &Bytes::from_static(b"x-folded"));
        assert_eq!(value, Bytes::from_static(b" first, second third"));
        assert_eq!(headers.get("host"), vec![Bytes::from_static(b"a")]);
    }

    #[test]
    fn set_replaces_existing_fields() {
        let mut headers = headers(&["Accept: a", "Accept: b", "Host: h"]);
        headers.set("ACCEPT", "text/html");

        assert_eq!(headers.get("accept"), vec![Bytes::from_static(b"text/html")]);
        let lines: Vec<&Bytes> = headers.list().collect();
        assert_eq!(lines, vec![&Bytes::from_static(b"Host: h"), &Bytes::from_static(b"ACCEPT: text/html")]);
    }

    #[test]
    fn del_leaves_tombstones_and_keeps_order() {
        let mut headers = headers(&["A: B", "D: E", " F", "A: C", "G: H"]);
        headers.del("d");

        assert!(!headers.contains("D"));
        assert!(headers.get("d").is_empty());
        let lines: Vec<&Bytes> = headers.list().collect();
        assert_eq!(lines, vec![&Bytes::from_static(b"A: B"), &Bytes::from_static(b"A: C"), &Bytes::from_static(b"G: H")]);

        // indices recorded before the delete still resolve
        assert_eq!(headers.get("a"), vec![Bytes::from_static(b"B"), Bytes::from_static(b"C")]);
        assert_eq!(headers.get("g"), vec![Bytes::from_static(b"H")]);

        headers.del("not-there");
        assert_eq!(headers.list().count(), 3);
    }

    #[test]
    #[should_panic(expected = "continuation line without a preceding field")]
    fn continuation_without_field_panics() {
        headers(&[" orphan"]);
    }

    #[test]
    fn encode_writes_surviving_lines() {
        let mut headers = headers(&["Host: a", "X-Drop: 1", "Accept: */*"]);
        headers.del("x-drop");

        let mut dst = BytesMut::new();
        headers.encode(&mut dst);
        assert_eq!(&dst[..], b"Host: a\r\nAccept: */*\r\n");
    }

    #[test]
    fn converts_to_header_map() {
        let headers = headers(&["Host: example.com", "Accept: text/html, */*", "accept: image/png"]);
        let map = headers.to_header_map().unwrap();

        assert_eq!(map.get(http::header::HOST).unwrap(), "example.com");
        let accept: Vec<&HeaderValue> = map.get_all(http::header::ACCEPT).iter().collect();
        assert_eq!(accept, vec!["text/html, */*", "image/png"]);
    }
}
