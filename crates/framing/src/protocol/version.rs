use std::fmt;

use http::Version;

use crate::protocol::ParseError;

/// The `HTTP/MAJOR.MINOR` version found in a start line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parses `HTTP/MAJOR.MINOR`, each number being one or more decimal digits.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let malformed = || ParseError::malformed_version(String::from_utf8_lossy(bytes));

        let numbers = bytes.strip_prefix(b"HTTP/").ok_or_else(malformed)?;
        let dot = numbers.iter().position(|b| *b == b'.').ok_or_else(malformed)?;
        let major = parse_number(&numbers[..dot]).ok_or_else(malformed)?;
        let minor = parse_number(&numbers[dot + 1..]).ok_or_else(malformed)?;

        Ok(Self { major, minor })
    }
}

fn parse_number(digits: &[u8]) -> Option<u8> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

impl From<Version> for HttpVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::HTTP_09 => HttpVersion::new(0, 9),
            Version::HTTP_10 => HttpVersion::HTTP_10,
            Version::HTTP_2 => HttpVersion::new(2, 0),
            Version::HTTP_3 => HttpVersion::new(3, 0),
            _ => HttpVersion::HTTP_11,
        }
    }
}

impl TryFrom<HttpVersion> for Version {
    type Error = ParseError;

    fn try_from(version: HttpVersion) -> Result<Self, Self::Error> {
        match (version.major, version.minor) {
            (0, 9) => Ok(Version::HTTP_09),
            (1, 0) => Ok(Version::HTTP_10),
            (1, 1) => Ok(Version::HTTP_11),
            (2, 0) => Ok(Version::HTTP_2),
            (3, 0) => Ok(Version::HTTP_3),
            _ => Err(ParseError::malformed_version(version)),
        }
    }
}
