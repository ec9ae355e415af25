//! Header block parsing, shared by message heads and chunked trailers.

mod header_decoder;

pub use header_decoder::read_headers;
