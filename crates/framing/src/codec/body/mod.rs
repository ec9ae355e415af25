//! Message body readers.
//!
//! A body is framed one of three ways, picked by the length rules in
//! [`request_payload_size`] and [`response_payload_size`]:
//!
//! - [`LengthReader`]: exactly `Content-Length` bytes
//! - [`ChunkedReader`]: chunked transfer coding, decoded in a background task
//! - [`ClosingReader`]: everything up to the end of the stream
//!
//! [`Body`] wraps whichever applies, or none for a message without body,
//! behind a single [`read`](Body::read) returning [`PayloadItem`](crate::protocol::PayloadItem)s.
//! [`ScratchBuffer`] is the staging area the chunked decoder copies blocks through.

mod body_length;
mod body_reader;
mod body_stream;
mod chunked_reader;
mod closing_reader;
mod length_reader;
mod scratch_buffer;

pub use body_length::{request_payload_size, response_payload_size};
pub use body_reader::Body;
pub use chunked_reader::{ChunkedMode, ChunkedReader};
pub use closing_reader::ClosingReader;
pub use length_reader::LengthReader;
pub use scratch_buffer::{Prepared, ScratchBuffer};
