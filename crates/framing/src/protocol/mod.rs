//! Protocol types shared by the parsers and body readers.
//!
//! - **Messages** (`request`, `response`): parsed heads that re-serialize
//!   exactly, and messages pairing a head with its body reader
//!   - [`RequestHead`] / [`Request`]
//!   - [`ResponseHead`] / [`Response`]
//!
//! - **Header fields** (`headers`): [`Headers`], a multi-value store that
//!   keeps the raw field lines next to a case-insensitive index
//!
//! - **Body items** (`message`): [`PayloadItem`] yielded by body readers and
//!   [`PayloadSize`], the outcome of the body length rules
//!
//! - **Versions** (`version`): [`HttpVersion`] as found in start lines
//!
//! - **Errors** (`error`): [`ParseError`], every recoverable framing failure

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod headers;
pub use headers::Headers;

mod version;
pub use version::HttpVersion;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::Response;
pub use response::ResponseHead;

mod error;
pub use error::ParseError;
