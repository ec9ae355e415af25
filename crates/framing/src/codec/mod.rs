//! Streaming HTTP/1.x message framing.
//!
//! Everything reads from a [`LineSource`], a buffered line reader over any
//! `tokio::io::AsyncRead`:
//!
//! - Request handling:
//!   - [`read_request`] / [`RequestDecoder`]: request line, headers and body reader
//! - Response handling:
//!   - [`read_response_head`]: status line and headers only
//!   - [`read_response`] / [`ResponseDecoder`]: the same plus the body reader,
//!     which depends on the request method
//! - Header parsing via [`read_headers`], shared with chunked trailers
//! - Body reading via the [`body`] module
//!
//! A parsed message owns the source through its body. Once the body has been
//! read to its end, [`Body::into_source`](body::Body::into_source) hands the
//! source back for the next message on the stream.
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use micro_framing::codec::{read_response, LineSource};
//! use micro_framing::protocol::PayloadItem;
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("127.0.0.1:8080").await?;
//! let (reader, _writer) = stream.into_split();
//! // ... write the request with the writer half ...
//! let mut response = read_response(LineSource::new(reader), &Method::GET).await?;
//! while let PayloadItem::Chunk(bytes) = response.body_mut().read().await? {
//!     println!("{}", String::from_utf8_lossy(&bytes));
//! }
//! # Ok(())
//! # }
//! ```

pub mod body;
mod header;
mod line_source;
mod request_decoder;
mod response_decoder;

pub use header::read_headers;
pub use line_source::LineSource;
pub use request_decoder::{read_request, RequestDecoder};
pub use response_decoder::{read_response, read_response_head, ResponseDecoder};
