//! An asynchronous HTTP/1.x message framing library
//!
//! This crate turns a byte stream into structured request and response heads
//! followed by a correctly delimited body. It is meant to sit under proxies,
//! servers and clients: it owns no socket, runs no accept loop and makes no
//! keep-alive decisions.
//!
//! # Features
//!
//! - Line-oriented reading with bounded re-assembly of long lines
//! - A header store that keeps every raw field line for exact re-serialization,
//!   with case-insensitive multi-value lookup
//! - Body length rules for requests and responses (RFC 7230 section 3.3.3)
//! - Content-Length, chunked and read-until-close bodies behind one `read()`
//! - Chunked bodies decoded in a background task, either to the payload or
//!   verbatim for relaying
//! - Bodies as `futures::Stream` or `http_body::Body`
//!
//! # Example
//!
//! A tiny relay reading requests from a client connection and writing each
//! request head back out untouched:
//!
//! ```no_run
//! use micro_framing::codec::{read_request, LineSource};
//! use micro_framing::protocol::PayloadItem;
//! use tokio::io::AsyncWriteExt;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let (client, _) = listener.accept().await?;
//!     let (reader, mut writer) = client.into_split();
//!
//!     let mut source = LineSource::new(reader);
//!     loop {
//!         let mut request = match read_request(source).await {
//!             Ok(Some(request)) => request,
//!             Ok(None) => break,
//!             Err(e) => {
//!                 error!(cause = %e, "reading request failed");
//!                 break;
//!             }
//!         };
//!         info!(method = %request.method(), target = request.target(), "received request");
//!
//!         writer.write_all(&request.head().to_bytes()).await?;
//!         while let PayloadItem::Chunk(bytes) = request.body_mut().read().await? {
//!             writer.write_all(&bytes).await?;
//!         }
//!
//!         match request.into_body().into_source().await {
//!             Some(next) => source = next,
//!             None => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - [`codec`]: the line source, header parsing, request/response decoding and body readers
//! - [`protocol`]: heads, messages, the header store, versions and errors
//! - [`config`]: framing limits
//!
//! Data flows one way: the [`codec::LineSource`] feeds the header parser and
//! the body readers, which feed the request and response decoders.
//!
//! # Error Handling
//!
//! Every recoverable failure is a [`protocol::ParseError`]. Decoders add
//! context to the errors of the steps they run, and
//! [`ParseError::root_cause`](protocol::ParseError::root_cause) walks back to
//! the original one. Any error ends the message being read; the caller is
//! expected to close the connection.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - Field names and tokens are not validated against the full RFC 7230 grammar
//! - Request targets are not parsed as URLs

pub mod codec;
pub mod config;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
