//! Adapters from [`Body`] to the `futures` and `http-body` ecosystems.

use bytes::Bytes;
use futures::Stream;
use futures::stream;
use http_body::Frame;
use http_body_util::StreamBody;
use tokio::io::AsyncRead;

use crate::codec::body::Body;
use crate::protocol::{ParseError, PayloadItem};

impl<R> Body<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Turns the body into a stream of blocks.
    ///
    /// The stream ends after the last block, or right after yielding an error.
    /// Chunked trailers are dropped; use [`into_http_body`](Self::into_http_body) to keep them.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, ParseError>> {
        stream::unfold(Some(self), |state| async move {
            let mut body = state?;
            match body.read().await {
                Ok(PayloadItem::Chunk(bytes)) => Some((Ok(bytes), Some(body))),
                Ok(PayloadItem::Eof) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Turns the body into an [`http_body::Body`].
    ///
    /// Blocks become data frames. Non-empty chunked trailers become the final
    /// trailers frame.
    pub fn into_http_body(self) -> StreamBody<impl Stream<Item = Result<Frame<Bytes>, ParseError>>> {
        let frames = stream::unfold(Some(self), |state| async move {
            let mut body = state?;
            match body.read().await {
                Ok(PayloadItem::Chunk(bytes)) => Some((Ok(Frame::data(bytes)), Some(body))),
                Ok(PayloadItem::Eof) => {
                    let trailers = body.trailers().filter(|trailers| !trailers.is_empty())?;
                    let frame = trailers.to_header_map().map(Frame::trailers);
                    Some((frame, None))
                }
                Err(e) => Some((Err(e), None)),
            }
        });

        StreamBody::new(frames)
    }
}
