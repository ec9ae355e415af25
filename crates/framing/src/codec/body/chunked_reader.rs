//! Reader for chunked transfer-coded bodies, as defined in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! Decoding runs in a task spawned on the current tokio runtime. The task owns
//! the [`LineSource`] and walks the body through
//!
//! ```text
//! chunk header -> chunk data -> ... -> last chunk -> trailers -> done
//! ```
//!
//! handing every block to the [`ChunkedReader`] through a channel of capacity
//! one, so it never runs more than one block ahead of the consumer. The
//! trailers travel through the same channel as the final event. Once they are
//! in, the task hands the stream back through its join handle.
//!
//! Dropping the reader cancels the task wherever it is waiting: on the stream
//! or on the consumer.

use std::cmp;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{self, AsyncRead};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::codec::body::scratch_buffer::{Prepared, ScratchBuffer};
use crate::codec::header::read_headers;
use crate::codec::LineSource;
use crate::ensure;
use crate::protocol::{Headers, ParseError, PayloadItem};

/// What the chunked reader hands out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkedMode {
    /// Only the chunk payload; the framing is consumed
    #[default]
    Decoded,
    /// The body exactly as framed on the wire: chunk header lines, chunk data
    /// with its CRLF, and the last-chunk line with its extensions. The
    /// trailers are still parsed into [`ChunkedReader::trailers`].
    Raw,
}

#[derive(Debug)]
enum Event {
    Data(Bytes),
    Trailers(Headers),
}

#[derive(Debug)]
enum State {
    Reading,
    Done,
    Failed(ParseError),
}

/// Consumer side of a chunked body.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    rx: mpsc::Receiver<Result<Event, ParseError>>,
    task: Option<JoinHandle<Option<LineSource<R>>>>,
    cancel: CancellationToken,
    trailers: Option<Headers>,
    state: State,
}

impl<R> ChunkedReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Starts decoding a chunked body from `source`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(source: LineSource<R>, mode: ChunkedMode) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let decoder = ChunkDecoder {
            scratch: ScratchBuffer::new(source.limits().scratch_capacity()),
            block_size: source.limits().body_block_size.max(1),
            max_header_size: source.limits().max_chunk_header_size,
            source,
            mode,
            tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(decoder.run());

        Self { rx, task: Some(task), cancel, trailers: None, state: State::Reading }
    }

    /// Returns the next block of the body.
    ///
    /// # Returns
    /// * `Ok(PayloadItem::Chunk(bytes))` for each block, in wire order
    /// * `Ok(PayloadItem::Eof)` once the trailers have been read, and forever after
    /// * `Err(ParseError)` on the first failure, and the same error on every later call
    pub async fn read(&mut self) -> Result<PayloadItem, ParseError> {
        match &self.state {
            State::Reading => {}
            State::Done => return Ok(PayloadItem::Eof),
            State::Failed(e) => return Err(e.clone()),
        }

        match self.rx.recv().await {
            Some(Ok(Event::Data(bytes))) => Ok(PayloadItem::Chunk(bytes)),
            Some(Ok(Event::Trailers(trailers))) => {
                trace!(fields = trailers.len(), "chunked body finished");
                self.trailers = Some(trailers);
                self.state = State::Done;
                Ok(PayloadItem::Eof)
            }
            Some(Err(e)) => {
                self.state = State::Failed(e.clone());
                Err(e)
            }
            None => {
                let e = ParseError::invalid_body("chunked decoder stopped before the last chunk");
                self.state = State::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Trailer fields that followed the last chunk, available once the body is done.
    pub fn trailers(&self) -> Option<&Headers> {
        self.trailers.as_ref()
    }

    /// Returns true once the last chunk and the trailers have been read.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Waits for the decoder task and takes the stream back.
    ///
    /// Returns `None` unless the body has been read to its end.
    pub async fn into_source(mut self) -> Option<LineSource<R>> {
        if !self.is_done() {
            return None;
        }

        let task = self.task.take()?;
        match task.await {
            Ok(source) => source,
            Err(e) => {
                error!(cause = %e, "chunked decoder task failed");
                None
            }
        }
    }
}

impl<R> Drop for ChunkedReader<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Why the decoder task stopped early.
#[derive(Debug)]
enum Stop {
    /// The reader went away
    Cancelled,
    Failed(ParseError),
}

impl From<ParseError> for Stop {
    fn from(e: ParseError) -> Self {
        Stop::Failed(e)
    }
}

impl Stop {
    fn context(self, context: &'static str) -> Self {
        match self {
            Stop::Failed(e) => Stop::Failed(e.context(context)),
            Stop::Cancelled => Stop::Cancelled,
        }
    }
}

/// Producer side, moved into the spawned task.
struct ChunkDecoder<R> {
    source: LineSource<R>,
    scratch: ScratchBuffer,
    mode: ChunkedMode,
    block_size: usize,
    max_header_size: usize,
    tx: mpsc::Sender<Result<Event, ParseError>>,
    cancel: CancellationToken,
}

impl<R> ChunkDecoder<R>
where
    R: AsyncRead + Unpin,
{
    async fn run(mut self) -> Option<LineSource<R>> {
        match self.decode().await {
            Ok(()) => Some(self.source),
            Err(Stop::Cancelled) => {
                debug!("chunked body reader dropped, decoder cancelled");
                None
            }
            Err(Stop::Failed(e)) => {
                warn!(cause = %e, "decoding chunked body failed");
                // the reader may be gone already, nothing left to report to
                let _ = self.emit(Err(e)).await;
                None
            }
        }
    }

    async fn decode(&mut self) -> Result<(), Stop> {
        loop {
            let (line, size) = self.read_chunk_header().await.map_err(|e| e.context("reading chunk header failed"))?;
            trace!(size, "read chunk header");

            if size == 0 {
                if self.mode == ChunkedMode::Raw {
                    self.emit_framing(with_crlf(&line)).await?;
                }
                break;
            }

            self.read_chunk_data(&line, size).await.map_err(|e| e.context("reading chunk data failed"))?;
        }

        let trailers =
            cancellable(&self.cancel, read_headers(&mut self.source)).await.map_err(|e| e.context("reading trailer failed"))?;
        self.emit(Ok(Event::Trailers(trailers))).await
    }

    async fn read_chunk_header(&mut self) -> Result<(Bytes, u64), Stop> {
        let Some(line) = cancellable(&self.cancel, self.source.read_line()).await? else {
            return Err(ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended before the last chunk")).into());
        };

        ensure!(line.len() + 2 <= self.max_header_size, ParseError::chunk_header_too_large(line.len() + 2, self.max_header_size).into());

        let size = parse_chunk_size(&line)?;
        Ok((line, size))
    }

    async fn read_chunk_data(&mut self, header: &[u8], size: u64) -> Result<(), Stop> {
        let mut remaining = size;

        if self.mode == ChunkedMode::Raw {
            let framing = with_crlf(header);
            if framing.len() <= self.block_size {
                // the header goes out in front of the first data block
                let Prepared { slice, detached } = self.scratch.prepare(framing.len());
                let Some(slice) = slice else {
                    return Err(ParseError::chunk_header_too_large(framing.len(), self.scratch.capacity()).into());
                };
                slice.copy_from_slice(&framing);
                self.scratch.consume(framing.len());
                if let Some(detached) = detached {
                    self.emit(Ok(Event::Data(detached))).await?;
                }
            } else {
                self.emit_framing(framing).await?;
            }

            // the CRLF closing the chunk data is relayed as well
            remaining = size.checked_add(2).ok_or_else(|| ParseError::invalid_chunk_size("chunk size overflows"))?;
        }

        while remaining > 0 {
            if self.scratch.committed() >= self.block_size {
                let block = self.scratch.detach();
                self.emit(Ok(Event::Data(block))).await?;
            }

            // a staged header shares the block with the data behind it
            let room = self.block_size - self.scratch.committed();
            // bounded by the block size, so it fits in usize
            let want = cmp::min(remaining, room as u64) as usize;

            let Prepared { slice, detached } = self.scratch.prepare(want);
            let Some(slice) = slice else {
                return Err(ParseError::invalid_body(format!("scratch buffer cannot hold a {want} bytes block")).into());
            };
            let n = cancellable(&self.cancel, self.source.read(slice)).await?;
            if n == 0 {
                return Err(ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended inside a chunk")).into());
            }
            self.scratch.consume(n);

            if let Some(detached) = detached {
                self.emit(Ok(Event::Data(detached))).await?;
            }
            let block = self.scratch.detach();
            trace!(len = block.len(), "read chunk data block");
            self.emit(Ok(Event::Data(block))).await?;

            remaining -= n as u64;
        }

        if self.mode == ChunkedMode::Decoded {
            let mut crlf = [0u8; 2];
            cancellable(&self.cancel, self.source.read_exact(&mut crlf)).await?;
        }

        Ok(())
    }

    /// Emits raw framing bytes in blocks of at most the block size.
    async fn emit_framing(&mut self, mut framing: Bytes) -> Result<(), Stop> {
        while !framing.is_empty() {
            let block = framing.split_to(cmp::min(framing.len(), self.block_size));
            self.emit(Ok(Event::Data(block))).await?;
        }
        Ok(())
    }

    /// Hands one event to the reader, waiting while the previous one is still pending.
    async fn emit(&mut self, event: Result<Event, ParseError>) -> Result<(), Stop> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Stop::Cancelled),
            sent = self.tx.send(event) => sent.or(Err(Stop::Cancelled)),
        }
    }
}

/// Runs `future` unless the reader is dropped first.
async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> Result<T, Stop>
where
    F: Future<Output = Result<T, ParseError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Stop::Cancelled),
        result = future => result.map_err(Stop::Failed),
    }
}

fn with_crlf(line: &[u8]) -> Bytes {
    let mut framed = BytesMut::with_capacity(line.len() + 2);
    framed.put_slice(line);
    framed.put_slice(b"\r\n");
    framed.freeze()
}

/// Parses the hex chunk size of a chunk header line, ignoring chunk extensions.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let digits = match line.iter().position(|b| *b == b';') {
        Some(index) => &line[..index],
        None => line,
    };
    let digits = digits.trim_ascii_end();

    ensure!(
        !digits.is_empty() && digits.iter().all(u8::is_ascii_hexdigit),
        ParseError::invalid_chunk_size(String::from_utf8_lossy(line))
    );

    // only ascii hex digits at this point
    let digits = String::from_utf8_lossy(digits);
    u64::from_str_radix(&digits, 16).map_err(ParseError::invalid_chunk_size)
}
