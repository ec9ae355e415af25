//! Framing limits shared by the line source, header parser and body readers.
//!
//! A [`Limits`] value is attached to a [`LineSource`](crate::codec::LineSource)
//! when it is created and every parser or body reader built on top of that
//! source reads its bounds from there.

/// Default capacity of the line source read buffer.
pub const DEFAULT_LINE_BUFFER_SIZE: usize = 4 * 1024;

/// Default number of extra reads allowed to finish a line that overflowed the buffer.
pub const DEFAULT_MAX_LINE_CONTINUATIONS: usize = 10;

/// Default number of lines allowed in one header block.
pub const DEFAULT_MAX_HEADER_LINES: usize = 200;

/// Default maximum size of a chunk header line, CRLF included.
pub const DEFAULT_MAX_CHUNK_HEADER_SIZE: usize = 512;

/// Default size of a body block handed to the caller.
pub const DEFAULT_BODY_BLOCK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Capacity of the buffered reader wrapped by the line source
    pub line_buffer_size: usize,
    /// Extra reads allowed for a line longer than `line_buffer_size`
    pub max_line_continuations: usize,
    /// Lines read before giving up on finding the end of a header block
    pub max_header_lines: usize,
    /// Longest accepted chunk header line, CRLF included
    pub max_chunk_header_size: usize,
    /// Upper bound of every body block, also the chunked scratch buffer capacity
    pub body_block_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            line_buffer_size: DEFAULT_LINE_BUFFER_SIZE,
            max_line_continuations: DEFAULT_MAX_LINE_CONTINUATIONS,
            max_header_lines: DEFAULT_MAX_HEADER_LINES,
            max_chunk_header_size: DEFAULT_MAX_CHUNK_HEADER_SIZE,
            body_block_size: DEFAULT_BODY_BLOCK_SIZE,
        }
    }
}

impl Limits {
    /// Sets the line buffer capacity, at least one byte.
    #[must_use]
    pub fn with_line_buffer_size(mut self, size: usize) -> Self {
        self.line_buffer_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_line_continuations(mut self, count: usize) -> Self {
        self.max_line_continuations = count;
        self
    }

    #[must_use]
    pub fn with_max_header_lines(mut self, count: usize) -> Self {
        self.max_header_lines = count;
        self
    }

    #[must_use]
    pub fn with_max_chunk_header_size(mut self, size: usize) -> Self {
        self.max_chunk_header_size = size;
        self
    }

    /// Sets the body block size, at least one byte.
    ///
    /// The chunked reader also stages chunk header lines in its scratch buffer,
    /// whose capacity never drops below `max_chunk_header_size`.
    #[must_use]
    pub fn with_body_block_size(mut self, size: usize) -> Self {
        self.body_block_size = size.max(1);
        self
    }

    /// Capacity of the chunked reader scratch buffer.
    pub(crate) fn scratch_capacity(&self) -> usize {
        self.body_block_size.max(self.max_chunk_header_size)
    }
}
