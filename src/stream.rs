//! Incremental, pull-based decoding.

use tracing::debug;

use crate::codec::{Codec, StandardCodec};
use crate::decompress::{decode_block, Block, DecompressError};
use crate::params::FormatParams;
use crate::source::{ByteSource, Counted};
use crate::window::WindowBuffer;

/// Lifecycle of a [`StreamDecoder`]
///
/// Every state but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Running,
    /// Input ended cleanly; buffered output may still be waiting to be read
    Done,
    /// Decoding failed; buffered output is delivered before the error
    Failed(DecompressError),
    Closed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamState::Running)
    }
}

/// Decoder that produces output on demand from a [`ByteSource`]
///
/// Each [`read`](StreamDecoder::read) decodes only as many control blocks as
/// needed to hand out at least one byte. Memory use is bounded by the window
/// size of the format, not by the length of the input.
#[derive(Debug)]
pub struct StreamDecoder<S, C = StandardCodec> {
    src: Counted<S>,
    codec: C,
    params: FormatParams,
    window: WindowBuffer,
    state: StreamState,
    produced: u64,
}

impl<S: ByteSource, C: Codec> StreamDecoder<S, C> {
    pub fn new(src: S, codec: C, params: FormatParams) -> Self {
        Self {
            src: Counted::new(src),
            codec,
            window: WindowBuffer::new(&params),
            params,
            state: StreamState::Running,
            produced: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Compressed bytes pulled from the source so far
    pub fn bytes_consumed(&self) -> u64 {
        self.src.consumed
    }

    /// Decoded bytes handed to the caller so far
    pub fn bytes_produced(&self) -> u64 {
        self.produced
    }

    pub fn source(&self) -> &S {
        &self.src.inner
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.src.inner
    }

    /// Read up to `buf.len()` decoded bytes
    ///
    /// `Ok(0)` with a non-empty `buf` means the input ended cleanly. After a
    /// failure, every call returns the same error once buffered output is drained.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        if self.state == StreamState::Closed {
            return Err(DecompressError::Closed);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.window.has_ready() {
                let n = self.window.drain_ready(buf);
                self.produced += n as u64;
                return Ok(n);
            }

            match self.state {
                StreamState::Running => self.step(),
                StreamState::Done => return Ok(0),
                StreamState::Failed(e) => return Err(e),
                StreamState::Closed => return Err(DecompressError::Closed),
            }
        }
    }

    /// Decode one control block, flushing when the window fills or decoding stops
    fn step(&mut self) {
        match decode_block(&mut self.src, &mut self.window, &self.codec, &self.params) {
            Ok(Block::Decoded) => {
                if self.window.should_flush() {
                    self.window.flush();
                }
            }
            Ok(Block::EndOfInput) => {
                self.window.flush();
                self.state = StreamState::Done;
                debug!(consumed = self.src.consumed, "lzss stream finished");
            }
            Err(e) => {
                self.window.flush();
                self.state = StreamState::Failed(e);
                debug!(consumed = self.src.consumed, error = %e, "lzss stream failed");
            }
        }
    }

    /// Stop decoding and discard buffered output
    ///
    /// Idempotent. Later reads fail with [`DecompressError::Closed`] and never
    /// touch the source.
    pub fn close(&mut self) {
        self.window.clear();
        self.state = StreamState::Closed;
    }
}
