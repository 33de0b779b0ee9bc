//! Bounded output buffer for streaming decodes.

use alloc::vec::Vec;

use tracing::trace;

use crate::decompress::DecompressError;
use crate::params::FormatParams;
use crate::util::OutputSink;

/// Sliding window over the decoded output
///
/// Layout of `data`:
///
/// ```text
/// [ history ... | ready (flushed, not yet read) | pending (written since flush) ]
///               ^ ready_start                   ^ ready_end                    ^ data.len()
/// ```
///
/// Only flushed bytes are handed to the reader. A flush also forgets history
/// the reader has consumed, but always keeps at least `window_size` bytes so
/// every legal reference still resolves.
#[derive(Debug)]
pub struct WindowBuffer {
    data: Vec<u8>,
    ready_start: usize,
    ready_end: usize,
    window_size: usize,
    flush_threshold: usize,
}

impl WindowBuffer {
    pub fn new(params: &FormatParams) -> Self {
        let window_size = params.window_size();
        let flush_threshold = 2 * window_size;
        Self {
            data: Vec::with_capacity(window_size + flush_threshold),
            ready_start: 0,
            ready_end: 0,
            window_size,
            flush_threshold,
        }
    }

    /// Bytes written since the last flush
    pub fn pending(&self) -> usize {
        self.data.len() - self.ready_end
    }

    /// Whether enough has been written to be worth handing out
    pub fn should_flush(&self) -> bool {
        self.pending() >= self.flush_threshold
    }

    /// Decoded bytes still addressable by references
    pub fn history_len(&self) -> usize {
        self.data.len()
    }

    /// Make everything written so far readable
    pub fn flush(&mut self) {
        let discard = self
            .ready_start
            .min(self.data.len().saturating_sub(self.window_size));
        if discard > 0 {
            self.data.drain(..discard);
            self.ready_start -= discard;
            self.ready_end -= discard;
        }

        trace!(
            flushed = self.pending(),
            retained = self.data.len(),
            "window flush"
        );
        self.ready_end = self.data.len();
    }

    pub fn ready(&self) -> &[u8] {
        &self.data[self.ready_start..self.ready_end]
    }

    pub fn has_ready(&self) -> bool {
        self.ready_start < self.ready_end
    }

    /// Copy out as many ready bytes as fit into `dst`
    pub fn drain_ready(&mut self, dst: &mut [u8]) -> usize {
        let ready = self.ready();
        let n = dst.len().min(ready.len());
        dst[..n].copy_from_slice(&ready[..n]);
        self.ready_start += n;
        n
    }

    /// Drop all buffered data and history
    pub fn clear(&mut self) {
        self.data.clear();
        self.ready_start = 0;
        self.ready_end = 0;
    }
}

impl OutputSink for WindowBuffer {
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), DecompressError> {
        self.data.extend_from_slice(lits);
        Ok(())
    }

    fn put_backref(&mut self, disp: usize, len: usize) -> Result<(), DecompressError> {
        let pos = self.data.len();
        if disp >= pos {
            return Err(DecompressError::InvalidOffset);
        }

        for i in 0..len {
            let b = self.data[pos - disp - 1 + i];
            self.data.push(b);
        }
        Ok(())
    }
}
