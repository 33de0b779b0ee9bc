use crate::decompress::DecompressError;

/// Internal abstraction for types of outputs (slice vs Vec vs sliding window)
///
/// Note for all functions: we guarantee writing all the way up to the limit
pub trait OutputSink {
    /// Add the given literal run to the output
    ///
    /// If this would overflow the output, return Err(DecompressError::OutputTooSmall).
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), DecompressError>;
    /// Add a backreference to the output
    ///
    /// A `disp` of 0 means the current position minus 1.
    /// Increasing `disp` means further backwards
    ///
    /// Copy `len` bytes, which as usual for LZ77 may exceed `disp`.
    fn put_backref(&mut self, disp: usize, len: usize) -> Result<(), DecompressError>;
}

pub struct BufOutput<'a> {
    pub pos: usize,
    pub buf: &'a mut [u8],
}
impl<'a> From<&'a mut [u8]> for BufOutput<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        Self { pos: 0, buf }
    }
}
impl<'a> OutputSink for BufOutput<'a> {
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), DecompressError> {
        let mut len = lits.len();
        let mut did_overflow = false;
        if len > self.buf.len() - self.pos {
            did_overflow = true;
            len = self.buf.len() - self.pos;
        }

        self.buf[self.pos..self.pos + len].copy_from_slice(&lits[..len]);
        self.pos += len;

        if did_overflow {
            Err(DecompressError::OutputTooSmall)
        } else {
            Ok(())
        }
    }

    fn put_backref(&mut self, disp: usize, mut len: usize) -> Result<(), DecompressError> {
        if disp >= self.pos {
            return Err(DecompressError::InvalidOffset);
        }

        let mut did_overflow = false;
        if len > self.buf.len() - self.pos {
            did_overflow = true;
            len = self.buf.len() - self.pos;
        }

        // must go forwards one byte at a time, the source may overlap what we write
        for i in 0..len {
            self.buf[self.pos + i] = self.buf[self.pos - disp - 1 + i];
        }
        self.pos += len;

        if did_overflow {
            Err(DecompressError::OutputTooSmall)
        } else {
            Ok(())
        }
    }
}

/// Unbounded output, everything decoded so far stays addressable
#[cfg(feature = "alloc")]
pub struct VecOutput<'a> {
    pub vec: &'a mut alloc::vec::Vec<u8>,
    /// Where this decode started; earlier bytes are not part of the history
    pub base: usize,
}
#[cfg(feature = "alloc")]
impl<'a> From<&'a mut alloc::vec::Vec<u8>> for VecOutput<'a> {
    fn from(vec: &'a mut alloc::vec::Vec<u8>) -> Self {
        let base = vec.len();
        Self { vec, base }
    }
}
#[cfg(feature = "alloc")]
impl<'a> OutputSink for VecOutput<'a> {
    fn put_lits(&mut self, lits: &[u8]) -> Result<(), DecompressError> {
        self.vec.extend_from_slice(lits);
        Ok(())
    }

    fn put_backref(&mut self, disp: usize, len: usize) -> Result<(), DecompressError> {
        let pos = self.vec.len();
        if disp >= pos - self.base {
            return Err(DecompressError::InvalidOffset);
        }

        self.vec.reserve(len);
        for i in 0..len {
            let b = self.vec[pos - disp - 1 + i];
            self.vec.push(b);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf_out_lits_stop_at_end() {
        let mut out = [0u8; 4];
        let mut outbuf: BufOutput = (&mut out[..]).into();
        outbuf.put_lits(b"ab").unwrap();
        assert_eq!(
            outbuf.put_lits(b"cde"),
            Err(DecompressError::OutputTooSmall)
        );
        assert_eq!(outbuf.pos, 4);
        assert_eq!(outbuf.buf, b"abcd");

        // full buffer rejects even an empty-looking group byte
        assert_eq!(outbuf.put_lits(&[0]), Err(DecompressError::OutputTooSmall));
        outbuf.put_lits(&[]).unwrap();
    }

    #[test]
    fn test_buf_out_backref_reach() {
        let mut out = [0u8; 10];
        let mut outbuf: BufOutput = (&mut out[..]).into();
        outbuf.put_lits(b"xyz").unwrap();

        // one past the first byte written
        assert_eq!(
            outbuf.put_backref(3, 3),
            Err(DecompressError::InvalidOffset)
        );
        assert_eq!(
            outbuf.put_backref(usize::MAX, 3),
            Err(DecompressError::InvalidOffset)
        );
        assert_eq!(outbuf.pos, 3);

        // furthest legal reference reaches the first byte
        outbuf.put_backref(2, 3).unwrap();
        assert_eq!(&outbuf.buf[..6], b"xyzxyz");

        // run of the previous byte, cut short by the end of the buffer
        assert_eq!(
            outbuf.put_backref(0, 18),
            Err(DecompressError::OutputTooSmall)
        );
        assert_eq!(outbuf.buf, b"xyzxyzzzzz");
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_vec_out_lits() {
        let mut out = alloc::vec::Vec::new();
        let mut outbuf: VecOutput = (&mut out).into();
        outbuf.put_lits(&[1]).unwrap();
        assert_eq!(*outbuf.vec, [1]);
        outbuf.put_lits(&[2, 3, 4]).unwrap();
        assert_eq!(*outbuf.vec, [1, 2, 3, 4]);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_vec_out_backref() {
        let mut out = alloc::vec::Vec::new();
        let mut outbuf: VecOutput = (&mut out).into();
        outbuf.put_lits(&[1, 2, 3]).unwrap();
        outbuf.put_backref(1, 6).unwrap();
        assert_eq!(*outbuf.vec, [1, 2, 3, 2, 3, 2, 3, 2, 3]);

        // run of a single byte
        outbuf.put_backref(0, 3).unwrap();
        assert_eq!(outbuf.vec[9..], [3, 3, 3]);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_vec_out_ignores_prior_contents() {
        let mut out = alloc::vec![9, 9];
        let mut outbuf: VecOutput = (&mut out).into();
        outbuf.put_lits(&[1]).unwrap();
        assert_eq!(
            outbuf.put_backref(1, 3),
            Err(DecompressError::InvalidOffset)
        );
        outbuf.put_backref(0, 2).unwrap();
        assert_eq!(out, [9, 9, 1, 1, 1]);
    }
}
