use crate::decompress::DecompressError;

/// Sequential supplier of compressed bytes
pub trait ByteSource {
    /// Next byte, or `None` at the end of the input
    fn next_byte(&mut self) -> Result<Option<u8>, DecompressError>;

    /// Fill as much of `buf` as the input allows
    ///
    /// Returns the number of bytes written, which is short only at the end of the input.
    fn next_bytes(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            match self.next_byte()? {
                Some(b) => *slot = b,
                None => return Ok(i),
            }
        }
        Ok(buf.len())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> Result<Option<u8>, DecompressError> {
        (**self).next_byte()
    }

    fn next_bytes(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        (**self).next_bytes(buf)
    }
}

/// In-memory input
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl<'a> From<&'a [u8]> for SliceSource<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>, DecompressError> {
        let b = self.data.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    fn next_bytes(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        let rest = self.remaining();
        let n = buf.len().min(rest.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Wrapper that counts the bytes pulled from a source
#[derive(Debug)]
pub(crate) struct Counted<S> {
    pub(crate) inner: S,
    pub(crate) consumed: u64,
}

impl<S> Counted<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner, consumed: 0 }
    }
}

impl<S: ByteSource> ByteSource for Counted<S> {
    fn next_byte(&mut self) -> Result<Option<u8>, DecompressError> {
        let b = self.inner.next_byte()?;
        if b.is_some() {
            self.consumed += 1;
        }
        Ok(b)
    }

    fn next_bytes(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        let n = self.inner.next_bytes(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}
