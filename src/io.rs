//! `std::io` integration.

use std::io::{self, BufRead, BufReader, Read};

use crate::codec::{Codec, StandardCodec};
use crate::decompress::{DecompressError, Decoder};
use crate::params::{FormatParams, Order};
use crate::source::ByteSource;
use crate::stream::{StreamDecoder, StreamState};

impl From<DecompressError> for io::Error {
    fn from(err: DecompressError) -> Self {
        let kind = match err {
            DecompressError::InputTruncated => io::ErrorKind::UnexpectedEof,
            DecompressError::InvalidChunkLength
            | DecompressError::InvalidOffset
            | DecompressError::InvalidHeader(_) => io::ErrorKind::InvalidData,
            DecompressError::UnknownOrder
            | DecompressError::NilParameter
            | DecompressError::ThresholdTooSmall { .. }
            | DecompressError::ThresholdTooLarge { .. }
            | DecompressError::InvalidFieldWidths => io::ErrorKind::InvalidInput,
            DecompressError::OutputTooSmall => io::ErrorKind::WriteZero,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// [`ByteSource`] over any buffered reader
///
/// Remembers the kind of the last I/O failure so it can be reported again
/// after the decoder has turned it into [`DecompressError::Source`].
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    last_error: Option<io::ErrorKind>,
}

impl<R: BufRead> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            last_error: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn last_error(&self) -> Option<io::ErrorKind> {
        self.last_error
    }
}

impl<R: BufRead> ByteSource for IoSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, DecompressError> {
        loop {
            match self.inner.fill_buf() {
                Ok([]) => return Ok(None),
                Ok(&[b, ..]) => {
                    self.inner.consume(1);
                    return Ok(Some(b));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.last_error = Some(e.kind());
                    return Err(DecompressError::Source);
                }
            }
        }
    }

    fn next_bytes(&mut self, buf: &mut [u8]) -> Result<usize, DecompressError> {
        let mut filled = 0;
        while filled < buf.len() {
            let avail = match self.inner.fill_buf() {
                Ok(avail) => avail,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.last_error = Some(e.kind());
                    return Err(DecompressError::Source);
                }
            };
            if avail.is_empty() {
                break;
            }
            let n = avail.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&avail[..n]);
            self.inner.consume(n);
            filled += n;
        }
        Ok(filled)
    }
}

/// Reader that decompresses LZSS data from an inner reader
///
/// Read errors of the inner reader surface with their original
/// [`io::ErrorKind`]; format errors map to `InvalidData`, truncation to
/// `UnexpectedEof`.
#[derive(Debug)]
pub struct LzssReader<R, C = StandardCodec> {
    inner: StreamDecoder<IoSource<BufReader<R>>, C>,
}

impl<R: Read> LzssReader<R, StandardCodec> {
    /// GBA BIOS layout with the given byte order
    pub fn with_order(inner: R, order: Order) -> Self {
        Decoder::new(order).reader(inner)
    }
}

impl<R: Read, C: Codec> LzssReader<R, C> {
    pub fn new(inner: R, codec: C, params: FormatParams) -> Self {
        Self {
            inner: StreamDecoder::new(IoSource::new(BufReader::new(inner)), codec, params),
        }
    }

    /// Get a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        self.inner.source().get_ref().get_ref()
    }

    /// Get a mutable reference to the inner reader.
    pub fn get_mut(&mut self) -> &mut R {
        self.inner.source_mut().get_mut().get_mut()
    }

    pub fn state(&self) -> StreamState {
        self.inner.state()
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.inner.bytes_consumed()
    }

    /// Stop decoding; every later read fails. Idempotent.
    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl<R: Read, C: Codec> Read for LzssReader<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| match e {
            DecompressError::Source => {
                let kind = self
                    .inner
                    .source()
                    .last_error()
                    .unwrap_or(io::ErrorKind::Other);
                io::Error::new(kind, e)
            }
            e => e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_read_to_end() {
        let inp = [0x20, b'A', b'B', 0x30, 0x01, b'C', b'D', b'E', b'F', b'G'];
        let mut r = LzssReader::with_order(&inp[..], Order::Msb);
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ABABABABCDEFG");
        assert_eq!(r.bytes_consumed(), inp.len() as u64);
        assert_eq!(r.state(), StreamState::Done);
    }

    #[test]
    fn test_truncated_kind() {
        let inp = [0x00, 1, 2, 3];
        let mut r = LzssReader::with_order(&inp[..], Order::Msb);
        let mut out = Vec::new();
        let err = r.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // partial output still arrived
        assert_eq!(out, [1, 2, 3]);

        let inner = err.get_ref().and_then(|e| e.downcast_ref::<DecompressError>());
        assert_eq!(inner, Some(&DecompressError::InputTruncated));
    }

    #[test]
    fn test_invalid_data_kind() {
        let inp = [0x80, 0x00, 0x00];
        let mut r = LzssReader::with_order(&inp[..], Order::Lsb);
        let mut buf = [0u8; 8];
        let err = r.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    struct Failing {
        calls: usize,
    }
    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == 1 {
                buf[..2].copy_from_slice(&[0x7f, b'x']);
                Ok(2)
            } else {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
            }
        }
    }

    #[test]
    fn test_source_error_kind_is_sticky() {
        let mut r = Decoder::default().reader(Failing { calls: 0 });
        let mut out = Vec::new();
        let err = r.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(out, b"x");

        let mut buf = [0u8; 4];
        let err = r.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        // the decoder never retried the source
        assert_eq!(r.get_ref().calls, 2);
    }

    #[test]
    fn test_close_does_not_touch_source() {
        let mut r = Decoder::default().reader(Failing { calls: 0 });
        r.close();
        r.close();
        let mut buf = [0u8; 4];
        for _ in 0..3 {
            let err = r.read(&mut buf).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::Other);
            assert_eq!(
                err.get_ref().and_then(|e| e.downcast_ref::<DecompressError>()),
                Some(&DecompressError::Closed)
            );
        }
        assert_eq!(r.get_mut().calls, 0);
    }

    #[test]
    fn test_interrupted_is_retried() {
        struct Flaky<'a> {
            data: &'a [u8],
            interrupt: bool,
        }
        impl Read for Flaky<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.interrupt = !self.interrupt;
                if self.interrupt {
                    return Err(io::ErrorKind::Interrupted.into());
                }
                let n = buf.len().min(self.data.len()).min(1);
                buf[..n].copy_from_slice(&self.data[..n]);
                self.data = &self.data[n..];
                Ok(n)
            }
        }

        let inp = [0x00, 1, 2, 3, 4, 5, 6, 7, 8];
        let mut r = Decoder::default().reader(Flaky {
            data: &inp,
            interrupt: false,
        });
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
