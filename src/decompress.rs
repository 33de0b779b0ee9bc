use thiserror::Error;
use tracing::debug;

use crate::codec::{Codec, StandardCodec};
use crate::params::{FieldSplit, FormatParams, Order, FLAG_BITS, MAX_REFERENCE_BYTES};
use crate::source::{ByteSource, SliceSource};
use crate::util::*;

/// Construction and decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecompressError {
    #[error("unknown byte order")]
    UnknownOrder,
    #[error("required parameter cannot be absent")]
    NilParameter,
    #[error("threshold {threshold} is smaller than the minimum of {min}")]
    ThresholdTooSmall { threshold: usize, min: usize },
    #[error("threshold {threshold} allows copies longer than memory can hold")]
    ThresholdTooLarge { threshold: usize },
    #[error("offset and length fields do not add up to 1-4 whole bytes")]
    InvalidFieldWidths,
    #[error("input was truncated")]
    InputTruncated,
    #[error("invalid chunk length")]
    InvalidChunkLength,
    #[error("relative offset out of bounds")]
    InvalidOffset,
    #[error("output buffer was insufficient")]
    OutputTooSmall,
    #[error("invalid header tag {0:#04x}")]
    InvalidHeader(u8),
    #[error("reader is closed")]
    Closed,
    /// The byte source itself failed
    #[error("byte source failed")]
    Source,
}

/// A decode that stopped early, along with everything decoded before the failure
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} after {len} decoded bytes", len = .output.len())]
pub struct DecodeFailure {
    pub output: alloc::vec::Vec<u8>,
    pub error: DecompressError,
}

/// Outcome of one control byte's worth of decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Block {
    /// A control byte and all its codes were decoded
    Decoded,
    /// The input ended cleanly before a control byte
    EndOfInput,
}

/// Decode one control byte and the 8 literals/references it governs
pub(crate) fn decode_block<S, O, C>(
    inp: &mut S,
    outp: &mut O,
    codec: &C,
    params: &FormatParams,
) -> Result<Block, DecompressError>
where
    S: ByteSource + ?Sized,
    O: OutputSink + ?Sized,
    C: Codec + ?Sized,
{
    let Some(flags) = inp.next_byte()? else {
        return Ok(Block::EndOfInput);
    };

    // same result as the loop below, but without per-bit dispatch
    if codec.all_literal(flags) {
        let mut lits = [0u8; FLAG_BITS as usize];
        let n = inp.next_bytes(&mut lits)?;
        outp.put_lits(&lits[..n])?;
        if n < lits.len() {
            return Err(DecompressError::InputTruncated);
        }
        return Ok(Block::Decoded);
    }

    let ref_len = params.reference_bytes();
    for round in 0..FLAG_BITS {
        if codec.is_literal(flags, round) {
            let Some(b) = inp.next_byte()? else {
                return Err(DecompressError::InputTruncated);
            };
            outp.put_lits(&[b])?;
        } else {
            let mut code = [0u8; MAX_REFERENCE_BYTES];
            if inp.next_bytes(&mut code[..ref_len])? < ref_len {
                return Err(DecompressError::InputTruncated);
            }

            let backref = codec
                .decode_reference(&code[..ref_len], params)
                .ok_or(DecompressError::InvalidChunkLength)?;
            let len = backref
                .length
                .checked_add(params.threshold())
                .filter(|&len| len <= params.max_copy())
                .ok_or(DecompressError::InvalidChunkLength)?;
            outp.put_backref(backref.offset, len)?;
        }
    }

    Ok(Block::Decoded)
}

fn decompress_impl<S, O, C>(
    inp: &mut S,
    outp: &mut O,
    codec: &C,
    params: &FormatParams,
) -> Result<(), DecompressError>
where
    S: ByteSource + ?Sized,
    O: OutputSink + ?Sized,
    C: Codec + ?Sized,
{
    while decode_block(inp, outp, codec, params)? == Block::Decoded {}
    Ok(())
}

/// LZSS decoder bound to one bit layout
///
/// Decoding through `&self` never mutates the decoder, so one instance
/// can serve any number of independent inputs.
#[derive(Debug, Clone)]
pub struct Decoder<C = StandardCodec> {
    params: FormatParams,
    codec: C,
}

impl Decoder<StandardCodec> {
    /// GBA BIOS layout with the given byte order
    pub fn new(order: Order) -> Self {
        Self::from_params(FormatParams::gba().with_order(order))
    }

    pub fn from_params(params: FormatParams) -> Self {
        debug!(?params, "lzss decoder created");
        Self {
            params,
            codec: StandardCodec,
        }
    }
}

impl Default for Decoder<StandardCodec> {
    fn default() -> Self {
        Self::from_params(FormatParams::gba())
    }
}

impl<C: Codec> Decoder<C> {
    pub fn params(&self) -> &FormatParams {
        &self.params
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decode into a caller-provided buffer, returning the number of bytes written
    ///
    /// On error the buffer still holds whatever was decoded before the failure.
    pub fn decode_to_buf(&self, inp: &[u8], outp: &mut [u8]) -> Result<usize, DecompressError> {
        let mut src = SliceSource::new(inp);
        let mut outp: BufOutput = outp.into();
        decompress_impl(&mut src, &mut outp, &self.codec, &self.params).inspect_err(|e| {
            debug!(consumed = src.position(), produced = outp.pos, error = %e, "lzss decode failed");
        })?;
        Ok(outp.pos)
    }

    /// Decode, appending to `outp`
    ///
    /// References cannot reach into bytes `outp` held before the call. On
    /// error `outp` keeps everything decoded before the failure.
    #[cfg(feature = "alloc")]
    pub fn decode_into(
        &self,
        inp: &[u8],
        outp: &mut alloc::vec::Vec<u8>,
    ) -> Result<(), DecompressError> {
        let mut src = SliceSource::new(inp);
        let mut outp: VecOutput = outp.into();
        decompress_impl(&mut src, &mut outp, &self.codec, &self.params).inspect_err(|e| {
            debug!(
                consumed = src.position(),
                produced = outp.vec.len() - outp.base,
                error = %e,
                "lzss decode failed"
            );
        })
    }

    /// Decode a whole buffer
    #[cfg(feature = "alloc")]
    pub fn decode(&self, inp: &[u8]) -> Result<alloc::vec::Vec<u8>, DecodeFailure> {
        let mut output = alloc::vec::Vec::with_capacity(inp.len() * 2);
        match self.decode_into(inp, &mut output) {
            Ok(()) => Ok(output),
            Err(error) => Err(DecodeFailure { output, error }),
        }
    }

    /// Incremental decoder pulling from `src`
    #[cfg(feature = "alloc")]
    pub fn stream<S: ByteSource>(&self, src: S) -> crate::stream::StreamDecoder<S, C>
    where
        C: Clone,
    {
        crate::stream::StreamDecoder::new(src, self.codec.clone(), self.params)
    }

    /// `std::io::Read` adapter decoding from `inner`
    #[cfg(feature = "std")]
    pub fn reader<R: std::io::Read>(&self, inner: R) -> crate::io::LzssReader<R, C>
    where
        C: Clone,
    {
        crate::io::LzssReader::new(inner, self.codec.clone(), self.params)
    }
}

/// Builder for decoders with a non-default layout or codec
///
/// A builder made with [`DecoderBuilder::custom`] starts without a codec and
/// refuses to build until one is supplied.
#[derive(Debug, Clone)]
pub struct DecoderBuilder<C = StandardCodec> {
    order: Order,
    offset_bits: u32,
    length_bits: u32,
    split: FieldSplit,
    threshold: Option<usize>,
    codec: Option<C>,
}

impl DecoderBuilder<StandardCodec> {
    pub fn new(order: Order) -> Self {
        Self::custom(order).codec(StandardCodec)
    }
}

impl<C: Codec> DecoderBuilder<C> {
    pub fn custom(order: Order) -> Self {
        let gba = FormatParams::gba();
        Self {
            order,
            offset_bits: gba.offset_bits(),
            length_bits: gba.length_bits(),
            split: gba.split(),
            threshold: None,
            codec: None,
        }
    }

    pub fn codec<D: Codec>(self, codec: D) -> DecoderBuilder<D> {
        DecoderBuilder {
            order: self.order,
            offset_bits: self.offset_bits,
            length_bits: self.length_bits,
            split: self.split,
            threshold: self.threshold,
            codec: Some(codec),
        }
    }

    pub fn offset_bits(mut self, bits: u32) -> Self {
        self.offset_bits = bits;
        self
    }

    pub fn length_bits(mut self, bits: u32) -> Self {
        self.length_bits = bits;
        self
    }

    pub fn split(mut self, split: FieldSplit) -> Self {
        self.split = split;
        self
    }

    /// Minimum match length; defaults to the smallest the layout allows
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<Decoder<C>, DecompressError> {
        let codec = self.codec.ok_or(DecompressError::NilParameter)?;
        // bad widths fall through to FormatParams::new, which rejects them
        let threshold = self.threshold.unwrap_or_else(|| {
            self.offset_bits
                .checked_add(self.length_bits)
                .map_or(0, |total| total as usize / 8 + 1)
        });
        let params = FormatParams::new(
            self.order,
            self.offset_bits,
            self.length_bits,
            self.split,
            threshold,
        )?;
        debug!(?params, "lzss decoder created");
        Ok(Decoder { params, codec })
    }
}

/// Decode GBA-layout data into `outp`, returning the number of bytes written
pub fn decompress_to_buf(inp: &[u8], outp: &mut [u8]) -> Result<usize, DecompressError> {
    let mut src = SliceSource::new(inp);
    let mut outp: BufOutput = outp.into();
    decompress_impl(&mut src, &mut outp, &StandardCodec, &FormatParams::gba())?;
    Ok(outp.pos)
}

/// Decode GBA-layout data into a new Vec
#[cfg(feature = "alloc")]
pub fn decompress_to_vec(
    inp: &[u8],
    capacity_hint: Option<usize>,
) -> Result<alloc::vec::Vec<u8>, DecodeFailure> {
    let mut output = if let Some(capacity_hint) = capacity_hint {
        alloc::vec::Vec::with_capacity(capacity_hint)
    } else {
        alloc::vec::Vec::new()
    };
    let mut src = SliceSource::new(inp);
    let mut outp: VecOutput = (&mut output).into();
    match decompress_impl(&mut src, &mut outp, &StandardCodec, &FormatParams::gba()) {
        Ok(()) => Ok(output),
        Err(error) => Err(DecodeFailure { output, error }),
    }
}
