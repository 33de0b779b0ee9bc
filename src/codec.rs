use crate::params::{FieldSplit, FormatParams, Order, FLAG_BITS};

/// A decoded back-reference
///
/// Copy `length` bytes starting `offset + 1` bytes before the current
/// output position. `length` does not yet include the format threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackRef {
    pub length: usize,
    pub offset: usize,
}

/// Interpretation of control bits and reference codes
///
/// Implementations must be stateless; the decoder may call them in any order.
pub trait Codec {
    /// Whether sub-round `round` (0 = first) of control byte `flags` is a literal
    fn is_literal(&self, flags: u8, round: u32) -> bool;

    /// Split a raw reference code into length and offset
    ///
    /// `code` holds exactly `params.reference_bytes()` bytes, in stream order.
    /// Returning `None` rejects the code as an invalid chunk length.
    fn decode_reference(&self, code: &[u8], params: &FormatParams) -> Option<BackRef>;

    /// Whether every sub-round of `flags` is a literal
    ///
    /// Lets the decoder copy a whole group of literals at once.
    fn all_literal(&self, flags: u8) -> bool {
        (0..FLAG_BITS).all(|round| self.is_literal(flags, round))
    }
}

/// Default codec: MSB-first control bits, integer codes split per [`FormatParams`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardCodec;

/// Assemble a reference code into an integer
pub fn assemble_code(code: &[u8], order: Order) -> u32 {
    match order {
        Order::Msb => code.iter().fold(0, |acc, &b| (acc << 8) | b as u32),
        Order::Lsb => code.iter().rev().fold(0, |acc, &b| (acc << 8) | b as u32),
    }
}

impl Codec for StandardCodec {
    #[inline]
    fn is_literal(&self, flags: u8, round: u32) -> bool {
        (flags << round) & 0x80 == 0
    }

    fn decode_reference(&self, code: &[u8], params: &FormatParams) -> Option<BackRef> {
        let code = assemble_code(code, params.order());
        let offset_mask = (1u32 << params.offset_bits()) - 1;
        let length_mask = (1u32 << params.length_bits()) - 1;

        let (length, offset) = match params.split() {
            FieldSplit::LengthHigh => (
                (code >> params.offset_bits()) & length_mask,
                code & offset_mask,
            ),
            FieldSplit::LengthLow => (
                code & length_mask,
                (code >> params.length_bits()) & offset_mask,
            ),
        };

        Some(BackRef {
            length: length as usize,
            offset: offset as usize,
        })
    }

    #[inline]
    fn all_literal(&self, flags: u8) -> bool {
        flags == 0
    }
}
