use core::fmt;
use core::str::FromStr;

use crate::decompress::DecompressError;

/// Number of sequential flag bits in one control byte
pub const FLAG_BITS: u32 = 8;

/// Widest reference code supported, in bytes
pub const MAX_REFERENCE_BYTES: usize = 4;

const MAX_OFFSET_BITS: u32 = 24;

/// Byte order of multi-byte reference codes
///
/// This only affects reference codes. Control bytes are always consumed
/// most-significant-bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// First byte of the code is the least significant
    Lsb,
    /// First byte of the code is the most significant
    Msb,
}

impl TryFrom<u8> for Order {
    type Error = DecompressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Order::Lsb),
            1 => Ok(Order::Msb),
            _ => Err(DecompressError::UnknownOrder),
        }
    }
}

impl FromStr for Order {
    type Err = DecompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("lsb") || s.eq_ignore_ascii_case("le") {
            Ok(Order::Lsb)
        } else if s.eq_ignore_ascii_case("msb") || s.eq_ignore_ascii_case("be") {
            Ok(Order::Msb)
        } else {
            Err(DecompressError::UnknownOrder)
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Lsb => write!(f, "lsb"),
            Order::Msb => write!(f, "msb"),
        }
    }
}

/// Which end of a reference code holds the length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSplit {
    /// `[length | offset]`, as used by the GBA BIOS
    LengthHigh,
    /// `[offset | length]`
    LengthLow,
}

impl FromStr for FieldSplit {
    type Err = DecompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("high") {
            Ok(FieldSplit::LengthHigh)
        } else if s.eq_ignore_ascii_case("low") {
            Ok(FieldSplit::LengthLow)
        } else {
            Err(DecompressError::InvalidFieldWidths)
        }
    }
}

/// Bit layout of a compressed stream
///
/// Immutable once constructed; [`FormatParams::new`] validates every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatParams {
    order: Order,
    offset_bits: u32,
    length_bits: u32,
    split: FieldSplit,
    threshold: usize,
}

impl FormatParams {
    /// Layout of the GBA BIOS `LZ77UnComp` routine (minus its 4-byte header)
    ///
    /// 12-bit offset, 4-bit length in the high nibble, big-endian codes,
    /// minimum match of 3. An offset of 0 refers to the previous byte.
    pub const fn gba() -> Self {
        Self {
            order: Order::Msb,
            offset_bits: 12,
            length_bits: 4,
            split: FieldSplit::LengthHigh,
            threshold: 3,
        }
    }

    /// Same widths as [`FormatParams::gba`], but with the length in the low nibble
    pub const fn nibble_low(order: Order) -> Self {
        Self {
            order,
            offset_bits: 12,
            length_bits: 4,
            split: FieldSplit::LengthLow,
            threshold: 3,
        }
    }

    pub fn new(
        order: Order,
        offset_bits: u32,
        length_bits: u32,
        split: FieldSplit,
        threshold: usize,
    ) -> Result<Self, DecompressError> {
        let max_bits = MAX_REFERENCE_BYTES as u32 * 8;
        if offset_bits == 0
            || offset_bits > MAX_OFFSET_BITS
            || length_bits == 0
            || length_bits >= max_bits
        {
            return Err(DecompressError::InvalidFieldWidths);
        }
        let total = offset_bits + length_bits;
        if total % 8 != 0 || total > max_bits {
            return Err(DecompressError::InvalidFieldWidths);
        }

        let params = Self {
            order,
            offset_bits,
            length_bits,
            split,
            threshold,
        };
        if threshold < params.threshold_min() {
            return Err(DecompressError::ThresholdTooSmall {
                threshold,
                min: params.threshold_min(),
            });
        }
        // a whole block of maximal copies must stay addressable
        let longest = ((1usize << length_bits) - 1).checked_add(threshold);
        if longest.and_then(|n| n.checked_mul(FLAG_BITS as usize)).is_none() {
            return Err(DecompressError::ThresholdTooLarge { threshold });
        }
        Ok(params)
    }

    /// Copy of these parameters with a different byte order
    pub const fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub const fn order(&self) -> Order {
        self.order
    }

    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub const fn length_bits(&self) -> u32 {
        self.length_bits
    }

    pub const fn split(&self) -> FieldSplit {
        self.split
    }

    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of bytes one reference code occupies
    pub const fn reference_bytes(&self) -> usize {
        ((self.offset_bits + self.length_bits) / 8) as usize
    }

    /// Smallest threshold for which a reference is never longer than the literals it replaces
    pub const fn threshold_min(&self) -> usize {
        self.reference_bytes() + 1
    }

    /// Maximum backward distance a reference can address
    pub const fn window_size(&self) -> usize {
        1 << self.offset_bits
    }

    /// Longest copy a single reference can produce
    pub const fn max_copy(&self) -> usize {
        ((1usize << self.length_bits) - 1) + self.threshold
    }

    /// Upper bound on output produced by one control byte and its 8 codes
    pub const fn max_block_output(&self) -> usize {
        // threshold >= 2, so a copy always outgrows a literal
        FLAG_BITS as usize * self.max_copy()
    }
}

impl Default for FormatParams {
    fn default() -> Self {
        Self::gba()
    }
}
