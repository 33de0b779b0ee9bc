#![no_std]

//! Decoder for LZSS data in the flag-byte layout used by the GBA BIOS.
//!
//! Every control byte governs the next 8 items, most significant bit first:
//! a clear bit is one literal byte, a set bit is a back-reference code of
//! `(offset_bits + length_bits) / 8` bytes. See [`FormatParams`] for the
//! layouts supported and [`Decoder`] for the entry points.

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod codec;
mod decompress;
pub mod header;
#[cfg(feature = "std")]
mod io;
mod params;
mod source;
#[cfg(feature = "alloc")]
mod stream;
mod util;
#[cfg(feature = "alloc")]
mod window;

pub use codec::{assemble_code, BackRef, Codec, StandardCodec};
#[cfg(feature = "alloc")]
pub use decompress::{decompress_to_vec, DecodeFailure};
pub use decompress::{decompress_to_buf, DecompressError, Decoder, DecoderBuilder};
#[cfg(feature = "std")]
pub use io::{IoSource, LzssReader};
pub use params::{FieldSplit, FormatParams, Order, FLAG_BITS, MAX_REFERENCE_BYTES};
pub use source::{ByteSource, SliceSource};
#[cfg(feature = "alloc")]
pub use stream::{StreamDecoder, StreamState};
pub use util::{BufOutput, OutputSink};
#[cfg(feature = "alloc")]
pub use util::VecOutput;
#[cfg(feature = "alloc")]
pub use window::WindowBuffer;
