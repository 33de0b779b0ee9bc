//! GBA BIOS container header.
//!
//! Data meant for the BIOS `LZ77UnComp` calls starts with a 4-byte header:
//! a type tag of `0x10` followed by the decoded size as a 24-bit little-endian
//! integer. The payload is usually padded to a multiple of 4 bytes, so it
//! decodes to a few trailing zero bytes past the declared size.

#[cfg(feature = "alloc")]
use tracing::warn;

use crate::decompress::DecompressError;

/// Type tag of LZ77-compressed BIOS data
pub const GBA_LZ77_TAG: u8 = 0x10;

pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GbaHeader {
    /// Size of the data before compression
    pub decoded_len: usize,
}

impl GbaHeader {
    /// Split `data` into its header and compressed payload
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), DecompressError> {
        let Some((hdr, payload)) = data.split_first_chunk::<HEADER_LEN>() else {
            return Err(DecompressError::InputTruncated);
        };
        if hdr[0] != GBA_LZ77_TAG {
            return Err(DecompressError::InvalidHeader(hdr[0]));
        }
        let decoded_len = u32::from_le_bytes([hdr[1], hdr[2], hdr[3], 0]) as usize;
        Ok((Self { decoded_len }, payload))
    }
}

/// Decode a GBA BIOS LZ77 blob, header included
///
/// Padding past the declared size is dropped. A payload that decodes to fewer
/// bytes than declared fails with [`DecompressError::InputTruncated`].
#[cfg(feature = "alloc")]
pub fn decompress_gba(
    data: &[u8],
) -> Result<alloc::vec::Vec<u8>, crate::decompress::DecodeFailure> {
    use crate::decompress::{decompress_to_vec, DecodeFailure};

    let (hdr, payload) = GbaHeader::parse(data).map_err(|error| DecodeFailure {
        output: alloc::vec::Vec::new(),
        error,
    })?;

    let mut output = match decompress_to_vec(payload, Some(hdr.decoded_len + 8)) {
        Ok(output) => output,
        // decoding may run into the end of the padding after the real data is complete
        Err(DecodeFailure {
            output,
            error: DecompressError::InputTruncated,
        }) if output.len() >= hdr.decoded_len => output,
        Err(e) => return Err(e),
    };

    if output.len() < hdr.decoded_len {
        warn!(
            declared = hdr.decoded_len,
            decoded = output.len(),
            "gba payload shorter than its header"
        );
        return Err(DecodeFailure {
            output,
            error: DecompressError::InputTruncated,
        });
    }
    output.truncate(hdr.decoded_len);
    Ok(output)
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let data = [0x10, 0x34, 0x12, 0x01, 0xaa];
        let (hdr, payload) = GbaHeader::parse(&data).unwrap();
        assert_eq!(hdr.decoded_len, 0x011234);
        assert_eq!(payload, &[0xaa]);

        assert_eq!(
            GbaHeader::parse(&[0x11, 0, 0, 0]),
            Err(DecompressError::InvalidHeader(0x11))
        );
        assert_eq!(
            GbaHeader::parse(&[0x10, 0]),
            Err(DecompressError::InputTruncated)
        );
    }

    #[test]
    fn test_strips_padding() {
        let data = [
            0x10, 8, 0, 0, // header
            0x20, b'A', b'B', 0x30, 0x01, 0, 0, 0, 0, 0, // payload
        ];
        assert_eq!(decompress_gba(&data).unwrap(), b"ABABABAB");
    }

    #[test]
    fn test_truncated_padding_is_fine() {
        // padding stops mid-block, but only after the declared size
        let data = [0x10, 8, 0, 0, 0x20, b'A', b'B', 0x30, 0x01, 0, 0];
        assert_eq!(decompress_gba(&data).unwrap(), b"ABABABAB");
    }

    #[test]
    fn test_short_payload() {
        let data = [0x10, 20, 0, 0, 0x20, b'A', b'B', 0x30, 0x01, 0, 0, 0, 0, 0];
        let err = decompress_gba(&data).unwrap_err();
        assert_eq!(err.error, DecompressError::InputTruncated);
        assert_eq!(err.output.len(), 13);
    }

    #[test]
    fn test_bad_payload() {
        let data = [0x10, 8, 0, 0, 0x80, 0x00, 0x00];
        let err = decompress_gba(&data).unwrap_err();
        assert_eq!(err.error, DecompressError::InvalidOffset);
    }
}
