use bytes::{BufMut, BytesMut};

use crate::err::{CodecError, Needed};

/// Types that can append their wire form to a buffer.
pub trait Encode {
    fn encode(&self, buf: &mut BytesMut);
}

/// Encode a 64-bit integer in MySQL's packed ("net_store_length")
/// format: 1 byte for values below 251, otherwise a marker byte
/// followed by 2, 3 or 8 little-endian bytes.
pub fn write_packed_u64(buf: &mut BytesMut, value: u64) {
    if value < 251 {
        buf.put_u8(value as u8);
    } else if value < (1 << 16) {
        buf.put_u8(0xfc);
        buf.put_u16_le(value as u16);
    } else if value < (1 << 24) {
        buf.put_u8(0xfd);
        buf.put_u8(value as u8);
        buf.put_u8((value >> 8) as u8);
        buf.put_u8((value >> 16) as u8);
    } else {
        buf.put_u8(0xfe);
        buf.put_u64_le(value);
    }
}

/// Decode a packed 64-bit integer; returns the value and the number of
/// bytes consumed.
///
/// The markers `0xfb` (protocol NULL) and `0xff` (protocol error
/// packet) are not valid packed integers.
pub fn read_packed_u64(input: &[u8]) -> Result<(u64, usize), CodecError> {
    let first = *input
        .first()
        .ok_or(CodecError::Incomplete(Needed::Bytes(1)))?;
    match first {
        0..=250 => Ok((first as u64, 1)),
        0xfc => {
            let bytes = input
                .get(1..3)
                .ok_or(CodecError::Incomplete(Needed::Bytes(3 - input.len())))?;
            Ok((u16::from_le_bytes([bytes[0], bytes[1]]) as u64, 3))
        }
        0xfd => {
            let bytes = input
                .get(1..4)
                .ok_or(CodecError::Incomplete(Needed::Bytes(4 - input.len())))?;
            let value = bytes[0] as u64 | (bytes[1] as u64) << 8 | (bytes[2] as u64) << 16;
            Ok((value, 4))
        }
        0xfe => {
            let bytes = input
                .get(1..9)
                .ok_or(CodecError::Incomplete(Needed::Bytes(9 - input.len())))?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok((u64::from_le_bytes(raw), 9))
        }
        marker => Err(CodecError::invalid(format!(
            "invalid packed integer marker 0x{:02x}",
            marker
        ))),
    }
}
