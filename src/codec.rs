//! Endianness-aware integer decode/encode, and the LEB128 variable-length
//! integer codecs used by DWARF-style debug info layered on top of this
//! reader. Not used by the ELF core itself, but kept here so a DWARF
//! collaborator built on top of this crate has them ready-made.

use crate::error::{Error, Result};
use crate::ident::ElfDataEncoding;

/// Decode a 16-bit field at the start of `bytes` using `data`'s byte order.
pub fn read_u16(bytes: &[u8], data: ElfDataEncoding) -> u16 {
    let raw = [bytes[0], bytes[1]];
    match data {
        ElfDataEncoding::Lsb => u16::from_le_bytes(raw),
        ElfDataEncoding::Msb => u16::from_be_bytes(raw),
    }
}

/// Decode a 32-bit field at the start of `bytes` using `data`'s byte order.
pub fn read_u32(bytes: &[u8], data: ElfDataEncoding) -> u32 {
    let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
    match data {
        ElfDataEncoding::Lsb => u32::from_le_bytes(raw),
        ElfDataEncoding::Msb => u32::from_be_bytes(raw),
    }
}

/// Decode a 64-bit field at the start of `bytes` using `data`'s byte order.
pub fn read_u64(bytes: &[u8], data: ElfDataEncoding) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[0..8]);
    match data {
        ElfDataEncoding::Lsb => u64::from_le_bytes(raw),
        ElfDataEncoding::Msb => u64::from_be_bytes(raw),
    }
}

/// Encode a 16-bit field using `data`'s byte order.
pub fn write_u16(value: u16, data: ElfDataEncoding) -> [u8; 2] {
    match data {
        ElfDataEncoding::Lsb => value.to_le_bytes(),
        ElfDataEncoding::Msb => value.to_be_bytes(),
    }
}

/// Encode a 32-bit field using `data`'s byte order.
pub fn write_u32(value: u32, data: ElfDataEncoding) -> [u8; 4] {
    match data {
        ElfDataEncoding::Lsb => value.to_le_bytes(),
        ElfDataEncoding::Msb => value.to_be_bytes(),
    }
}

/// Encode a 64-bit field using `data`'s byte order.
pub fn write_u64(value: u64, data: ElfDataEncoding) -> [u8; 8] {
    match data {
        ElfDataEncoding::Lsb => value.to_le_bytes(),
        ElfDataEncoding::Msb => value.to_be_bytes(),
    }
}

/// Decode an unsigned LEB128 value from `bytes`, returning the value and the
/// number of bytes consumed.
///
/// Groups are 7 bits, little-endian (least significant group first), with
/// the high bit of each byte marking continuation. Fails with
/// [`Error::BadFormat`] if the accumulated shift would overflow 64 bits
/// before a terminating byte is seen, or if `bytes` runs out first.
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut count = 0;

    loop {
        let byte = *bytes.get(count).ok_or(Error::BadFormat)?;
        count += 1;
        let chunk = (byte & 0x7F) as u64;

        if shift >= 64 || (chunk << shift) >> shift != chunk {
            return Err(Error::BadFormat);
        }
        value |= chunk << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, count))
}

/// Decode a signed LEB128 value from `bytes`, returning the value and the
/// number of bytes consumed.
///
/// Same 7-bit/MSB-continuation shape as [`decode_uleb128`]; the result is
/// sign-extended from bit 6 of the final byte when the total shift is less
/// than 64.
pub fn decode_sleb128(bytes: &[u8]) -> Result<(i64, usize)> {
    let mut value: i64 = 0;
    let mut shift: u32 = 0;
    let mut count = 0;
    let mut last_byte = 0u8;

    loop {
        let byte = *bytes.get(count).ok_or(Error::BadFormat)?;
        count += 1;
        last_byte = byte;
        let chunk = (byte & 0x7F) as i64;

        if shift >= 64 || (chunk << shift) >> shift != chunk {
            return Err(Error::BadFormat);
        }
        value |= chunk << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
    }

    if shift < 64 && (last_byte & 0x40) != 0 {
        value |= -1i64 << shift;
    }

    Ok((value, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_on_mismatched_endianness() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40];
        assert_eq!(read_u64(&bytes, ElfDataEncoding::Msb), 0x40);
    }

    #[test]
    fn uleb128_decodes_multigroup_values() {
        // 624485 = 0xE5 0x8E 0x26 in ULEB128 (DWARF spec example)
        let bytes = [0xE5, 0x8E, 0x26];
        let (value, len) = decode_uleb128(&bytes).unwrap();
        assert_eq!(value, 624485);
        assert_eq!(len, 3);
    }

    #[test]
    fn sleb128_sign_extends_negative_values() {
        // -624485 in SLEB128 (DWARF spec example)
        let bytes = [0x9B, 0xF1, 0x59];
        let (value, len) = decode_sleb128(&bytes).unwrap();
        assert_eq!(value, -624485);
        assert_eq!(len, 3);
    }

    #[test]
    fn uleb128_single_byte() {
        let bytes = [0x02];
        assert_eq!(decode_uleb128(&bytes).unwrap(), (2, 1));
    }
}
