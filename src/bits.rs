//! Bounded MSB-first bit reader.
//!
//! Every read is checked against the end of the underlying slice; reading past it
//! fails with `ErrorKind::Truncated` and leaves the cursor where it was.
use byteorder::{BigEndian, ByteOrder};
use std::cmp;

use crate::{ErrorKind, Result};

/// Unsigned integers that can be decoded from big-endian bytes.
pub trait FromBigEndian: Sized {
    /// Size of the encoded value in bytes.
    const SIZE: usize;

    /// Decodes a value from the first `SIZE` bytes of `buf`.
    fn from_big_endian(buf: &[u8]) -> Self;
}
impl FromBigEndian for u8 {
    const SIZE: usize = 1;
    fn from_big_endian(buf: &[u8]) -> Self {
        buf[0]
    }
}
impl FromBigEndian for u16 {
    const SIZE: usize = 2;
    fn from_big_endian(buf: &[u8]) -> Self {
        BigEndian::read_u16(buf)
    }
}
impl FromBigEndian for u32 {
    const SIZE: usize = 4;
    fn from_big_endian(buf: &[u8]) -> Self {
        BigEndian::read_u32(buf)
    }
}
impl FromBigEndian for u64 {
    const SIZE: usize = 8;
    fn from_big_endian(buf: &[u8]) -> Self {
        BigEndian::read_u64(buf)
    }
}

/// Positional reader over a fixed byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    bit_pos: usize,
    section_start: usize,
}
impl<'a> BitReader<'a> {
    /// Makes a new `BitReader` positioned at the first bit of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        BitReader {
            buf,
            bit_pos: 0,
            section_start: 0,
        }
    }

    /// Returns the current position in bits.
    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the number of bits left to read.
    pub fn remaining_bits(&self) -> usize {
        self.buf.len() * 8 - self.bit_pos
    }

    /// Returns `true` if the cursor is on a byte boundary.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        let bit = track!(self.read_bits(1))?;
        Ok(bit == 1)
    }

    /// Reads `n` bits (at most 64) as an unsigned value, most significant bit first.
    pub fn read_bits(&mut self, n: usize) -> Result<u64> {
        track_assert!(n <= 64, ErrorKind::Other, "Too many bits: {}", n);
        track!(self.ensure_bits(n))?;

        let mut value = 0u64;
        let mut rest = n;
        while rest > 0 {
            let byte = self.buf[self.bit_pos / 8];
            let offset = self.bit_pos % 8;
            let take = cmp::min(8 - offset, rest);
            let bits = (byte >> (8 - offset - take)) & (0xFF >> (8 - take));
            value = (value << take) | u64::from(bits);
            self.bit_pos += take;
            rest -= take;
        }
        Ok(value)
    }

    /// Reads a big-endian integer of type `T`.
    ///
    /// The cursor does not need to be byte aligned.
    pub fn read_bytes<T: FromBigEndian>(&mut self) -> Result<T> {
        track!(self.ensure_bits(T::SIZE * 8))?;
        if self.is_byte_aligned() {
            let start = self.bit_pos / 8;
            let value = T::from_big_endian(&self.buf[start..start + T::SIZE]);
            self.bit_pos += T::SIZE * 8;
            Ok(value)
        } else {
            let mut bytes = [0; 8];
            for b in bytes.iter_mut().take(T::SIZE) {
                *b = track!(self.read_bits(8))? as u8;
            }
            Ok(T::from_big_endian(&bytes[..T::SIZE]))
        }
    }

    /// Skips `n` bytes.
    pub fn skip_bytes(&mut self, n: usize) -> Result<()> {
        track!(self.ensure_bits(n * 8))?;
        self.bit_pos += n * 8;
        Ok(())
    }

    /// Marks the current position as the start of a section.
    pub fn start_section(&mut self) {
        self.section_start = self.bit_pos;
    }

    /// Returns the number of whole bytes consumed since the last `start_section` call.
    pub fn section_consumed(&self) -> usize {
        (self.bit_pos - self.section_start) / 8
    }

    fn ensure_bits(&self, n: usize) -> Result<()> {
        track_assert!(
            n <= self.remaining_bits(),
            ErrorKind::Truncated,
            "Cannot read {} bits: remaining={}",
            n,
            self.remaining_bits()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_bits_across_bytes() {
        let mut reader = BitReader::new(&[0b1010_1100, 0b0101_1111]);
        assert!(track_try_unwrap!(reader.read_bit()));
        assert_eq!(track_try_unwrap!(reader.read_bits(3)), 0b010);
        assert_eq!(track_try_unwrap!(reader.read_bits(6)), 0b1100_01);
        assert_eq!(track_try_unwrap!(reader.read_bits(6)), 0b01_1111);
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn read_bytes_big_endian() {
        let mut reader = BitReader::new(&[0x00, 0x00, 0x01, 0xE0, 0x12, 0x34]);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u16>()), 0);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u8>()), 1);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u8>()), 0xE0);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u16>()), 0x1234);

        let mut reader = BitReader::new(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89]);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u32>()), 0xDEAD_BEEF);
        assert_eq!(track_try_unwrap!(reader.read_bits(4)), 0);
        assert_eq!(
            reader.read_bytes::<u64>().err().map(|e| e.kind().clone()),
            Some(ErrorKind::Truncated)
        );

        let mut reader = BitReader::new(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]);
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u64>()), 0x0123_4567_89AB_CDEF);
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn read_bytes_unaligned() {
        let mut reader = BitReader::new(&[0x0A, 0xBC, 0xD0]);
        assert_eq!(track_try_unwrap!(reader.read_bits(4)), 0);
        assert!(!reader.is_byte_aligned());
        assert_eq!(track_try_unwrap!(reader.read_bytes::<u16>()), 0xABCD);
        assert_eq!(reader.bit_position(), 20);
    }

    #[test]
    fn over_read_is_truncated() {
        let mut reader = BitReader::new(&[0xFF, 0xFF]);
        assert_eq!(track_try_unwrap!(reader.read_bits(12)), 0xFFF);

        let e = reader.read_bytes::<u8>().err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::Truncated);
        let e = reader.read_bits(5).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::Truncated);
        let e = reader.skip_bytes(1).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::Truncated);

        // A failed read does not move the cursor.
        assert_eq!(reader.bit_position(), 12);
        assert_eq!(track_try_unwrap!(reader.read_bits(4)), 0xF);
    }

    #[test]
    fn section_consumed() {
        let mut reader = BitReader::new(&[0; 10]);
        track_try_unwrap!(reader.skip_bytes(3));
        reader.start_section();
        assert_eq!(reader.section_consumed(), 0);
        track_try_unwrap!(reader.read_bits(20));
        assert_eq!(reader.section_consumed(), 2);
        track_try_unwrap!(reader.read_bits(20));
        assert_eq!(reader.section_consumed(), 5);
    }
}
