//! PTS/DTS timestamps.
use std::time::Duration;

use crate::bits::BitReader;
use crate::{ErrorKind, Result};

/// 33-bit presentation or decode timestamp, in 90 kHz clock ticks.
///
/// Wraparound of the 33-bit counter is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);
impl Timestamp {
    /// Maximum timestamp value.
    pub const MAX: u64 = (1 << 33) - 1;

    /// Ticks per second.
    pub const RESOLUTION: u64 = 90_000;

    /// Size of an encoded timestamp field in bytes.
    pub const SIZE: usize = 5;

    /// Prefix of a PTS that is not followed by a DTS.
    pub const PTS_ONLY_PREFIX: u8 = 0b0010;

    /// Prefix of a PTS that is followed by a DTS.
    pub const PTS_PREFIX: u8 = 0b0011;

    /// Prefix of a DTS.
    pub const DTS_PREFIX: u8 = 0b0001;

    /// Makes a new `Timestamp` instance.
    ///
    /// # Errors
    ///
    /// If `n` exceeds `Timestamp::MAX`, it will return an `ErrorKind::InvalidInput` error.
    pub fn new(n: u64) -> Result<Self> {
        track_assert!(n <= Self::MAX, ErrorKind::InvalidInput, "Too large timestamp: {}", n);
        Ok(Timestamp(n))
    }

    /// Returns the value in 90 kHz ticks.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the value as a `Duration` since the zero point of the clock.
    pub fn to_duration(&self) -> Duration {
        let secs = self.0 / Self::RESOLUTION;
        let nanos = (self.0 % Self::RESOLUTION) * 1_000_000_000 / Self::RESOLUTION;
        Duration::new(secs, nanos as u32)
    }

    /// Decodes a 5-byte timestamp field whose 4-bit prefix must equal `prefix`.
    ///
    /// ```text
    ///  76543210  76543210  76543210  76543210  76543210
    /// [ppppTTTm][TTTTTTTT][TTTTTTTm][TTTTTTTT][TTTTTTTm]
    /// ```
    ///
    /// `p` is the prefix, `m` a marker bit that must be `1` and `T` the timestamp, MSB first.
    pub fn read_from(reader: &mut BitReader, prefix: u8) -> Result<Self> {
        let actual = track!(reader.read_bits(4))? as u8;
        track_assert_eq!(actual, prefix, ErrorKind::InvalidInput, "Unexpected timestamp prefix");

        let mut n = track!(reader.read_bits(3))? << 30;
        track!(Self::read_marker_bit(reader, 0))?;
        n |= track!(reader.read_bits(8))? << 22;
        n |= track!(reader.read_bits(7))? << 15;
        track!(Self::read_marker_bit(reader, 2))?;
        n |= track!(reader.read_bits(8))? << 7;
        n |= track!(reader.read_bits(7))?;
        track!(Self::read_marker_bit(reader, 4))?;
        Ok(Timestamp(n))
    }

    fn read_marker_bit(reader: &mut BitReader, byte: usize) -> Result<()> {
        let marker = track!(reader.read_bit())?;
        track_assert!(
            marker,
            ErrorKind::InvalidInput,
            "Invalid marker bit of the timestamp byte #{}",
            byte
        );
        Ok(())
    }
}
