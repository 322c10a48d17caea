use std::cmp;

use crate::bits::BitReader;
use crate::es::StreamId;
use crate::pes::{OptionalHeader, PesHeader, UnitOptions};
use crate::time::Timestamp;
use crate::{ErrorKind, Pid, Result};

/// Parse stage of an `ElementaryStreamUnit`.
///
/// Stages only move forward.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    HeaderPending,
    OptionalHeaderPending,
    OptionalDataPending,
    PayloadPending,
    Complete,
}

/// Incremental reassembler of a single PES packet.
///
/// Bytes are fed with [`append`](#method.append) in arrival order, split at arbitrary
/// boundaries. A unit whose `packet_len` is non-zero completes by itself once it holds
/// the declared number of bytes; an unbounded unit (`packet_len == 0`) is completed by the
/// caller through [`finalize`](#method.finalize), typically when the next unit start of
/// the same PID is seen.
///
/// Any error is terminal: the unit is marked as failed and refuses further input. The caller
/// is expected to discard it and to start a fresh unit at the next unit start.
#[derive(Debug, Clone)]
pub struct ElementaryStreamUnit {
    pid: Pid,
    options: UnitOptions,
    data: Vec<u8>,
    stage: Stage,
    failed: bool,
    header: Option<PesHeader>,
    optional_header: Option<OptionalHeader>,
    pts: Option<Timestamp>,
    dts: Option<Timestamp>,
    payload_offset: usize,
}
impl ElementaryStreamUnit {
    /// Makes a new `ElementaryStreamUnit` instance with the default options.
    pub fn new(pid: Pid) -> Self {
        Self::with_options(pid, UnitOptions::default())
    }

    /// Makes a new `ElementaryStreamUnit` instance.
    pub fn with_options(pid: Pid, options: UnitOptions) -> Self {
        ElementaryStreamUnit {
            pid,
            options,
            data: Vec::new(),
            stage: Stage::HeaderPending,
            failed: false,
            header: None,
            optional_header: None,
            pts: None,
            dts: None,
            payload_offset: PesHeader::SIZE,
        }
    }

    /// Appends `bytes` to the unit and returns the number of bytes consumed.
    ///
    /// Only the bytes belonging to this unit are consumed: once a bounded unit is complete,
    /// the rest of `bytes` is left to the caller. `Ok(0)` is returned for an empty input or
    /// for an already completed unit.
    ///
    /// # Errors
    ///
    /// A malformed start code, timestamp field, PTS/DTS flags or inconsistent lengths result
    /// in an `ErrorKind::InvalidInput` error, and a field extending past the declared header
    /// data in an `ErrorKind::Truncated` error. After an error the unit is failed and every
    /// further call returns an `ErrorKind::InvalidInput` error.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        track_assert!(
            !self.failed,
            ErrorKind::InvalidInput,
            "PES packet already failed: pid={}",
            self.pid.as_u16()
        );
        let result = self.advance(bytes);
        if let Err(ref e) = result {
            self.fail(e);
        }
        track!(result)
    }

    /// Marks the end of the unit.
    ///
    /// Required for unbounded units; a no-op for a completed one.
    ///
    /// # Errors
    ///
    /// If the unit has not reached its payload, or if a bounded unit is still short of its
    /// declared length, it will return an `ErrorKind::Truncated` error and the unit is failed.
    pub fn finalize(&mut self) -> Result<()> {
        track_assert!(
            !self.failed,
            ErrorKind::InvalidInput,
            "PES packet already failed: pid={}",
            self.pid.as_u16()
        );
        let result = self.close();
        if let Err(ref e) = result {
            self.fail(e);
        }
        track!(result)
    }

    /// Returns the PID of the stream this unit belongs to.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Returns the current parse stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns `true` if the unit holds a complete PES packet.
    pub fn is_completed(&self) -> bool {
        self.stage == Stage::Complete
    }

    /// Returns `true` if a previous `append` or `finalize` call failed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns the number of bytes buffered so far, headers included.
    pub fn buffered_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the fixed header, once parsed.
    pub fn header(&self) -> Option<&PesHeader> {
        self.header.as_ref()
    }

    /// Returns the optional header, once parsed.
    ///
    /// Only audio and video streams have one.
    pub fn optional_header(&self) -> Option<&OptionalHeader> {
        self.optional_header.as_ref()
    }

    /// Returns the stream identifier.
    pub fn stream_id(&self) -> Option<StreamId> {
        self.header.as_ref().map(|h| h.stream_id)
    }

    /// Returns the declared packet length.
    pub fn packet_len(&self) -> Option<u16> {
        self.header.as_ref().map(|h| h.packet_len)
    }

    /// Returns the 2-bit scrambling control field.
    pub fn scrambling_control(&self) -> Option<u8> {
        self.optional_header.as_ref().map(|h| h.scrambling_control)
    }

    /// Returns the priority flag.
    pub fn priority(&self) -> Option<bool> {
        self.optional_header.as_ref().map(|h| h.priority)
    }

    /// Returns the data alignment indicator.
    pub fn data_alignment_indicator(&self) -> Option<bool> {
        self.optional_header
            .as_ref()
            .map(|h| h.data_alignment_indicator)
    }

    /// Returns the copyright flag.
    pub fn copyright(&self) -> Option<bool> {
        self.optional_header.as_ref().map(|h| h.copyright)
    }

    /// Returns the original or copy flag.
    pub fn original_or_copy(&self) -> Option<bool> {
        self.optional_header.as_ref().map(|h| h.original_or_copy)
    }

    /// Returns the presentation timestamp.
    pub fn pts(&self) -> Option<Timestamp> {
        self.pts
    }

    /// Returns the decode timestamp.
    ///
    /// Equal to the PTS when no DTS is signaled.
    pub fn dts(&self) -> Option<Timestamp> {
        self.dts
    }

    /// Returns the payload of a completed unit.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.is_completed() {
            Some(&self.data[self.payload_offset..])
        } else {
            None
        }
    }

    /// Returns the payload length of a completed unit.
    pub fn payload_len(&self) -> Option<usize> {
        self.payload().map(|p| p.len())
    }

    /// Converts a completed unit into its payload.
    pub fn into_payload(self) -> Option<Vec<u8>> {
        if !self.is_completed() {
            return None;
        }
        let mut data = self.data;
        data.drain(..self.payload_offset);
        Some(data)
    }

    fn advance(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut consumed = 0;
        loop {
            let rest = &bytes[consumed..];
            match self.stage {
                Stage::HeaderPending => {
                    consumed += self.fill_up_to(PesHeader::SIZE, rest);
                    if self.data.len() < PesHeader::SIZE {
                        break;
                    }
                    track!(self.parse_header())?;
                }
                Stage::OptionalHeaderPending => {
                    let size = PesHeader::SIZE + OptionalHeader::MIN_SIZE;
                    consumed += self.fill_up_to(size, rest);
                    if self.data.len() < size {
                        break;
                    }
                    track!(self.parse_optional_header())?;
                }
                Stage::OptionalDataPending => {
                    let size = self.payload_offset;
                    consumed += self.fill_up_to(size, rest);
                    if self.data.len() < size {
                        break;
                    }
                    track!(self.parse_optional_data())?;
                }
                Stage::PayloadPending => {
                    consumed += self.fill_payload(rest);
                    break;
                }
                Stage::Complete => break,
            }
        }
        Ok(consumed)
    }

    fn fill_up_to(&mut self, size: usize, bytes: &[u8]) -> usize {
        let need = size.saturating_sub(self.data.len());
        let n = cmp::min(need, bytes.len());
        self.data.extend_from_slice(&bytes[..n]);
        n
    }

    fn fill_payload(&mut self, bytes: &[u8]) -> usize {
        let n = match self.bounded_len() {
            Some(len) => cmp::min(bytes.len(), PesHeader::SIZE + len - self.data.len()),
            None => bytes.len(),
        };
        self.data.extend_from_slice(&bytes[..n]);
        self.check_completion();
        n
    }

    fn parse_header(&mut self) -> Result<()> {
        let header = {
            let mut reader = BitReader::new(&self.data[..PesHeader::SIZE]);
            track!(PesHeader::read_from(&mut reader); self.pid)?
        };
        let has_optional_header = header.stream_id.has_optional_header();
        log::debug!(
            "PES packet started: pid={}, stream_id={:#04x}, packet_len={}",
            self.pid.as_u16(),
            header.stream_id.as_u8(),
            header.packet_len
        );
        self.header = Some(header);

        if has_optional_header {
            if let Some(len) = self.bounded_len() {
                track_assert!(
                    len >= OptionalHeader::MIN_SIZE,
                    ErrorKind::InvalidInput,
                    "Too short PES packet for an optional header: packet_len={}",
                    len
                );
            }
            self.stage = Stage::OptionalHeaderPending;
        } else {
            self.payload_offset = PesHeader::SIZE;
            self.enter_payload();
        }
        Ok(())
    }

    fn parse_optional_header(&mut self) -> Result<()> {
        let size = PesHeader::SIZE + OptionalHeader::MIN_SIZE;
        let optional_header = {
            let mut reader = BitReader::new(&self.data[..size]);
            track!(reader.skip_bytes(PesHeader::SIZE))?;
            track!(OptionalHeader::read_from(&mut reader))?
        };
        if let Some(len) = self.bounded_len() {
            track_assert!(
                len >= optional_header.total_len(),
                ErrorKind::InvalidInput,
                "pes.packet_len={}, optional_header_len={}",
                len,
                optional_header.total_len()
            );
        }

        self.payload_offset = PesHeader::SIZE + optional_header.total_len();
        let has_optional_data = optional_header.header_data_len > 0;
        self.optional_header = Some(optional_header);
        if has_optional_data {
            self.stage = Stage::OptionalDataPending;
        } else {
            self.enter_payload();
        }
        Ok(())
    }

    fn parse_optional_data(&mut self) -> Result<()> {
        let (flags, header_data_len) = match self.optional_header {
            Some(ref h) => (h.pts_dts_flags, usize::from(h.header_data_len)),
            None => track_panic!(ErrorKind::Other, "Optional header is not parsed"),
        };

        let (pts, dts) = {
            let mut reader = BitReader::new(&self.data[..self.payload_offset]);
            track!(reader.skip_bytes(PesHeader::SIZE + OptionalHeader::MIN_SIZE))?;
            reader.start_section();

            let timestamps = match flags {
                0b10 => {
                    let pts = track!(
                        Timestamp::read_from(&mut reader, Timestamp::PTS_ONLY_PREFIX),
                        "Could not parse PTS"
                    )?;
                    (Some(pts), Some(pts))
                }
                0b11 => {
                    let pts = track!(
                        Timestamp::read_from(&mut reader, Timestamp::PTS_PREFIX),
                        "Could not parse PTS"
                    )?;
                    let dts = track!(
                        Timestamp::read_from(&mut reader, Timestamp::DTS_PREFIX),
                        "Could not parse DTS"
                    )?;
                    (Some(pts), Some(dts))
                }
                0b00 if self.options.allow_missing_timestamps => (None, None),
                _ => track_panic!(
                    ErrorKind::InvalidInput,
                    "Unsupported PTS/DTS flags: {:#04b}",
                    flags
                ),
            };

            // ESCR, ES rate and the other optional fields are skipped.
            let parsed = reader.section_consumed();
            track!(reader.skip_bytes(header_data_len - parsed))?;
            timestamps
        };

        self.pts = pts;
        self.dts = dts;
        self.enter_payload();
        Ok(())
    }

    fn enter_payload(&mut self) {
        self.stage = Stage::PayloadPending;
        self.check_completion();
    }

    fn check_completion(&mut self) {
        if let Some(len) = self.bounded_len() {
            if self.data.len() - PesHeader::SIZE == len {
                self.complete();
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.stage == Stage::Complete {
            return Ok(());
        }
        track_assert_eq!(
            self.stage,
            Stage::PayloadPending,
            ErrorKind::Truncated,
            "Unexpected end of PES packet: pid={}",
            self.pid.as_u16()
        );
        if let Some(len) = self.bounded_len() {
            track_panic!(
                ErrorKind::Truncated,
                "Unexpected end of PES packet: actual={}, expected={}",
                self.data.len() - PesHeader::SIZE,
                len
            );
        }
        self.complete();
        Ok(())
    }

    fn complete(&mut self) {
        self.stage = Stage::Complete;
        log::trace!(
            "PES packet completed: pid={}, payload_len={}",
            self.pid.as_u16(),
            self.data.len() - self.payload_offset
        );
    }

    fn fail(&mut self, e: &crate::Error) {
        self.failed = true;
        log::warn!(
            "Could not parse PES packet (pid: {}): {}",
            self.pid.as_u16(),
            e
        );
    }

    fn bounded_len(&self) -> Option<usize> {
        if self.options.ignore_packet_len {
            return None;
        }
        match self.header {
            Some(ref h) if h.is_bounded() => Some(usize::from(h.packet_len)),
            _ => None,
        }
    }
}
