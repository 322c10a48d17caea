use crate::bits::BitReader;
use crate::es::StreamId;
use crate::{ErrorKind, Result};

/// Fixed part of a PES packet header.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PesHeader {
    pub stream_id: StreamId,

    /// Number of bytes following this header; `0` means unbounded.
    pub packet_len: u16,
}
impl PesHeader {
    /// Size of the fixed header in bytes.
    pub const SIZE: usize = 6;

    pub(super) fn read_from(reader: &mut BitReader) -> Result<Self> {
        let packet_start_code_prefix = track!(reader.read_bits(24))?;
        track_assert_eq!(
            packet_start_code_prefix,
            1,
            ErrorKind::InvalidInput,
            "Unexpected PES packet start code prefix"
        );

        let stream_id = StreamId::new(track!(reader.read_bytes::<u8>())?);
        let packet_len = track!(reader.read_bytes::<u16>())?;
        Ok(PesHeader {
            stream_id,
            packet_len,
        })
    }

    /// Returns `true` if the end of the packet is given by `packet_len`.
    pub fn is_bounded(&self) -> bool {
        self.packet_len != 0
    }
}

/// Optional PES header carried by audio and video streams.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalHeader {
    pub marker_bits: u8,
    pub scrambling_control: u8,
    pub priority: bool,
    pub data_alignment_indicator: bool,
    pub copyright: bool,
    pub original_or_copy: bool,
    pub pts_dts_flags: u8,
    pub escr_flag: bool,
    pub es_rate_flag: bool,
    pub dsm_trick_mode_flag: bool,
    pub additional_copy_info_flag: bool,
    pub crc_flag: bool,
    pub extension_flag: bool,

    /// Number of optional field and stuffing bytes following this header.
    pub header_data_len: u8,
}
impl OptionalHeader {
    /// Size of the optional header without its optional fields.
    pub const MIN_SIZE: usize = 3;

    pub(super) fn read_from(reader: &mut BitReader) -> Result<Self> {
        let marker_bits = track!(reader.read_bits(2))? as u8;
        let scrambling_control = track!(reader.read_bits(2))? as u8;
        let priority = track!(reader.read_bit())?;
        let data_alignment_indicator = track!(reader.read_bit())?;
        let copyright = track!(reader.read_bit())?;
        let original_or_copy = track!(reader.read_bit())?;

        let pts_dts_flags = track!(reader.read_bits(2))? as u8;
        let escr_flag = track!(reader.read_bit())?;
        let es_rate_flag = track!(reader.read_bit())?;
        let dsm_trick_mode_flag = track!(reader.read_bit())?;
        let additional_copy_info_flag = track!(reader.read_bit())?;
        let crc_flag = track!(reader.read_bit())?;
        let extension_flag = track!(reader.read_bit())?;

        let header_data_len = track!(reader.read_bytes::<u8>())?;
        Ok(OptionalHeader {
            marker_bits,
            scrambling_control,
            priority,
            data_alignment_indicator,
            copyright,
            original_or_copy,
            pts_dts_flags,
            escr_flag,
            es_rate_flag,
            dsm_trick_mode_flag,
            additional_copy_info_flag,
            crc_flag,
            extension_flag,
            header_data_len,
        })
    }

    /// Returns `true` if a PTS field is signaled.
    pub fn has_pts(&self) -> bool {
        self.pts_dts_flags & 0b10 != 0
    }

    /// Returns `true` if a DTS field is signaled.
    pub fn has_dts(&self) -> bool {
        self.pts_dts_flags & 0b01 != 0
    }

    /// Total size of this header and its optional fields.
    pub fn total_len(&self) -> usize {
        Self::MIN_SIZE + usize::from(self.header_data_len)
    }
}
