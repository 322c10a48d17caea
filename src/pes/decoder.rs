use std::collections::{HashMap, VecDeque};

use crate::{Pid, Result};

use super::{ElementaryStreamUnit, UnitOptions};

/// PES packet decoder.
///
/// Keeps one `ElementaryStreamUnit` per PID and drives it with the payloads of the
/// transport stream packets of that PID, as extracted by the caller's demultiplexer.
///
/// `PesDecoder::default()` is the same as `PesDecoder::new()` and reads its options from
/// the environment; use `with_options` for a fixed configuration.
#[derive(Debug)]
pub struct PesDecoder {
    pes_packets: HashMap<Pid, ElementaryStreamUnit>,
    completed: VecDeque<ElementaryStreamUnit>,
    options: UnitOptions,
}
impl PesDecoder {
    /// Makes a new `PesDecoder` instance configured from the environment.
    ///
    /// See `UnitOptions::from_env`.
    pub fn new() -> Self {
        Self::with_options(UnitOptions::from_env())
    }

    /// Makes a new `PesDecoder` instance with the given options.
    pub fn with_options(options: UnitOptions) -> Self {
        PesDecoder {
            pes_packets: HashMap::new(),
            completed: VecDeque::new(),
            options,
        }
    }

    /// Processes the payload of a transport stream packet.
    ///
    /// `unit_start` is the packet's payload unit start indicator. On a unit start the pending
    /// unit of `pid`, if any, is finalized and queued, and a new unit begins with `payload`.
    /// Otherwise `payload` continues the pending unit; it is dropped if there is none.
    ///
    /// # Errors
    ///
    /// If a unit fails, it is discarded and the error is returned. Fragments of the same PID
    /// are then dropped until the next unit start.
    pub fn process_payload(&mut self, pid: Pid, unit_start: bool, payload: &[u8]) -> Result<()> {
        if unit_start {
            let finished = match self.pes_packets.remove(&pid) {
                Some(pred) => self.finish(pred),
                None => Ok(()),
            };
            let started = self.start_unit(pid, payload);
            track!(finished)?;
            track!(started)?;
        } else {
            track!(self.continue_unit(pid, payload))?;
        }
        Ok(())
    }

    /// Discards the pending unit of `pid`, returning `true` if there was one.
    pub fn discontinuity(&mut self, pid: Pid) -> bool {
        if let Some(partial) = self.pes_packets.remove(&pid) {
            log::debug!(
                "Discarded PES packet on discontinuity: pid={}, buffered={}",
                pid.as_u16(),
                partial.buffered_len()
            );
            true
        } else {
            false
        }
    }

    /// Pops the oldest completed unit.
    pub fn next_unit(&mut self) -> Option<ElementaryStreamUnit> {
        self.completed.pop_front()
    }

    /// Finalizes every pending unit, in ascending PID order.
    ///
    /// # Errors
    ///
    /// Units that cannot be finalized are discarded; the first such error is returned.
    pub fn flush(&mut self) -> Result<()> {
        let mut pids = self.pes_packets.keys().cloned().collect::<Vec<_>>();
        pids.sort();

        let mut result = Ok(());
        for pid in pids {
            if let Some(partial) = self.pes_packets.remove(&pid) {
                let finished = self.finish(partial);
                if result.is_ok() {
                    result = finished;
                }
            }
        }
        track!(result)
    }

    /// Returns the number of PIDs with a unit in progress.
    pub fn pending_len(&self) -> usize {
        self.pes_packets.len()
    }

    fn start_unit(&mut self, pid: Pid, payload: &[u8]) -> Result<()> {
        let mut unit = ElementaryStreamUnit::with_options(pid, self.options.clone());
        let consumed = track!(unit.append(payload); pid)?;
        self.settle(unit, payload.len() - consumed);
        Ok(())
    }

    fn continue_unit(&mut self, pid: Pid, payload: &[u8]) -> Result<()> {
        let mut partial = match self.pes_packets.remove(&pid) {
            Some(partial) => partial,
            None => {
                log::trace!(
                    "Dropped PES payload without a unit start: pid={}, len={}",
                    pid.as_u16(),
                    payload.len()
                );
                return Ok(());
            }
        };

        let consumed = track!(partial.append(payload); pid)?;
        self.settle(partial, payload.len() - consumed);
        Ok(())
    }

    fn settle(&mut self, unit: ElementaryStreamUnit, trailing: usize) {
        if unit.is_completed() {
            if trailing > 0 {
                log::trace!(
                    "Dropped trailing bytes after PES packet: pid={}, len={}",
                    unit.pid().as_u16(),
                    trailing
                );
            }
            self.completed.push_back(unit);
        } else {
            self.pes_packets.insert(unit.pid(), unit);
        }
    }

    fn finish(&mut self, mut partial: ElementaryStreamUnit) -> Result<()> {
        track!(partial.finalize())?;
        self.completed.push_back(partial);
        Ok(())
    }
}

impl Default for PesDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    fn video_pid() -> Pid {
        track_try_unwrap!(Pid::new(0x100))
    }

    fn audio_pid() -> Pid {
        track_try_unwrap!(Pid::new(0x101))
    }

    // Video PES packet with a PTS and an unbounded length.
    fn unbounded_video(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![
            0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x84, 0x80, 0x05, 0x21, 0x00, 0x01, 0x00, 0x01,
        ];
        bytes.extend_from_slice(payload);
        bytes
    }

    // Audio PES packet with a PTS and a bounded length.
    fn bounded_audio(payload: &[u8]) -> Vec<u8> {
        let packet_len = 8 + payload.len();
        let mut bytes = vec![
            0x00,
            0x00,
            0x01,
            0xC0,
            (packet_len >> 8) as u8,
            packet_len as u8,
            0x84,
            0x80,
            0x05,
            0x21,
            0x00,
            0x03,
            0x00,
            0x01,
        ];
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn unit_start_finalizes_unbounded_unit() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let first = unbounded_video(&[1, 2, 3]);
        track_try_unwrap!(decoder.process_payload(video_pid(), true, &first[..10]));
        track_try_unwrap!(decoder.process_payload(video_pid(), false, &first[10..]));
        track_try_unwrap!(decoder.process_payload(video_pid(), false, &[4, 5]));
        assert!(decoder.next_unit().is_none());
        assert_eq!(decoder.pending_len(), 1);

        let second = unbounded_video(&[6]);
        track_try_unwrap!(decoder.process_payload(video_pid(), true, &second));

        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.pid(), video_pid());
        assert_eq!(unit.pts().map(|t| t.as_u64()), Some(0));
        assert_eq!(unit.payload(), Some(&[1, 2, 3, 4, 5][..]));
        assert!(decoder.next_unit().is_none());

        track_try_unwrap!(decoder.flush());
        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.payload(), Some(&[6][..]));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn bounded_unit_completes_by_length() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let bytes = bounded_audio(&[9, 8, 7, 6]);
        track_try_unwrap!(decoder.process_payload(audio_pid(), true, &bytes[..12]));
        assert!(decoder.next_unit().is_none());

        let mut tail = bytes[12..].to_vec();
        tail.extend_from_slice(&[0xFF, 0xFF]); // stuffing
        track_try_unwrap!(decoder.process_payload(audio_pid(), false, &tail));

        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.pts().map(|t| t.as_u64()), Some(1 << 15));
        assert_eq!(unit.payload(), Some(&[9, 8, 7, 6][..]));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn interleaved_pids() {
        assert_ne!(video_pid(), audio_pid());
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let video = unbounded_video(&[1, 1]);
        let audio = bounded_audio(&[2, 2]);

        track_try_unwrap!(decoder.process_payload(video_pid(), true, &video[..7]));
        track_try_unwrap!(decoder.process_payload(audio_pid(), true, &audio[..7]));
        track_try_unwrap!(decoder.process_payload(video_pid(), false, &video[7..]));
        track_try_unwrap!(decoder.process_payload(audio_pid(), false, &audio[7..]));

        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.pid(), audio_pid());
        assert_eq!(unit.payload(), Some(&[2, 2][..]));

        track_try_unwrap!(decoder.flush());
        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.pid(), video_pid());
        assert_eq!(unit.payload(), Some(&[1, 1][..]));
    }

    #[test]
    fn payload_without_unit_start_is_dropped() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        track_try_unwrap!(decoder.process_payload(video_pid(), false, &[1, 2, 3]));
        assert_eq!(decoder.pending_len(), 0);
        assert!(decoder.next_unit().is_none());
    }

    #[test]
    fn discontinuity_discards_pending_unit() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let bytes = bounded_audio(&[1, 2, 3]);
        track_try_unwrap!(decoder.process_payload(audio_pid(), true, &bytes[..10]));
        assert!(decoder.discontinuity(audio_pid()));
        assert!(!decoder.discontinuity(audio_pid()));

        // The rest of the discarded unit has nowhere to go.
        track_try_unwrap!(decoder.process_payload(audio_pid(), false, &bytes[10..]));
        assert!(decoder.next_unit().is_none());
    }

    #[test]
    fn malformed_unit_is_discarded() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let e = decoder
            .process_payload(video_pid(), true, &[0x00, 0x00, 0x00, 0xE0, 0x00, 0x00])
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidInput);
        assert_eq!(decoder.pending_len(), 0);

        // Resynchronizes on the next unit start.
        let bytes = bounded_audio(&[5]);
        track_try_unwrap!(decoder.process_payload(video_pid(), true, &bytes));
        assert_eq!(decoder.next_unit().unwrap().payload(), Some(&[5][..]));
    }

    #[test]
    fn truncated_unit_on_unit_start() {
        let mut decoder = PesDecoder::with_options(UnitOptions::default());
        let bytes = bounded_audio(&[1, 2, 3]);
        track_try_unwrap!(decoder.process_payload(audio_pid(), true, &bytes[..bytes.len() - 1]));

        // The new unit is still started although the previous one was short.
        let e = decoder
            .process_payload(audio_pid(), true, &bytes)
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::Truncated);
        let unit = decoder.next_unit().unwrap();
        assert_eq!(unit.payload(), Some(&[1, 2, 3][..]));
        assert!(decoder.next_unit().is_none());
    }
}
