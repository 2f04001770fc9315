use log::{debug, error, warn};

use crate::process::classify::{FrameInfo, classify};
use crate::process::strategy::{ac3, dts, eac3, truehd};
use crate::process::writer::PacketWriter;
use crate::process::{ByteOrder, Codec};
use crate::structs::frame::{Frame, Packet};
use crate::utils::errors::EncapsulateError;

/// Outcome of pushing one frame.
#[derive(Debug)]
pub enum Status {
    /// A burst was completed and is ready to be sent.
    Complete(Packet),
    /// The frame was absorbed into a burst still being built.
    NeedMoreData,
}

impl Status {
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Status::Complete(packet) => Some(packet),
            Status::NeedMoreData => None,
        }
    }
}

/// Per-codec accumulation state carried between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Ac3,
    /// Audio blocks of substream 0 gathered in the current burst.
    Eac3 { blocks_substream0: u32 },
    /// MAT slot the next access unit goes into.
    TrueHd { frame_index: usize },
    Dts,
}

impl Accumulator {
    pub fn for_codec(codec: Codec) -> Self {
        match codec {
            Codec::Ac3 => Self::Ac3,
            Codec::Eac3 => Self::Eac3 {
                blocks_substream0: 0,
            },
            Codec::Mlp | Codec::TrueHd => Self::TrueHd { frame_index: 0 },
            Codec::Dts => Self::Dts,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Eac3 { blocks_substream0 } => *blocks_substream0 = 0,
            Self::TrueHd { frame_index } => *frame_index = 0,
            Self::Ac3 | Self::Dts => {}
        }
    }
}

/// Wraps compressed frames of one codec into IEC 61937 bursts.
///
/// A session is bound to a single codec and output byte order. Frames go in
/// one at a time through [`push`](Self::push); each call either hands back a
/// complete burst or reports that more input is needed. Any error drops the
/// burst being built, so the next frame always starts clean.
///
/// # Example
///
/// ```rust,no_run
/// use iec61937::process::encapsulate::{Encapsulator, Status};
/// use iec61937::process::{ByteOrder, Codec};
/// use iec61937::structs::frame::Frame;
///
/// let mut encapsulator = Encapsulator::new(Codec::Ac3, ByteOrder::Little);
/// let frame = Frame::new(std::fs::read("frame.ac3")?);
///
/// if let Status::Complete(packet) = encapsulator.push(frame)? {
///     println!("Burst of {} bytes", packet.data.len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Encapsulator {
    codec: Codec,
    writer: PacketWriter,
    accumulator: Accumulator,
    frames_processed: usize,
    packets_emitted: usize,
    error_count: usize,
}

impl Encapsulator {
    pub fn new(codec: Codec, output: ByteOrder) -> Self {
        Self {
            codec,
            writer: PacketWriter::new(output),
            accumulator: Accumulator::for_codec(codec),
            frames_processed: 0,
            packets_emitted: 0,
            error_count: 0,
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn output_order(&self) -> ByteOrder {
        self.writer.output_order()
    }

    /// Whether a burst is partially built.
    pub fn is_building(&self) -> bool {
        self.writer.is_building()
    }

    pub fn accumulator(&self) -> Accumulator {
        self.accumulator
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    pub fn packets_emitted(&self) -> usize {
        self.packets_emitted
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Feeds one frame into the session.
    ///
    /// The frame is consumed whatever the outcome.
    pub fn push(&mut self, frame: Frame) -> Result<Status, EncapsulateError> {
        self.frames_processed += 1;

        match self.encapsulate(&frame) {
            Ok(status) => {
                if let Status::Complete(packet) = &status {
                    self.packets_emitted += 1;
                    debug!(
                        "{} burst #{}: {} bytes, {} samples",
                        self.codec,
                        self.packets_emitted,
                        packet.data.len(),
                        packet.samples
                    );
                }
                Ok(status)
            }
            Err(err) => {
                self.error_count += 1;
                if self.writer.is_building() {
                    warn!("Dropping partially built {} burst", self.codec);
                }
                self.flush();

                if err.is_contract_violation() {
                    error!("Burst writer misuse: {err}");
                }
                Err(err)
            }
        }
    }

    /// Drops any partially built burst and clears the accumulation counters.
    pub fn flush(&mut self) {
        self.writer.reset();
        self.accumulator.reset();
    }

    fn encapsulate(&mut self, frame: &Frame) -> Result<Status, EncapsulateError> {
        let info: FrameInfo = classify(self.codec, frame)?;

        match &mut self.accumulator {
            Accumulator::Ac3 => ac3::write_ac3(&mut self.writer, frame, &info),
            Accumulator::Eac3 { blocks_substream0 } => {
                eac3::write_eac3(&mut self.writer, blocks_substream0, frame, &info)
            }
            Accumulator::TrueHd { frame_index } => {
                truehd::write_truehd(&mut self.writer, frame_index, frame, &info)
            }
            Accumulator::Dts => dts::write_dts(&mut self.writer, frame, &info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::a52::tests::{ac3_header, eac3_header};
    use crate::structs::burst::BurstHeader;
    use crate::structs::dts::tests::dts_header_be16;
    use anyhow::Result;

    fn ac3_frame(bsmod: u8) -> Frame {
        let mut data = ac3_header(bsmod).to_vec();
        data.resize(1536, 0xA5);
        Frame::new(data)
    }

    fn eac3_frame(substreamid: u8, numblkscod: u8) -> Frame {
        let mut data = eac3_header(0, substreamid, 512, numblkscod).to_vec();
        data.resize(512, 0x5A);
        Frame::new(data).with_duration(10)
    }

    #[test]
    fn ac3_every_frame_is_a_burst() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Ac3, ByteOrder::Little);

        for bsmod in 0..3 {
            let frame = ac3_frame(bsmod).with_timestamps(Some(bsmod as i64), None);
            let packet = encapsulator
                .push(frame)?
                .into_packet()
                .expect("AC-3 completes per frame");

            assert_eq!(packet.data.len(), 6144);
            assert_eq!(packet.pts, Some(bsmod as i64));
            let header = packet.burst_header(ByteOrder::Little).expect("preamble");
            assert_eq!(header, BurstHeader::new(0x01 | (bsmod as u16) << 8, 1536 * 8));
        }

        assert_eq!(encapsulator.frames_processed(), 3);
        assert_eq!(encapsulator.packets_emitted(), 3);
        Ok(())
    }

    #[test]
    fn eac3_burst_keeps_first_timestamps() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Eac3, ByteOrder::Big);

        // numblkscod 1: two blocks per frame
        let first = eac3_frame(0, 1).with_timestamps(Some(100), Some(90));
        assert!(matches!(encapsulator.push(first)?, Status::NeedMoreData));
        assert!(matches!(
            encapsulator.push(eac3_frame(0, 1))?,
            Status::NeedMoreData
        ));
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::Eac3 {
                blocks_substream0: 4
            }
        );

        let packet = encapsulator
            .push(eac3_frame(0, 1))?
            .into_packet()
            .expect("six blocks complete the burst");
        assert_eq!(packet.data.len(), 24576);
        assert_eq!((packet.pts, packet.dts), (Some(100), Some(90)));
        assert_eq!(packet.duration, 30);
        assert_eq!(
            packet.burst_header(ByteOrder::Big),
            Some(BurstHeader::new(0x15, 1536))
        );
        assert!(!encapsulator.is_building());
        Ok(())
    }

    #[test]
    fn flush_discards_partial_burst() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Eac3, ByteOrder::Little);
        encapsulator.push(eac3_frame(0, 1))?;
        assert!(encapsulator.is_building());

        encapsulator.flush();
        encapsulator.flush();
        assert!(!encapsulator.is_building());
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::Eac3 {
                blocks_substream0: 0
            }
        );

        // a fresh burst needs all six blocks again
        for _ in 0..2 {
            assert!(matches!(
                encapsulator.push(eac3_frame(0, 1))?,
                Status::NeedMoreData
            ));
        }
        assert!(matches!(
            encapsulator.push(eac3_frame(0, 1))?,
            Status::Complete(_)
        ));
        Ok(())
    }

    #[test]
    fn error_resets_session() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::TrueHd, ByteOrder::Little);

        for _ in 0..5 {
            let frame = Frame::new(vec![0x11u8; 800]).with_samples(40);
            assert!(matches!(encapsulator.push(frame)?, Status::NeedMoreData));
        }
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::TrueHd { frame_index: 5 }
        );

        let oversized = Frame::new(vec![0x22u8; 3000]).with_samples(40);
        assert!(matches!(
            encapsulator.push(oversized),
            Err(EncapsulateError::MatSlotOverflow { index: 5, .. })
        ));
        assert!(!encapsulator.is_building());
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::TrueHd { frame_index: 0 }
        );
        assert_eq!(encapsulator.error_count(), 1);

        // the next access unit opens a new MAT frame with its start code
        let mut last = None;
        for _ in 0..24 {
            let frame = Frame::new(vec![0x33u8; 800]).with_samples(40);
            last = encapsulator.push(frame)?.into_packet();
        }
        let packet = last.expect("24 access units complete a MAT frame");
        assert_eq!(&packet.data[8..10], &[0x9E, 0x07]);
        assert_eq!(packet.data.len(), 61440);
        Ok(())
    }

    #[test]
    fn mlp_uses_mat_framing() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Mlp, ByteOrder::Big);
        let mut packets = 0;

        for _ in 0..48 {
            let frame = Frame::new(vec![0u8; 500]);
            if let Status::Complete(packet) = encapsulator.push(frame)? {
                assert_eq!(packet.samples, 3840);
                assert_eq!(packet.burst_header(ByteOrder::Big).map(|h| h.length), Some(61424));
                packets += 1;
            }
        }

        assert_eq!(packets, 2);
        Ok(())
    }

    #[test]
    fn dts_session() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Dts, ByteOrder::Little);
        let mut data = dts_header_be16(31, 1005, 13);
        data.resize(1006, 0);

        let packet = encapsulator
            .push(Frame::new(data))?
            .into_packet()
            .expect("DTS completes per frame");
        assert_eq!(packet.data.len(), 4096);
        assert_eq!(
            packet.burst_header(ByteOrder::Little),
            Some(BurstHeader::new(0x0C, 1006 * 8))
        );

        assert!(matches!(
            encapsulator.push(Frame::new(vec![0u8; 64])),
            Err(EncapsulateError::Header(_))
        ));
        Ok(())
    }

    #[test]
    fn ac3_in_eac3_session_keeps_burst_open() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Eac3, ByteOrder::Big);
        encapsulator.push(eac3_frame(0, 1))?;

        assert!(matches!(
            encapsulator.push(ac3_frame(0))?,
            Status::NeedMoreData
        ));
        assert!(encapsulator.is_building());
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::Eac3 {
                blocks_substream0: 2
            }
        );

        // two more two-block frames reach six blocks and carry the AC-3 payload
        encapsulator.push(eac3_frame(0, 1))?;
        let packet = encapsulator
            .push(eac3_frame(0, 1))?
            .into_packet()
            .expect("six blocks complete the burst");
        assert_eq!(
            packet.burst_header(ByteOrder::Big),
            Some(BurstHeader::new(0x15, 3 * 512 + 1536))
        );
        assert_eq!(&packet.data[8 + 512..8 + 514], &[0x0B, 0x77]);
        Ok(())
    }

    #[test]
    fn eac3_overflow_discards_burst() -> Result<()> {
        let mut encapsulator = Encapsulator::new(Codec::Eac3, ByteOrder::Little);
        // numblkscod 0: one block per 4096 byte frame
        let big = || {
            let mut data = eac3_header(0, 0, 4096, 0).to_vec();
            data.resize(4096, 0x77);
            Frame::new(data)
        };

        for _ in 0..5 {
            assert!(matches!(encapsulator.push(big())?, Status::NeedMoreData));
        }
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::Eac3 {
                blocks_substream0: 5
            }
        );

        assert!(matches!(
            encapsulator.push(big()),
            Err(EncapsulateError::InsufficientSpace { needed: 4096, .. })
        ));
        assert!(!encapsulator.is_building());
        assert_eq!(
            encapsulator.accumulator(),
            Accumulator::Eac3 {
                blocks_substream0: 0
            }
        );
        assert_eq!(encapsulator.error_count(), 1);

        // the next burst needs six fresh blocks
        for _ in 0..2 {
            assert!(matches!(
                encapsulator.push(eac3_frame(0, 1))?,
                Status::NeedMoreData
            ));
        }
        let packet = encapsulator
            .push(eac3_frame(0, 1))?
            .into_packet()
            .expect("six blocks complete the burst");
        assert_eq!(
            packet.burst_header(ByteOrder::Little),
            Some(BurstHeader::new(0x15, 1536))
        );
        Ok(())
    }
}
