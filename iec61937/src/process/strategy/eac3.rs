use log::debug;

use crate::process::classify::FrameInfo;
use crate::process::encapsulate::Status;
use crate::process::writer::PacketWriter;
use crate::structs::a52::StreamType;
use crate::structs::burst::{DataType, LengthUnit};
use crate::structs::frame::Frame;
use crate::utils::errors::EncapsulateError;

/// S/PDIF sample frames per E-AC-3 burst, four times the AC-3 rate.
pub const EAC3_SPDIF_SAMPLES: u32 = 6144;

pub const EAC3_PACKET_SIZE: usize = EAC3_SPDIF_SAMPLES as usize * 4;

/// Audio blocks that make up one complete burst.
const BLOCKS_PER_BURST: u32 = 6;

/// Appends an E-AC-3 sync frame to the burst being accumulated.
///
/// Independent and AC-3-convert sync frames with fewer than six blocks are
/// gathered until substream 0 has contributed six blocks (A/52 Annex E,
/// 2.3.1.2). `blocks_substream0` keeps that count between calls.
pub fn write_eac3(
    writer: &mut PacketWriter,
    blocks_substream0: &mut u32,
    frame: &Frame,
    info: &FrameInfo,
) -> Result<Status, EncapsulateError> {
    let payload = &frame.as_ref()[..info.size];

    if !writer.is_building() {
        writer.begin(frame, EAC3_PACKET_SIZE, EAC3_SPDIF_SAMPLES)?;
    }

    if info.size > writer.remaining() {
        return Err(EncapsulateError::InsufficientSpace {
            needed: info.size,
            available: writer.remaining(),
        });
    }

    writer.write_frame(frame, payload, info.input_order)?;

    let eac3 = info
        .a52
        .as_ref()
        .and_then(|header| header.eac3.map(|eac3| (eac3, header.blocks_per_sync_frame)));

    match eac3 {
        Some((eac3, blocks))
            if matches!(
                eac3.strmtyp,
                StreamType::Independent | StreamType::Ac3Convert
            ) && blocks != 6 =>
        {
            if eac3.substreamid == 0 {
                *blocks_substream0 += blocks as u32;
            }

            if *blocks_substream0 != BLOCKS_PER_BURST {
                return Ok(Status::NeedMoreData);
            }
            *blocks_substream0 = 0;
        }
        Some(_) => {}
        None => {
            debug!("AC-3 sync frame in E-AC-3 stream, keeping burst open");
            return Ok(Status::NeedMoreData);
        }
    }

    let packet = writer.finalize(DataType::Eac3.into(), LengthUnit::Bytes)?;
    Ok(Status::Complete(packet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::classify::classify;
    use crate::process::{ByteOrder, Codec};
    use crate::structs::a52::tests::eac3_header;

    fn eac3_frame(strmtyp: u8, substreamid: u8, size: usize, numblkscod: u8) -> Frame {
        let mut data = eac3_header(strmtyp, substreamid, size, numblkscod).to_vec();
        data.resize(size, 0x22);
        Frame::new(data)
    }

    fn push(
        writer: &mut PacketWriter,
        blocks: &mut u32,
        frame: &Frame,
    ) -> Result<Status, EncapsulateError> {
        let info = classify(Codec::Eac3, frame)?;
        write_eac3(writer, blocks, frame, &info)
    }

    #[test]
    fn six_block_frames_emit_immediately() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut blocks = 0;

        let status = push(&mut writer, &mut blocks, &eac3_frame(0, 0, 1536, 3))?;
        let Status::Complete(packet) = status else {
            panic!("six-block frame must complete the burst");
        };

        assert_eq!(packet.data.len(), EAC3_PACKET_SIZE);
        assert_eq!(packet.samples, EAC3_SPDIF_SAMPLES);
        // Pc = 0x15, Pd = 1536 bytes
        assert_eq!(&packet.data[..8], &[0xF8, 0x72, 0x4E, 0x1F, 0x00, 0x15, 0x06, 0x00]);
        assert_eq!(blocks, 0);
        Ok(())
    }

    #[test]
    fn accumulates_until_six_blocks() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut blocks = 0;
        let frame = eac3_frame(0, 0, 512, 1);

        for expected in [2, 4] {
            assert!(matches!(
                push(&mut writer, &mut blocks, &frame)?,
                Status::NeedMoreData
            ));
            assert_eq!(blocks, expected);
        }

        let Status::Complete(packet) = push(&mut writer, &mut blocks, &frame)? else {
            panic!("third two-block frame must complete the burst");
        };
        assert_eq!(blocks, 0);
        // Pd = 3 * 512 bytes
        assert_eq!(&packet.data[6..8], &[0x06, 0x00]);
        assert_eq!(&packet.data[8 + 512..8 + 514], &[0x0B, 0x77]);
        assert_eq!(&packet.data[8 + 1024..8 + 1026], &[0x0B, 0x77]);
        Ok(())
    }

    #[test]
    fn only_substream0_counts() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut blocks = 0;

        push(&mut writer, &mut blocks, &eac3_frame(0, 0, 256, 2))?;
        assert!(matches!(
            push(&mut writer, &mut blocks, &eac3_frame(0, 1, 256, 2))?,
            Status::NeedMoreData
        ));
        assert_eq!(blocks, 3);

        assert!(matches!(
            push(&mut writer, &mut blocks, &eac3_frame(0, 0, 256, 2))?,
            Status::Complete(_)
        ));
        Ok(())
    }

    #[test]
    fn dependent_frames_emit_immediately() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut blocks = 0;

        assert!(matches!(
            push(&mut writer, &mut blocks, &eac3_frame(1, 0, 256, 0))?,
            Status::Complete(_)
        ));
        assert_eq!(blocks, 0);
        Ok(())
    }

    #[test]
    fn overflowing_frame_is_rejected() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut blocks = 0;
        // one block per frame: five fit, the sixth does not
        let big = eac3_frame(0, 0, 4096, 0);

        for _ in 0..5 {
            assert!(matches!(
                push(&mut writer, &mut blocks, &big)?,
                Status::NeedMoreData
            ));
        }
        assert_eq!(writer.remaining(), EAC3_PACKET_SIZE - 8 - 5 * 4096);

        assert!(matches!(
            push(&mut writer, &mut blocks, &big),
            Err(EncapsulateError::InsufficientSpace { needed: 4096, .. })
        ));
        Ok(())
    }
}
