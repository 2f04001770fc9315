use crate::process::ByteOrder;
use crate::process::classify::FrameInfo;
use crate::process::encapsulate::Status;
use crate::process::writer::PacketWriter;
use crate::structs::burst::{DataType, LengthUnit, SPDIF_HEADER_SIZE};
use crate::structs::frame::Frame;
use crate::structs::mat::{
    MAT_END_CODE, MAT_END_OFFSET, MAT_FRAME_SAMPLES, MAT_FRAME_SIZE, MAT_FRAMES, MAT_MIDDLE_CODE,
    MAT_MIDDLE_INDEX, MAT_MIDDLE_OVERLAP, MAT_SLOT_SIZE, MAT_START_CODE,
};
use crate::utils::errors::EncapsulateError;

/// Places one TrueHD access unit into the MAT frame being built.
///
/// `frame_index` is the slot (0-23) the access unit goes into. Slots 0, 11,
/// 12 and 23 are shortened to make room for the preamble and the MAT codes;
/// every other slot is padded to [`MAT_SLOT_SIZE`]. Only the last slot
/// completes the burst.
pub fn write_truehd(
    writer: &mut PacketWriter,
    frame_index: &mut usize,
    frame: &Frame,
    info: &FrameInfo,
) -> Result<Status, EncapsulateError> {
    let payload = &frame.as_ref()[..info.size];
    let index = *frame_index;

    if !writer.is_building() {
        writer.begin(frame, MAT_FRAME_SIZE, MAT_FRAME_SAMPLES)?;
    }

    let slot = MAT_SLOT_SIZE as isize;
    let len = info.size as isize;
    let last = MAT_FRAMES - 1;

    let padding = match index {
        0 => {
            writer.write_data(&MAT_START_CODE, ByteOrder::Big)?;
            // the first slot also holds the burst preamble
            slot - len - MAT_START_CODE.len() as isize - SPDIF_HEADER_SIZE as isize
        }
        MAT_MIDDLE_INDEX => slot - len - MAT_MIDDLE_OVERLAP as isize,
        i if i == MAT_MIDDLE_INDEX + 1 => {
            writer.write_data(&MAT_MIDDLE_CODE, ByteOrder::Big)?;
            slot - len - (MAT_MIDDLE_CODE.len() - MAT_MIDDLE_OVERLAP) as isize
        }
        i if i == last => slot - len - MAT_END_OFFSET as isize,
        _ => slot - len,
    };

    let padding = usize::try_from(padding)
        .ok()
        .filter(|padding| info.size + padding <= writer.remaining())
        .ok_or(EncapsulateError::MatSlotOverflow {
            index,
            len: info.size,
            padding,
        })?;

    writer.write_frame(frame, payload, info.input_order)?;
    writer.write_padding(padding)?;

    if index == last {
        writer.write_data(&MAT_END_CODE, ByteOrder::Big)?;
        let packet = writer.finalize(DataType::TrueHd.into(), LengthUnit::Bytes)?;
        *frame_index = 0;
        return Ok(Status::Complete(packet));
    }

    *frame_index += 1;
    Ok(Status::NeedMoreData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::mat::{MAT_END_CODE_OFFSET, MAT_MIDDLE_CODE_OFFSET};

    fn access_unit(len: usize, fill: u8) -> (Frame, FrameInfo) {
        let frame = Frame::new(vec![fill; len]).with_duration(40);
        let info = FrameInfo {
            size: len,
            samples: 40,
            input_order: ByteOrder::Big,
            a52: None,
        };
        (frame, info)
    }

    #[test]
    fn mat_frame_layout() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut index = 0;

        for i in 0..MAT_FRAMES - 1 {
            let (frame, info) = access_unit(1000, i as u8 + 1);
            let status = write_truehd(&mut writer, &mut index, &frame, &info)?;
            assert!(matches!(status, Status::NeedMoreData));
            assert_eq!(index, i + 1);
        }

        let (frame, info) = access_unit(1000, 24);
        let Status::Complete(packet) = write_truehd(&mut writer, &mut index, &frame, &info)? else {
            panic!("24th access unit must complete the MAT frame");
        };
        let data = &packet.data;

        assert_eq!(index, 0);
        assert_eq!(data.len(), 61440);
        assert_eq!(packet.samples, 3840);
        assert_eq!(packet.duration, 24 * 40);
        assert_eq!(&data[..4], &[0xF8, 0x72, 0x4E, 0x1F]);
        assert_eq!(&data[4..6], &[0x00, 0x16]);
        assert_eq!(u16::from_be_bytes([data[6], data[7]]), 61424);

        assert_eq!(&data[8..28], &MAT_START_CODE);
        assert_eq!(data[28], 1);
        assert_eq!(data[2560], 2);
        assert_eq!(data[2560 * 11], 12);
        assert_eq!(
            &data[MAT_MIDDLE_CODE_OFFSET..MAT_MIDDLE_CODE_OFFSET + 12],
            &MAT_MIDDLE_CODE
        );
        assert_eq!(MAT_MIDDLE_CODE_OFFSET, 2560 * 12 - 4);
        assert_eq!(data[2560 * 12 + 8], 13);
        assert_eq!(data[2560 * 13], 14);
        assert_eq!(data[2560 * 23], 24);
        assert_eq!(&data[MAT_END_CODE_OFFSET..MAT_END_CODE_OFFSET + 16], &MAT_END_CODE);
        assert_eq!(MAT_END_CODE_OFFSET, 2560 * 24 - 24);
        assert_eq!(&data[61432..], &[0u8; 8]);
        Ok(())
    }

    #[test]
    fn codes_follow_output_byte_order() -> Result<(), EncapsulateError> {
        let mut writer = PacketWriter::new(ByteOrder::Little);
        let mut index = 0;
        let mut packet = None;

        for _ in 0..MAT_FRAMES {
            let (frame, info) = access_unit(100, 0);
            if let Status::Complete(p) = write_truehd(&mut writer, &mut index, &frame, &info)? {
                packet = Some(p);
            }
        }

        let packet = packet.expect("MAT frame complete after 24 access units");
        let data = &packet.data;
        assert_eq!(&data[..8], &[0x72, 0xF8, 0x1F, 0x4E, 0x16, 0x00, 0xF0, 0xEF]);
        assert_eq!(&data[8..12], &[0x9E, 0x07, 0x03, 0x00]);
        assert_eq!(
            &data[MAT_MIDDLE_CODE_OFFSET..MAT_MIDDLE_CODE_OFFSET + 4],
            &[0xC1, 0xC3, 0x49, 0x42]
        );
        assert_eq!(
            &data[MAT_END_CODE_OFFSET + 12..MAT_END_CODE_OFFSET + 16],
            &[0x00, 0x00, 0x11, 0x97]
        );
        Ok(())
    }

    #[test]
    fn oversized_access_unit_overflows_slot() {
        let mut writer = PacketWriter::new(ByteOrder::Big);
        let mut index = 0;
        let (frame, info) = access_unit(2560 - 27, 0);

        assert!(matches!(
            write_truehd(&mut writer, &mut index, &frame, &info),
            Err(EncapsulateError::MatSlotOverflow {
                index: 0,
                padding: -1,
                ..
            })
        ));
        assert_eq!(index, 0);
    }
}
