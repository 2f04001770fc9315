use log::trace;

use crate::process::classify::FrameInfo;
use crate::process::encapsulate::Status;
use crate::process::writer::PacketWriter;
use crate::structs::burst::{DataType, LengthUnit, SPDIF_HEADER_SIZE};
use crate::structs::frame::Frame;
use crate::utils::errors::EncapsulateError;

/// Burst size for a DTS frame of `samples` samples.
pub fn dts_packet_size(samples: u32) -> usize {
    samples as usize * 4
}

/// Wraps one DTS core frame into its own burst.
///
/// A frame that fills the burst on its own (as with 1411 kbit/s streams) is
/// sent without a preamble.
pub fn write_dts(
    writer: &mut PacketWriter,
    frame: &Frame,
    info: &FrameInfo,
) -> Result<Status, EncapsulateError> {
    let payload = &frame.as_ref()[..info.size];

    let data_type = DataType::for_dts_samples(info.samples)
        .ok_or(EncapsulateError::UnsupportedFrameSize(info.samples))?;
    let size = dts_packet_size(info.samples);

    let burst_info = if info.size == size {
        0
    } else if info.size + SPDIF_HEADER_SIZE > size {
        return Err(EncapsulateError::InsufficientSpace {
            needed: info.size,
            available: size - SPDIF_HEADER_SIZE,
        });
    } else {
        u16::from(data_type)
    };

    writer.begin(frame, size, info.samples)?;
    if burst_info == 0 {
        trace!("DTS frame fills the burst, sending without preamble");
        writer.rewind_header()?;
    }
    writer.write_frame(frame, payload, info.input_order)?;

    let packet = writer.finalize(burst_info, LengthUnit::Bits)?;
    Ok(Status::Complete(packet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::classify::classify;
    use crate::process::{ByteOrder, Codec};
    use crate::structs::dts::tests::{dts_header_be16, to_14bit};

    fn dts_frame(nblks: u8, fsize: u16) -> Frame {
        let mut data = dts_header_be16(nblks, fsize, 13);
        data.resize(fsize as usize + 1, 0x33);
        Frame::new(data)
    }

    #[test]
    fn type_follows_samples() -> Result<(), EncapsulateError> {
        for (nblks, samples, pc) in [(15, 512, 0x0B), (31, 1024, 0x0C), (63, 2048, 0x0D)] {
            let frame = dts_frame(nblks, 1005);
            let info = classify(Codec::Dts, &frame)?;
            assert_eq!(info.samples, samples);

            let mut writer = PacketWriter::new(ByteOrder::Big);
            let Status::Complete(packet) = write_dts(&mut writer, &frame, &info)? else {
                panic!("DTS must complete on every frame");
            };

            assert_eq!(packet.data.len(), samples as usize * 4);
            let header = packet.burst_header(ByteOrder::Big).expect("preamble present");
            assert_eq!(header.data_type(), pc);
            assert_eq!(header.length as usize, 1006 * 8);
            assert_eq!(&packet.data[8..12], &[0x7F, 0xFE, 0x80, 0x01]);
        }
        Ok(())
    }

    #[test]
    fn full_burst_frame_has_no_preamble() -> Result<(), EncapsulateError> {
        // 512 samples, 2048 bytes: exactly one burst
        let frame = dts_frame(15, 2047);
        let info = classify(Codec::Dts, &frame)?;
        assert_eq!(info.size, 2048);

        let mut writer = PacketWriter::new(ByteOrder::Little);
        let Status::Complete(packet) = write_dts(&mut writer, &frame, &info)? else {
            panic!("DTS must complete on every frame");
        };

        assert_eq!(packet.data.len(), 2048);
        assert!(packet.burst_header(ByteOrder::Little).is_none());
        // big-endian input swapped into little-endian words
        assert_eq!(&packet.data[..4], &[0xFE, 0x7F, 0x01, 0x80]);
        Ok(())
    }

    #[test]
    fn little_endian_14bit_input_is_kept_in_order() -> Result<(), EncapsulateError> {
        let mut data = to_14bit(&dts_header_be16(15, 1005, 13), true);
        data.resize(1006 * 16 / 14, 0);
        let frame = Frame::new(data);
        let info = classify(Codec::Dts, &frame)?;
        assert_eq!(info.input_order, ByteOrder::Little);

        let mut writer = PacketWriter::new(ByteOrder::Little);
        let Status::Complete(packet) = write_dts(&mut writer, &frame, &info)? else {
            panic!("DTS must complete on every frame");
        };
        assert_eq!(&packet.data[8..14], &[0xFF, 0x1F, 0x00, 0xE8, 0xF0, 0x07]);
        Ok(())
    }

    #[test]
    fn rejects_unsupported_sample_counts() {
        let frame = Frame::new(vec![0u8; 100]).with_samples(256);
        let info = FrameInfo {
            size: 100,
            samples: 256,
            input_order: ByteOrder::Big,
            a52: None,
        };

        let mut writer = PacketWriter::new(ByteOrder::Big);
        assert!(matches!(
            write_dts(&mut writer, &frame, &info),
            Err(EncapsulateError::UnsupportedFrameSize(256))
        ));
        assert!(!writer.is_building());
    }

    #[test]
    fn rejects_frames_between_fit_and_full() {
        let frame = Frame::new(vec![0u8; 2044]).with_samples(512);
        let info = FrameInfo {
            size: 2044,
            samples: 512,
            input_order: ByteOrder::Big,
            a52: None,
        };

        let mut writer = PacketWriter::new(ByteOrder::Big);
        assert!(matches!(
            write_dts(&mut writer, &frame, &info),
            Err(EncapsulateError::InsufficientSpace { needed: 2044, .. })
        ));
    }
}
