use crate::process::classify::FrameInfo;
use crate::process::encapsulate::Status;
use crate::process::writer::PacketWriter;
use crate::structs::a52::A52_FRAME_SAMPLES;
use crate::structs::burst::{DataType, LengthUnit, SPDIF_HEADER_SIZE};
use crate::structs::frame::Frame;
use crate::utils::errors::EncapsulateError;

/// One AC-3 burst spans one sync frame period.
pub const AC3_PACKET_SIZE: usize = A52_FRAME_SAMPLES as usize * 4;

/// Wraps a single AC-3 sync frame into its own burst.
///
/// Pc carries `bsmod` in its type-dependent bits.
pub fn write_ac3(
    writer: &mut PacketWriter,
    frame: &Frame,
    info: &FrameInfo,
) -> Result<Status, EncapsulateError> {
    let payload = &frame.as_ref()[..info.size];

    if info.size + SPDIF_HEADER_SIZE > AC3_PACKET_SIZE {
        return Err(EncapsulateError::InsufficientSpace {
            needed: info.size,
            available: AC3_PACKET_SIZE - SPDIF_HEADER_SIZE,
        });
    }

    writer.begin(frame, AC3_PACKET_SIZE, A52_FRAME_SAMPLES)?;
    writer.write_frame(frame, payload, info.input_order)?;

    let bsmod = payload.get(5).map_or(0, |b| (b & 0x7) as u16);
    let packet = writer.finalize(u16::from(DataType::Ac3) | (bsmod << 8), LengthUnit::Bits)?;

    Ok(Status::Complete(packet))
}
