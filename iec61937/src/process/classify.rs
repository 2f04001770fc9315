use crate::process::{ByteOrder, Codec};
use crate::structs::a52::{A52_FRAME_SAMPLES, A52Header};
use crate::structs::dts::DtsHeader;
use crate::structs::frame::Frame;
use crate::utils::errors::EncapsulateError;

/// Largest AC-3 frame accepted without re-parsing, one full burst.
pub const AC3_MAX_FRAME_SIZE: usize = A52_FRAME_SAMPLES as usize * 4;

/// What the encapsulator needs to know about one input frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Payload bytes to carry, never more than the frame holds.
    pub size: usize,
    pub samples: u32,
    pub input_order: ByteOrder,
    /// Parsed AC-3/E-AC-3 header, when one was needed.
    pub a52: Option<A52Header>,
}

/// Byte order of the 16-bit words in `data` for the given codec.
///
/// Dolby formats are always big-endian; DTS is big-endian only when it starts
/// with one of the big-endian sync words.
pub fn input_byte_order(codec: Codec, data: &[u8]) -> ByteOrder {
    match codec {
        Codec::Ac3 | Codec::Eac3 | Codec::Mlp | Codec::TrueHd => ByteOrder::Big,
        Codec::Dts => match data.first() {
            Some(0x1F) | Some(0x7F) => ByteOrder::Big,
            _ => ByteOrder::Little,
        },
    }
}

/// Resolves size, sample count and byte order of `frame`.
///
/// Pre-tagged frames are trusted as far as each codec allows; the rest are
/// parsed.
pub fn classify(codec: Codec, frame: &Frame) -> Result<FrameInfo, EncapsulateError> {
    let data = frame.as_ref();
    let input_order = input_byte_order(codec, data);

    let (size, samples, a52) = match codec {
        Codec::Ac3 => {
            if (6..=AC3_MAX_FRAME_SIZE).contains(&data.len()) && frame.samples == A52_FRAME_SAMPLES
            {
                (data.len(), frame.samples, None)
            } else {
                let header = parse_a52(data)?;
                if header.is_eac3() {
                    return Err(EncapsulateError::UnexpectedEac3);
                }
                (header.frame_size, header.samples, Some(header))
            }
        }
        // E-AC-3 frame sizes vary, the tags are never trusted
        Codec::Eac3 => {
            let header = parse_a52(data)?;
            (header.frame_size, header.samples, Some(header))
        }
        Codec::Dts => {
            if frame.samples != 0 {
                (data.len(), frame.samples, None)
            } else {
                let header = DtsHeader::parse(data)?;
                check_size(header.frame_size, data.len())?;
                (header.frame_size, header.frame_length, None)
            }
        }
        Codec::Mlp | Codec::TrueHd => (data.len(), frame.samples, None),
    };

    Ok(FrameInfo {
        size,
        samples,
        input_order,
        a52,
    })
}

fn parse_a52(data: &[u8]) -> Result<A52Header, EncapsulateError> {
    let header = A52Header::parse(data)?;
    check_size(header.frame_size, data.len())?;
    Ok(header)
}

fn check_size(size: usize, available: usize) -> Result<(), EncapsulateError> {
    if size > available {
        return Err(EncapsulateError::FrameTruncated { size, available });
    }

    Ok(())
}
