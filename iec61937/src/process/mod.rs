use std::fmt::Display;

/// Frame classification and header recovery.
///
/// Decides the input byte order of a frame and, for frames that were not
/// tagged upstream, parses the AC-3 or DTS header to find the frame size and
/// sample count.
pub mod classify;

/// Session driving one codec's encapsulation.
///
/// Provides the [`Encapsulator`](encapsulate::Encapsulator) which turns
/// [`Frame`](crate::structs::frame::Frame)s into complete IEC 61937
/// [`Packet`](crate::structs::frame::Packet)s.
pub mod encapsulate;

/// Elementary stream splitting.
///
/// Provides the [`Extractor`](extract::Extractor) for finding sync patterns
/// in raw AC-3, E-AC-3, DTS and TrueHD streams.
pub mod extract;

/// Per-codec packing policies.
pub mod strategy;

/// Low-level burst assembly shared by every strategy.
pub mod writer;

/// Order of the bytes within each 16-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// S/PDIF little-endian (`SPDIFL`).
    #[default]
    Little,
    /// S/PDIF big-endian (`SPDIFB`).
    Big,
}

impl ByteOrder {
    #[inline(always)]
    pub fn put_u16(self, dst: &mut [u8], value: u16) {
        let bytes = match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        dst[..2].copy_from_slice(&bytes);
    }

    #[inline(always)]
    pub fn get_u16(self, src: &[u8]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes([src[0], src[1]]),
            ByteOrder::Big => u16::from_be_bytes([src[0], src[1]]),
        }
    }
}

impl Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little-endian"),
            ByteOrder::Big => write!(f, "big-endian"),
        }
    }
}

/// Compressed formats accepted by the encapsulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Ac3,
    Eac3,
    Dts,
    /// Meridian Lossless Packing, carried exactly like TrueHD.
    Mlp,
    TrueHd,
}

impl Codec {
    /// Sample rate and channel count of the S/PDIF link carrying this codec.
    pub fn spdif_layout(self, stream_rate: u32) -> (u32, u16) {
        match self {
            Codec::Ac3 | Codec::Dts => (stream_rate, 2),
            Codec::Eac3 => (stream_rate * 4, 2),
            Codec::Mlp | Codec::TrueHd => {
                if stream_rate % 44100 == 0 {
                    (176400, 8)
                } else {
                    (192000, 8)
                }
            }
        }
    }
}

impl Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Codec::Ac3 => "AC-3",
            Codec::Eac3 => "E-AC-3",
            Codec::Dts => "DTS",
            Codec::Mlp => "MLP",
            Codec::TrueHd => "TrueHD",
        };
        write!(f, "{name}")
    }
}
