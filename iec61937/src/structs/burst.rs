//! IEC 61937 burst preamble.
//!
//! Every data burst starts with four 16-bit words:
//!
//! - **Pa**, **Pb**: sync words `0xF872`, `0x4E1F`
//! - **Pc**: burst info (data type in the low 7 bits, type-dependent bits above)
//! - **Pd**: payload length, in bits or bytes depending on the data type

use crate::process::ByteOrder;

/// Size of the burst preamble in bytes.
pub const SPDIF_HEADER_SIZE: usize = 8;

pub const SYNC_WORD_PA: u16 = 0xF872;
pub const SYNC_WORD_PB: u16 = 0x4E1F;

/// IEC 61937 data types carried in Pc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DataType {
    Ac3 = 0x01,
    Dts1 = 0x0B,
    Dts2 = 0x0C,
    Dts3 = 0x0D,
    Eac3 = 0x15,
    TrueHd = 0x16,
}

impl DataType {
    /// DTS type I/II/III for 512/1024/2048 samples per frame.
    pub fn for_dts_samples(samples: u32) -> Option<Self> {
        match samples {
            512 => Some(Self::Dts1),
            1024 => Some(Self::Dts2),
            2048 => Some(Self::Dts3),
            _ => None,
        }
    }
}

impl From<DataType> for u16 {
    fn from(value: DataType) -> Self {
        value as u16
    }
}

/// Unit of the Pd length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Bytes = 1,
    Bits = 8,
}

impl LengthUnit {
    pub fn multiplier(self) -> usize {
        self as usize
    }
}

/// Decoded burst preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstHeader {
    pub burst_info: u16,
    pub length: u16,
}

impl BurstHeader {
    pub fn new(burst_info: u16, length: u16) -> Self {
        Self { burst_info, length }
    }

    /// Data type bits of Pc.
    pub fn data_type(&self) -> u16 {
        self.burst_info & 0x7F
    }

    /// Type-dependent bits of Pc (bsmod for AC-3).
    pub fn type_dependent(&self) -> u16 {
        self.burst_info >> 8
    }

    pub fn write(&self, order: ByteOrder, dst: &mut [u8]) {
        order.put_u16(&mut dst[0..2], SYNC_WORD_PA);
        order.put_u16(&mut dst[2..4], SYNC_WORD_PB);
        order.put_u16(&mut dst[4..6], self.burst_info);
        order.put_u16(&mut dst[6..8], self.length);
    }

    /// Reads a preamble, returning `None` when the sync words do not match.
    pub fn read(order: ByteOrder, src: &[u8]) -> Option<Self> {
        if src.len() < SPDIF_HEADER_SIZE
            || order.get_u16(&src[0..2]) != SYNC_WORD_PA
            || order.get_u16(&src[2..4]) != SYNC_WORD_PB
        {
            return None;
        }

        Some(Self {
            burst_info: order.get_u16(&src[4..6]),
            length: order.get_u16(&src[6..8]),
        })
    }
}
