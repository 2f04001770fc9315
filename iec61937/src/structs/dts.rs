//! DTS core frame headers.
//!
//! A DTS core stream may be stored with 16-bit or 14-bit words, in either
//! byte order. The sync word identifies the layout:
//!
//! | Layout     | Leading bytes            |
//! |------------|--------------------------|
//! | 16-bit BE  | `7F FE 80 01`            |
//! | 16-bit LE  | `FE 7F 01 80`            |
//! | 14-bit BE  | `1F FF E8 00 07 Fx`      |
//! | 14-bit LE  | `FF 1F 00 E8 Fx 07`      |
//!
//! Headers are normalised to the 16-bit big-endian layout before the fields
//! are read.

use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// Bytes needed to parse a core header in any layout.
pub const DTS_HEADER_SIZE: usize = 14;

const DTS_SAMPLE_RATES: [u32; 16] = [
    0, 8000, 16000, 32000, 0, 0, 11025, 22050, 44100, 0, 0, 12000, 24000, 48000, 0, 0,
];

const AMODE_CHANNELS: [u8; 16] = [1, 2, 2, 2, 2, 3, 3, 4, 4, 5, 6, 6, 6, 7, 8, 8];

/// Storage layout of a DTS core stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtsSync {
    Be16,
    Le16,
    Be14,
    Le14,
}

impl DtsSync {
    /// Identifies the layout from the sync word at the start of `buf`.
    pub fn detect(buf: &[u8]) -> Option<Self> {
        match buf {
            [0x7F, 0xFE, 0x80, 0x01, ..] => Some(Self::Be16),
            [0xFE, 0x7F, 0x01, 0x80, ..] => Some(Self::Le16),
            [0x1F, 0xFF, 0xE8, 0x00, 0x07, b5, ..] if b5 & 0xF0 == 0xF0 => Some(Self::Be14),
            [0xFF, 0x1F, 0x00, 0xE8, b4, 0x07, ..] if b4 & 0xF0 == 0xF0 => Some(Self::Le14),
            _ => None,
        }
    }

    pub fn is_big_endian(self) -> bool {
        matches!(self, Self::Be16 | Self::Be14)
    }

    pub fn is_14bit(self) -> bool {
        matches!(self, Self::Be14 | Self::Le14)
    }

    /// Rewrites the first [`DTS_HEADER_SIZE`] bytes into the 16-bit big-endian layout.
    fn normalize(self, buf: &[u8]) -> [u8; DTS_HEADER_SIZE] {
        let mut out = [0u8; DTS_HEADER_SIZE];
        let words = buf[..DTS_HEADER_SIZE].chunks_exact(2).map(|pair| {
            if self.is_big_endian() {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        });

        if !self.is_14bit() {
            for (dst, word) in out.chunks_exact_mut(2).zip(words) {
                dst.copy_from_slice(&word.to_be_bytes());
            }
            return out;
        }

        let mut acc = 0u32;
        let mut bits = 0;
        let mut pos = 0;
        for word in words {
            acc = (acc << 14) | (word & 0x3FFF) as u32;
            bits += 14;
            while bits >= 8 {
                bits -= 8;
                out[pos] = (acc >> bits) as u8;
                pos += 1;
            }
            acc &= (1 << bits) - 1;
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtsHeader {
    pub sync: DtsSync,
    /// `FTYPE`: false for termination frames.
    pub normal_frame: bool,
    pub deficit_samples: u8,
    pub crc_present: bool,
    /// PCM sample blocks of 32 samples (`NBLKS + 1`).
    pub blocks: u8,
    /// Frame size in bytes, as stored (14-bit layouts are 16/14 larger).
    pub frame_size: usize,
    /// Samples per channel in this frame.
    pub frame_length: u32,
    pub amode: u8,
    pub sample_rate: u32,
    pub bitrate_code: u8,
    pub lfe: bool,
    pub channels: u8,
}

impl DtsHeader {
    /// Parses the core header at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < DTS_HEADER_SIZE {
            return Err(HeaderError::TooShort {
                needed: DTS_HEADER_SIZE,
                available: buf.len(),
            });
        }

        let sync = DtsSync::detect(buf).ok_or(HeaderError::InvalidSync)?;
        let header = sync.normalize(buf);
        let reader = &mut BsIoSliceReader::from_slice(&header);

        reader.skip_n(32)?;
        let normal_frame = reader.get()?;
        let deficit_samples: u8 = reader.get_n(5)?;
        let crc_present = reader.get()?;
        let nblks: u8 = reader.get_n(7)?;
        let fsize: u16 = reader.get_n(14)?;
        let amode: u8 = reader.get_n(6)?;
        let sfreq: u8 = reader.get_n(4)?;
        let bitrate_code: u8 = reader.get_n(5)?;
        // fixed bit, DYNF, TIMEF, AUXF, HDCD, EXT_AUDIO_ID, EXT_AUDIO, ASPF
        reader.skip_n(10)?;
        let lff: u8 = reader.get_n(2)?;

        if nblks < 5 {
            return Err(HeaderError::DtsTooFewBlocks(nblks));
        }
        if fsize < 95 {
            return Err(HeaderError::DtsFrameTooSmall(fsize));
        }

        let sample_rate = DTS_SAMPLE_RATES[sfreq as usize];
        if sample_rate == 0 {
            return Err(HeaderError::DtsInvalidSampleRate(sfreq));
        }

        let mut frame_size = fsize as usize + 1;
        if sync.is_14bit() {
            frame_size = frame_size * 16 / 14;
        }

        let lfe = lff == 1 || lff == 2;
        let channels = AMODE_CHANNELS.get(amode as usize).copied().unwrap_or(0) + lfe as u8;

        trace!(
            "DTS header ({sync:?}): {frame_size} bytes, {} samples @ {sample_rate} Hz, amode {amode}",
            (nblks as u32 + 1) * 32
        );

        Ok(Self {
            sync,
            normal_frame,
            deficit_samples,
            crc_present,
            blocks: nblks + 1,
            frame_size,
            frame_length: (nblks as u32 + 1) * 32,
            amode,
            sample_rate,
            bitrate_code,
            lfe,
            channels,
        })
    }
}
