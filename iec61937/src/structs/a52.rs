//! AC-3 and E-AC-3 sync frame headers.
//!
//! Both syntaxes start with the 16-bit syncword `0x0B77` and carry `bsid` at
//! the same bit position (40), which is what tells them apart:
//!
//! - `bsid <= 10`: AC-3 (ATSC A/52 main body), 1536 samples per sync frame.
//! - `10 < bsid <= 16`: E-AC-3 (A/52 Annex E), 1 to 6 audio blocks of 256
//!   samples per sync frame.

use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// AC-3/E-AC-3 syncword.
pub const A52_SYNC_WORD: u16 = 0x0B77;

/// Bytes needed to parse either header flavour.
pub const A52_HEADER_SIZE: usize = 8;

/// Samples carried by one AC-3 sync frame.
pub const A52_FRAME_SAMPLES: u32 = 1536;

/// Samples per audio block.
pub const A52_BLOCK_SAMPLES: u32 = 256;

const AC3_BITRATES_KBPS: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Frame sizes in 16-bit words at 44.1 kHz, indexed by `frmsizecod`.
const AC3_FRAME_WORDS_44100: [u32; 38] = [
    69, 70, 87, 88, 104, 105, 121, 122, 139, 140, 174, 175, 208, 209, 243, 244, 278, 279, 348,
    349, 417, 418, 487, 488, 557, 558, 696, 697, 835, 836, 975, 976, 1114, 1115, 1253, 1254, 1393,
    1394,
];

const FULL_SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];
const REDUCED_SAMPLE_RATES: [u32; 3] = [24000, 22050, 16000];
const EAC3_BLOCKS: [u8; 4] = [1, 2, 3, 6];
const ACMOD_CHANNELS: [u8; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// E-AC-3 `strmtyp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Independent,
    Dependent,
    Ac3Convert,
}

impl TryFrom<u8> for StreamType {
    type Error = HeaderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Independent),
            1 => Ok(Self::Dependent),
            2 => Ok(Self::Ac3Convert),
            _ => Err(HeaderError::ReservedStreamType),
        }
    }
}

/// Fields only present in E-AC-3 sync frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eac3Info {
    pub strmtyp: StreamType,
    pub substreamid: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A52Header {
    pub bsid: u8,
    /// Bitstream mode, AC-3 only (0 for E-AC-3).
    pub bsmod: u8,
    pub acmod: u8,
    pub lfeon: bool,
    pub sample_rate: u32,
    /// Full-bandwidth channels plus LFE.
    pub channels: u8,
    /// Sync frame size in bytes.
    pub frame_size: usize,
    pub samples: u32,
    pub blocks_per_sync_frame: u8,
    pub eac3: Option<Eac3Info>,
}

impl A52Header {
    /// Parses the sync frame header at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < A52_HEADER_SIZE {
            return Err(HeaderError::TooShort {
                needed: A52_HEADER_SIZE,
                available: buf.len(),
            });
        }

        if u16::from_be_bytes([buf[0], buf[1]]) != A52_SYNC_WORD {
            return Err(HeaderError::InvalidSync);
        }

        let bsid = buf[5] >> 3;
        let reader = &mut BsIoSliceReader::from_slice(&buf[..A52_HEADER_SIZE]);
        reader.skip_n(16)?;

        let header = match bsid {
            0..=10 => Self::read_ac3(reader, bsid)?,
            11..=16 => Self::read_eac3(reader)?,
            _ => return Err(HeaderError::UnsupportedBsid(bsid)),
        };

        trace!(
            "{} header: {} bytes, {} samples @ {} Hz, acmod {}, lfe {}",
            if header.is_eac3() { "E-AC-3" } else { "AC-3" },
            header.frame_size,
            header.samples,
            header.sample_rate,
            header.acmod,
            header.lfeon
        );

        Ok(header)
    }

    pub fn is_eac3(&self) -> bool {
        self.eac3.is_some()
    }

    fn read_ac3(reader: &mut BsIoSliceReader, bsid: u8) -> Result<Self, HeaderError> {
        reader.skip_n(16)?; // crc1

        let fscod: u8 = reader.get_n(2)?;
        let frmsizecod: u8 = reader.get_n(6)?;
        if fscod == 3 {
            return Err(HeaderError::InvalidSampleRateCode(fscod));
        }
        if frmsizecod >= 38 {
            return Err(HeaderError::InvalidFrameSizeCode(frmsizecod));
        }

        reader.skip_n(5)?; // bsid, already known
        let bsmod: u8 = reader.get_n(3)?;
        let acmod: u8 = reader.get_n(3)?;

        if acmod & 1 != 0 && acmod != 1 {
            reader.skip_n(2)?; // cmixlev
        }
        if acmod & 4 != 0 {
            reader.skip_n(2)?; // surmixlev
        }
        if acmod == 2 {
            reader.skip_n(2)?; // dsurmod
        }
        let lfeon = reader.get()?;

        let kbps = AC3_BITRATES_KBPS[(frmsizecod >> 1) as usize];
        let words = match fscod {
            0 => kbps * 2,
            1 => AC3_FRAME_WORDS_44100[frmsizecod as usize],
            _ => kbps * 3,
        };

        // bsid 9 and 10 signal half and quarter sample rates
        let rate_shift = bsid.saturating_sub(8);

        Ok(Self {
            bsid,
            bsmod,
            acmod,
            lfeon,
            sample_rate: FULL_SAMPLE_RATES[fscod as usize] >> rate_shift,
            channels: ACMOD_CHANNELS[acmod as usize] + lfeon as u8,
            frame_size: words as usize * 2,
            samples: A52_FRAME_SAMPLES,
            blocks_per_sync_frame: 6,
            eac3: None,
        })
    }

    fn read_eac3(reader: &mut BsIoSliceReader) -> Result<Self, HeaderError> {
        let strmtyp = StreamType::try_from(reader.get_n::<u8>(2)?)?;
        let substreamid: u8 = reader.get_n(3)?;
        let frmsiz: u16 = reader.get_n(11)?;
        let fscod: u8 = reader.get_n(2)?;

        let (sample_rate, blocks) = if fscod == 3 {
            let fscod2: u8 = reader.get_n(2)?;
            if fscod2 == 3 {
                return Err(HeaderError::InvalidSampleRateCode(fscod2));
            }
            (REDUCED_SAMPLE_RATES[fscod2 as usize], 6)
        } else {
            let numblkscod: u8 = reader.get_n(2)?;
            (
                FULL_SAMPLE_RATES[fscod as usize],
                EAC3_BLOCKS[numblkscod as usize],
            )
        };

        let acmod: u8 = reader.get_n(3)?;
        let lfeon = reader.get()?;
        let bsid: u8 = reader.get_n(5)?;

        Ok(Self {
            bsid,
            bsmod: 0,
            acmod,
            lfeon,
            sample_rate,
            channels: ACMOD_CHANNELS[acmod as usize] + lfeon as u8,
            frame_size: (frmsiz as usize + 1) * 2,
            samples: blocks as u32 * A52_BLOCK_SAMPLES,
            blocks_per_sync_frame: blocks,
            eac3: Some(Eac3Info {
                strmtyp,
                substreamid,
            }),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// AC-3 header: 48 kHz, frmsizecod 28 (384 kbps), bsid 8, bsmod `bsmod`, 3/2 + LFE.
    pub(crate) fn ac3_header(bsmod: u8) -> [u8; 8] {
        [
            0x0B,
            0x77,
            0x00,
            0x00,
            0x1C,
            (8 << 3) | (bsmod & 7),
            0xF1, // acmod 7, cmixlev, surmixlev, lfeon
            0x00,
        ]
    }

    /// E-AC-3 header with the given stream type, substream id, frame size and block code.
    pub(crate) fn eac3_header(
        strmtyp: u8,
        substreamid: u8,
        frame_size: usize,
        numblkscod: u8,
    ) -> [u8; 8] {
        let frmsiz = (frame_size / 2 - 1) as u16;
        let b2 = (strmtyp << 6) | (substreamid << 3) | (frmsiz >> 8) as u8;
        let b3 = frmsiz as u8;
        // fscod 0 (48 kHz), numblkscod, acmod 7, lfeon 1
        let b4 = (numblkscod << 4) | (7 << 1) | 1;
        let b5 = 16 << 3;
        [0x0B, 0x77, b2, b3, b4, b5, 0x00, 0x00]
    }

    #[test]
    fn parse_ac3() -> Result<(), HeaderError> {
        let header = A52Header::parse(&ac3_header(3))?;

        assert!(!header.is_eac3());
        assert_eq!(header.frame_size, 1536);
        assert_eq!(header.samples, 1536);
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.bsmod, 3);
        assert_eq!(header.acmod, 7);
        assert!(header.lfeon);
        assert_eq!(header.channels, 6);
        Ok(())
    }

    #[test]
    fn ac3_frame_size_at_44100() -> Result<(), HeaderError> {
        let mut buf = ac3_header(0);
        buf[4] = (1 << 6) | 37; // 44.1 kHz, 640 kbps, odd code
        let header = A52Header::parse(&buf)?;

        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.frame_size, 1394 * 2);
        Ok(())
    }

    #[test]
    fn parse_eac3() -> Result<(), HeaderError> {
        let header = A52Header::parse(&eac3_header(0, 0, 512, 1))?;

        let info = header.eac3.expect("E-AC-3 info");
        assert_eq!(info.strmtyp, StreamType::Independent);
        assert_eq!(info.substreamid, 0);
        assert_eq!(header.frame_size, 512);
        assert_eq!(header.blocks_per_sync_frame, 2);
        assert_eq!(header.samples, 512);
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.bsid, 16);
        assert_eq!(header.channels, 6);
        Ok(())
    }

    #[test]
    fn eac3_reduced_rate_has_six_blocks() -> Result<(), HeaderError> {
        let mut buf = eac3_header(2, 1, 256, 0);
        buf[4] = (3 << 6) | (1 << 4) | (2 << 1); // fscod 3, fscod2 1, acmod 2
        let header = A52Header::parse(&buf)?;

        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.blocks_per_sync_frame, 6);
        assert_eq!(header.channels, 2);
        assert_eq!(
            header.eac3,
            Some(Eac3Info {
                strmtyp: StreamType::Ac3Convert,
                substreamid: 1
            })
        );
        Ok(())
    }

    #[test]
    fn rejects_invalid_headers() {
        assert!(matches!(
            A52Header::parse(&[0x0B, 0x77, 0x00]),
            Err(HeaderError::TooShort { .. })
        ));

        let mut buf = ac3_header(0);
        buf[0] = 0x0C;
        assert!(matches!(A52Header::parse(&buf), Err(HeaderError::InvalidSync)));

        let mut buf = ac3_header(0);
        buf[5] = 20 << 3;
        assert!(matches!(
            A52Header::parse(&buf),
            Err(HeaderError::UnsupportedBsid(20))
        ));

        let mut buf = ac3_header(0);
        buf[4] = 0xC0;
        assert!(matches!(
            A52Header::parse(&buf),
            Err(HeaderError::InvalidSampleRateCode(3))
        ));

        let buf = eac3_header(3, 0, 512, 3);
        assert!(matches!(
            A52Header::parse(&buf),
            Err(HeaderError::ReservedStreamType)
        ));
    }
}
