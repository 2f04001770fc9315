use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use spdifenc_macros::{ToBytes, riff_chunk};

use crate::join_bytes_le;

pub const RIFF_ID: [u8; 4] = *b"RIFF";
pub const WAVE_ID: [u8; 4] = *b"WAVE";
pub const DATA_ID: [u8; 4] = *b"data";

const WAVE_FORMAT_PCM: u16 = 1;

/// A RIFF chunk: 4-byte id, 32-bit little-endian size, body, pad byte.
pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data = self.chunk_data();
        let size = u32::try_from(data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "RIFF chunk too large"))?;

        writer.write_all(self.chunk_id())?;
        writer.write_all(&size.to_le_bytes())?;
        writer.write_all(&data)?;
        if data.len() & 1 != 0 {
            writer.write_all(&[0])?;
        }
        Ok(())
    }
}

#[riff_chunk(b"fmt ")]
#[derive(Debug, Clone, PartialEq, ToBytes)]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    /// 16-bit PCM, the only layout IEC 61937 bursts are carried in.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        let block_align = channels * 2;
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: 16,
        }
    }
}

/// RIFF/WAVE writer for 16-bit PCM carrying IEC 61937 bursts (.wav extension)
pub struct WAVWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: FormatChunk,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WAVWriter<W> {
    pub fn new(writer: W, sample_rate: u32, channels: u16) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format: FormatChunk::pcm16(sample_rate, channels),
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
        }
    }

    /// Write RIFF, fmt and data chunk headers; sizes are patched by `finish`
    pub fn write_header(&mut self) -> io::Result<()> {
        self.riff_size_position = self.writer.stream_position()? + 4;
        self.writer.write_all(&join_bytes_le!(RIFF_ID, 0u32, WAVE_ID))?;

        self.format.write_all(&mut self.writer)?;

        self.data_size_position = self.writer.stream_position()? + 4;
        self.writer.write_all(&join_bytes_le!(DATA_ID, 0u32))?;

        Ok(())
    }

    /// Append burst data to the data chunk
    pub fn write_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.data_written += data.len() as u64;
        Ok(())
    }

    /// Finish writing and update chunk sizes
    pub fn finish(&mut self) -> io::Result<()> {
        if self.data_written & 1 != 0 {
            self.writer.write_all(&[0])?;
        }
        self.writer.flush()?;

        let end = self.writer.stream_position()?;
        let too_large =
            |_| io::Error::new(io::ErrorKind::InvalidData, "WAV data exceeds 4 GiB");
        let data_size = u32::try_from(self.data_written).map_err(too_large)?;
        let riff_size = u32::try_from(end - self.riff_size_position - 4).map_err(too_large)?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        Ok(())
    }

    /// Get the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }
}
