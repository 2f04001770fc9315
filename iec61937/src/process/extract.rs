use crate::log_or_err;
use crate::process::Codec;
use crate::structs::a52::{A52_SYNC_WORD, A52Header};
use crate::structs::dts::{DtsHeader, DtsSync};
use crate::structs::frame::Frame;
use crate::utils::errors::{ExtractError, HeaderError};
use log::{debug, trace};
use std::collections::VecDeque;

/// Major sync signature of TrueHD/MLP access units, found 4 bytes in.
const MAJOR_SYNC: [u8; 3] = [0xF8, 0x72, 0x6F];
const FORMAT_SYNC_TRUEHD: u8 = 0xBA;
const FORMAT_SYNC_MLP: u8 = 0xBB;

/// Smallest plausible access unit: header plus one substream directory entry.
const MIN_ACCESS_UNIT: usize = 8;

/// Stream parameters picked up from the headers seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    /// Channel count including LFE, unknown for TrueHD/MLP.
    pub channels: Option<u8>,
}

/// Splits a raw elementary stream into frames for the encapsulator.
///
/// AC-3, E-AC-3 and DTS frames are found by their sync words and sized from
/// their headers. TrueHD and MLP access units are chained by their length
/// field once a major sync has been seen. Bytes that belong to no frame are
/// dropped and reported according to the configured fail level.
///
/// Frames come out with their sample count set and timestamps counted in
/// samples from the start of the stream.
///
/// # Example
///
/// ```rust,no_run
/// use iec61937::process::Codec;
/// use iec61937::process::extract::Extractor;
///
/// let mut extractor = Extractor::new(Codec::Ac3);
/// extractor.push_bytes(&std::fs::read("stream.ac3")?);
///
/// for frame in &mut extractor {
///     let frame = frame?;
///     println!("{} bytes, {} samples", frame.len(), frame.samples);
/// }
/// extractor.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Extractor {
    codec: Codec,
    buffer: VecDeque<u8>,
    locked: bool,
    stream_info: Option<StreamInfo>,
    position: i64,
    frames_processed: usize,
    error_count: usize,
    pub(crate) fail_level: log::Level,
}

impl Extractor {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            buffer: VecDeque::with_capacity(120_000),
            locked: false,
            stream_info: None,
            position: 0,
            frames_processed: 0,
            error_count: 0,
            fail_level: log::Level::Error,
        }
    }

    /// Adds raw bitstream data to the internal buffer.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Sets the failure level for stream errors.
    ///
    /// - `log::Level::Error`: skipped bytes and bad headers are only logged (default)
    /// - `log::Level::Warn`: they are returned as errors (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.stream_info
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Bytes buffered but not yet part of an extracted frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drops whatever is left once the input has ended.
    pub fn finish(&mut self) -> Result<(), ExtractError> {
        let leftover = self.buffer.len();
        if leftover > 0 {
            self.consume_front(leftover);
            self.error_count += 1;
            log_or_err!(self, log::Level::Warn, ExtractError::SkippedBytes(leftover));
        }

        Ok(())
    }

    fn consume_front(&mut self, cnt: usize) {
        self.buffer.drain(..cnt);
    }

    /// Drops `cnt` bytes that are not part of any frame.
    fn skip(&mut self, cnt: usize) -> Result<(), ExtractError> {
        if cnt == 0 {
            return Ok(());
        }

        self.consume_front(cnt);
        self.error_count += 1;
        log_or_err!(self, log::Level::Warn, ExtractError::SkippedBytes(cnt));

        Ok(())
    }

    /// Bytes kept at the end of the buffer while searching, enough to hold a
    /// sync pattern split across two pushes.
    fn sync_tail(&self) -> usize {
        match self.codec {
            Codec::Ac3 | Codec::Eac3 => 1,
            Codec::Dts => 5,
            Codec::Mlp | Codec::TrueHd => 7,
        }
    }

    fn find_sync(&mut self) -> Option<usize> {
        let codec = self.codec;
        let data = self.buffer.make_contiguous();

        match codec {
            Codec::Ac3 | Codec::Eac3 => data
                .windows(2)
                .position(|w| u16::from_be_bytes([w[0], w[1]]) == A52_SYNC_WORD),
            Codec::Dts => (0..data.len()).find(|&i| DtsSync::detect(&data[i..]).is_some()),
            Codec::Mlp | Codec::TrueHd => data.windows(8).position(|w| {
                w[4..7] == MAJOR_SYNC && matches!(w[7], FORMAT_SYNC_TRUEHD | FORMAT_SYNC_MLP)
            }),
        }
    }

    /// Size and sample count of the frame at the front of the buffer.
    fn frame_at_front(&mut self) -> Result<(usize, u32), HeaderError> {
        let data = self.buffer.make_contiguous();

        let (size, samples, info) = match self.codec {
            Codec::Ac3 | Codec::Eac3 => {
                let header = A52Header::parse(data)?;
                let info = StreamInfo {
                    sample_rate: header.sample_rate,
                    channels: Some(header.channels),
                };
                (header.frame_size, header.samples, info)
            }
            Codec::Dts => {
                let header = DtsHeader::parse(data)?;
                let info = StreamInfo {
                    sample_rate: header.sample_rate,
                    channels: Some(header.channels),
                };
                (header.frame_size, header.frame_length, info)
            }
            Codec::Mlp | Codec::TrueHd => return self.access_unit_at_front(),
        };

        self.update_stream_info(info);
        Ok((size, samples))
    }

    fn access_unit_at_front(&mut self) -> Result<(usize, u32), HeaderError> {
        let data = self.buffer.make_contiguous();
        if data.len() < 2 {
            return Err(HeaderError::TooShort {
                needed: 2,
                available: data.len(),
            });
        }

        let size = ((u16::from_be_bytes([data[0], data[1]]) & 0xFFF) << 1) as usize;

        // a major sync header reaches at least up to the sample rate byte
        let needed = size.min(10);
        if data.len() < needed {
            return Err(HeaderError::TooShort {
                needed,
                available: data.len(),
            });
        }

        if size >= 10 && data[4..7] == MAJOR_SYNC {
            let code = match data[7] {
                FORMAT_SYNC_TRUEHD => data[8] >> 4,
                FORMAT_SYNC_MLP => data[9] >> 4,
                _ => return Err(HeaderError::InvalidSync),
            };
            let sample_rate = match code {
                0..=2 => 48000 << code,
                8..=10 => 44100 << (code - 8),
                _ => return Err(HeaderError::InvalidSampleRateCode(code)),
            };
            self.update_stream_info(StreamInfo {
                sample_rate,
                channels: None,
            });
        }

        let samples = self.stream_info.map_or(0, |info| {
            let base = if info.sample_rate % 44100 == 0 { 44100 } else { 48000 };
            40 * info.sample_rate / base
        });

        Ok((size, samples))
    }

    fn update_stream_info(&mut self, info: StreamInfo) {
        if self.stream_info != Some(info) {
            debug!(
                "{} stream: {} Hz, {} channels",
                self.codec,
                info.sample_rate,
                info.channels
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string())
            );
            self.stream_info = Some(info);
        }
    }

    fn resync(&mut self) -> Result<(), ExtractError> {
        self.locked = false;

        let Some(offset) = self.find_sync() else {
            let cnt = self.buffer.len().saturating_sub(self.sync_tail());
            self.skip(cnt)?;
            return Err(ExtractError::InsufficientData);
        };

        self.skip(offset)?;
        self.locked = true;

        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, ExtractError> {
        loop {
            if !self.locked {
                self.resync()?;
            }

            let (size, samples) = match self.frame_at_front() {
                Ok(frame) => frame,
                Err(HeaderError::TooShort { .. }) => return Err(ExtractError::InsufficientData),
                Err(err) => {
                    self.locked = false;
                    self.error_count += 1;
                    self.consume_front(1);
                    log_or_err!(self, log::Level::Warn, ExtractError::InvalidHeader(err));
                    continue;
                }
            };

            if size < MIN_ACCESS_UNIT {
                self.locked = false;
                self.error_count += 1;
                self.consume_front(1);
                log_or_err!(
                    self,
                    log::Level::Warn,
                    ExtractError::InvalidAccessUnitLength(size)
                );
                continue;
            }

            if self.buffer.len() < size {
                return Err(ExtractError::InsufficientData);
            }

            // A52 and DTS frames are located by sync word every time
            if !matches!(self.codec, Codec::Mlp | Codec::TrueHd) {
                self.locked = false;
            }

            let data: Vec<u8> = self.buffer.drain(..size).collect();
            let frame = Frame::new(data)
                .with_samples(samples)
                .with_timestamps(Some(self.position), Some(self.position))
                .with_duration(samples as u64);

            trace!(
                "Extracted {} frame at sample {}: {size} bytes",
                self.codec, self.position
            );

            self.position += samples as i64;
            self.frames_processed += 1;
            return Ok(frame);
        }
    }
}

impl Iterator for Extractor {
    type Item = Result<Frame, ExtractError>;

    /// Yields the next complete frame, or `None` once more input is needed.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(ExtractError::InsufficientData) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
