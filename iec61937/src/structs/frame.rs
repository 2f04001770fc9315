//! Input frames and output bursts.

use std::sync::Arc;

use crate::process::ByteOrder;
use crate::structs::burst::BurstHeader;

/// One compressed audio frame handed to the encapsulator.
///
/// `samples == 0` means the frame was not tagged by an upstream packetizer and
/// the encapsulator has to parse the header itself.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Arc<[u8]>,
    pub samples: u32,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: u64,
}

impl Frame {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            data: data.into(),
            samples: 0,
            pts: None,
            dts: None,
            duration: 0,
        }
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_timestamps(mut self, pts: Option<i64>, dts: Option<i64>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A complete IEC 61937 burst, padded to its fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    /// S/PDIF sample frames covered by this burst.
    pub samples: u32,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    /// Sum of the durations of the frames carried.
    pub duration: u64,
}

impl Packet {
    /// Burst preamble, or `None` for headerless DTS bursts.
    pub fn burst_header(&self, order: ByteOrder) -> Option<BurstHeader> {
        BurstHeader::read(order, &self.data)
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
