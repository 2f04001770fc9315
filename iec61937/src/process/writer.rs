use log::trace;

use crate::process::ByteOrder;
use crate::structs::burst::{BurstHeader, LengthUnit, SPDIF_HEADER_SIZE};
use crate::structs::frame::{Frame, Packet};
use crate::utils::errors::EncapsulateError;

#[derive(Debug, Default)]
enum WriterState {
    #[default]
    Idle,
    Building {
        packet: Packet,
        offset: usize,
    },
}

/// Assembles one IEC 61937 burst at a time.
///
/// The writer is either idle or building a burst of fixed size. Every write is
/// checked against the remaining space before anything is copied, so a failed
/// write leaves the burst untouched.
#[derive(Debug)]
pub struct PacketWriter {
    order: ByteOrder,
    state: WriterState,
}

impl PacketWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            state: WriterState::Idle,
        }
    }

    pub fn output_order(&self) -> ByteOrder {
        self.order
    }

    pub fn is_building(&self) -> bool {
        matches!(self.state, WriterState::Building { .. })
    }

    /// Write offset into the burst being built.
    pub fn offset(&self) -> Option<usize> {
        match &self.state {
            WriterState::Idle => None,
            WriterState::Building { offset, .. } => Some(*offset),
        }
    }

    /// Bytes left in the burst being built, 0 when idle.
    pub fn remaining(&self) -> usize {
        match &self.state {
            WriterState::Idle => 0,
            WriterState::Building { packet, offset } => packet.data.len() - offset,
        }
    }

    /// Starts a burst of `size` bytes, reserving room for the preamble.
    ///
    /// Timestamps are taken from `frame`.
    pub fn begin(&mut self, frame: &Frame, size: usize, samples: u32) -> Result<(), EncapsulateError> {
        if self.is_building() {
            return Err(EncapsulateError::PacketInProgress);
        }
        if size <= SPDIF_HEADER_SIZE || size & 3 != 0 {
            return Err(EncapsulateError::InvalidPacketSize(size));
        }

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| EncapsulateError::Allocation(size))?;
        data.resize(size, 0);

        trace!("Begin burst of {size} bytes, {samples} samples");

        self.state = WriterState::Building {
            packet: Packet {
                data,
                samples,
                pts: frame.pts,
                dts: frame.dts,
                duration: 0,
            },
            offset: SPDIF_HEADER_SIZE,
        };

        Ok(())
    }

    /// Gives the preamble space back to the payload.
    ///
    /// Only valid right after [`begin`](Self::begin).
    pub fn rewind_header(&mut self) -> Result<(), EncapsulateError> {
        match &mut self.state {
            WriterState::Idle => Err(EncapsulateError::NoPacketInProgress),
            WriterState::Building { offset, .. } if *offset == SPDIF_HEADER_SIZE => {
                *offset = 0;
                Ok(())
            }
            WriterState::Building { .. } => Err(EncapsulateError::HeaderRewind),
        }
    }

    /// Copies `data` in 16-bit words, swapping bytes when `input_order`
    /// differs from the output order.
    ///
    /// A trailing odd byte becomes the high byte of one extra word.
    pub fn write_data(&mut self, data: &[u8], input_order: ByteOrder) -> Result<(), EncapsulateError> {
        let order = self.order;
        let (packet, offset) = self.building_mut()?;

        let even = data.len() & !1;
        let needed = even + (data.len() & 1) * 2;
        let remaining = packet.data.len() - *offset;
        if needed > remaining {
            return Err(EncapsulateError::WriteOutOfBounds { needed, remaining });
        }

        let out = &mut packet.data[*offset..*offset + needed];
        if input_order == order {
            out[..even].copy_from_slice(&data[..even]);
        } else {
            for (dst, src) in out[..even]
                .chunks_exact_mut(2)
                .zip(data[..even].chunks_exact(2))
            {
                dst[0] = src[1];
                dst[1] = src[0];
            }
        }

        if let Some(&last) = data.get(even) {
            order.put_u16(&mut out[even..], (last as u16) << 8);
        }

        *offset += needed;
        Ok(())
    }

    /// Writes a frame payload and accounts for its duration.
    pub fn write_frame(
        &mut self,
        frame: &Frame,
        payload: &[u8],
        input_order: ByteOrder,
    ) -> Result<(), EncapsulateError> {
        self.write_data(payload, input_order)?;
        if let WriterState::Building { packet, .. } = &mut self.state {
            packet.duration += frame.duration;
        }

        Ok(())
    }

    /// Appends `size` zero bytes.
    pub fn write_padding(&mut self, size: usize) -> Result<(), EncapsulateError> {
        let (packet, offset) = self.building_mut()?;

        let remaining = packet.data.len() - *offset;
        if size > remaining {
            return Err(EncapsulateError::WriteOutOfBounds {
                needed: size,
                remaining,
            });
        }

        packet.data[*offset..*offset + size].fill(0);
        *offset += size;
        Ok(())
    }

    /// Writes the preamble, zero-fills the rest of the burst and hands it over.
    ///
    /// A `burst_info` of 0 leaves the first 8 bytes to the payload.
    pub fn finalize(&mut self, burst_info: u16, unit: LengthUnit) -> Result<Packet, EncapsulateError> {
        let order = self.order;
        let (packet, offset) = self.building_mut()?;

        if burst_info != 0 {
            if *offset <= SPDIF_HEADER_SIZE {
                return Err(EncapsulateError::EmptyBurst);
            }

            let length = (*offset - SPDIF_HEADER_SIZE) * unit.multiplier();
            let length =
                u16::try_from(length).map_err(|_| EncapsulateError::BurstLengthOverflow(length))?;
            BurstHeader::new(burst_info, length).write(order, &mut packet.data);
        }

        let remaining = packet.data.len() - *offset;
        if remaining > 0 {
            self.write_padding(remaining)?;
        }

        match std::mem::take(&mut self.state) {
            WriterState::Building { packet, offset } => {
                debug_assert_eq!(offset, packet.data.len());
                trace!(
                    "Finalized burst: info {burst_info:#06X}, {} bytes",
                    packet.data.len()
                );
                Ok(packet)
            }
            WriterState::Idle => Err(EncapsulateError::NoPacketInProgress),
        }
    }

    /// Drops the burst being built.
    pub fn reset(&mut self) {
        self.state = WriterState::Idle;
    }

    fn building_mut(&mut self) -> Result<(&mut Packet, &mut usize), EncapsulateError> {
        match &mut self.state {
            WriterState::Idle => Err(EncapsulateError::NoPacketInProgress),
            WriterState::Building { packet, offset } => Ok((packet, offset)),
        }
    }
}
