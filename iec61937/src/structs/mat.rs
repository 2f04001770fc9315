//! MAT framing for TrueHD over IEC 61937.
//!
//! TrueHD access units are grouped 24 at a time into one MAT frame of
//! 61440 bytes, each access unit padded out to a 2560-byte slot so the burst
//! rate stays constant. Three marker codes are inserted at fixed offsets.
//! The exact MAT format is undocumented; the offsets below match what
//! receivers are known to accept and must not be rearranged.

/// Access units per MAT frame.
pub const MAT_FRAMES: usize = 24;

/// Slot reserved for each access unit.
pub const MAT_SLOT_SIZE: usize = 2560;

/// Size of a complete MAT frame, including the burst preamble.
pub const MAT_FRAME_SIZE: usize = MAT_SLOT_SIZE * MAT_FRAMES;

/// S/PDIF sample count reported for one MAT frame (8 channels of 16 bits).
pub const MAT_FRAME_SAMPLES: u32 = (MAT_FRAME_SIZE / 16) as u32;

/// Index of the access unit that is followed by the middle code.
pub const MAT_MIDDLE_INDEX: usize = 11;

/// Part of the middle code that eats into the slot before it.
pub const MAT_MIDDLE_OVERLAP: usize = 4;

/// Distance from the end of the MAT frame to the start of the end code.
pub const MAT_END_OFFSET: usize = 24;

pub const MAT_START_CODE: [u8; 20] = [
    0x07, 0x9E, 0x00, 0x03, 0x84, 0x01, 0x01, 0x01, 0x80, 0x00, 0x56, 0xA5, 0x3B, 0xF4, 0x81, 0x83,
    0x49, 0x80, 0x77, 0xE0,
];

pub const MAT_MIDDLE_CODE: [u8; 12] = [
    0xC3, 0xC1, 0x42, 0x49, 0x3B, 0xFA, 0x82, 0x83, 0x49, 0x80, 0x77, 0xE0,
];

pub const MAT_END_CODE: [u8; 16] = [
    0xC3, 0xC2, 0xC0, 0xC4, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x97, 0x11,
];

/// Byte offset of the middle code within the MAT frame.
pub const MAT_MIDDLE_CODE_OFFSET: usize = MAT_SLOT_SIZE * (MAT_MIDDLE_INDEX + 1) - MAT_MIDDLE_OVERLAP;

/// Byte offset of the end code within the MAT frame.
pub const MAT_END_CODE_OFFSET: usize = MAT_FRAME_SIZE - MAT_END_OFFSET;
