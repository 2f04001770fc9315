//! Packing policies, one per IEC 61937 data type family.
//!
//! | Codec        | Burst size            | Frames per burst       | Pd unit |
//! |--------------|-----------------------|------------------------|---------|
//! | AC-3         | 6144                  | 1                      | bits    |
//! | E-AC-3       | 24576                 | up to 6 audio blocks   | bytes   |
//! | TrueHD / MLP | 61440 (MAT frame)     | 24                     | bytes   |
//! | DTS          | samples x 4           | 1                      | bits    |

pub mod ac3;
pub mod dts;
pub mod eac3;
pub mod truehd;
