//! IEC 61937 encapsulation of compressed audio for S/PDIF and HDMI.
//!
//! ## Technical Overview
//!
//! IEC 61937 carries compressed audio over a PCM link by packing each frame
//! into a fixed-size data burst that occupies the same time as the PCM it
//! replaces. A burst is an 8-byte preamble (Pa, Pb, Pc, Pd) followed by the
//! payload and zero stuffing.
//!
//! ### Supported Formats
//!
//! - AC-3: one sync frame per 6144-byte burst
//! - E-AC-3: sync frames gathered until six audio blocks fill a 24576-byte burst
//! - DTS core (type I/II/III): one frame per burst of `samples x 4` bytes
//! - TrueHD and MLP: 24 access units per 61440-byte MAT frame
//!
//! Output words are written little-endian (`SPDIFL`) or big-endian (`SPDIFB`).
//!
//! ## Quick Start
//!
//! 1. Split a raw stream into frames using [`process::extract::Extractor`]
//! 2. Wrap frames into bursts using [`process::encapsulate::Encapsulator`]
//!
//! ```rust,no_run
//! use iec61937::process::encapsulate::{Encapsulator, Status};
//! use iec61937::process::extract::Extractor;
//! use iec61937::process::{ByteOrder, Codec};
//!
//! let mut extractor = Extractor::new(Codec::Eac3);
//! let mut encapsulator = Encapsulator::new(Codec::Eac3, ByteOrder::Little);
//!
//! extractor.push_bytes(&std::fs::read("stream.eac3")?);
//!
//! for frame in &mut extractor {
//!     match encapsulator.push(frame?) {
//!         Ok(Status::Complete(packet)) => {
//!             // Send packet.data over the link
//!         }
//!         Ok(Status::NeedMoreData) => {}
//!         Err(err) => eprintln!("Frame dropped: {err}"),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Encapsulation pipeline.
///
/// 1. **Extraction** ([`process::extract`]): Splits raw elementary streams
///    into frames.
///
/// 2. **Classification** ([`process::classify`]): Recovers frame size, sample
///    count and byte order.
///
/// 3. **Encapsulation** ([`process::encapsulate`]): Per-codec packing into
///    bursts through [`process::writer`].
pub mod process;

/// Bitstream headers and burst layouts.
///
/// - **A/52** ([`structs::a52`]): AC-3 and E-AC-3 sync frame headers
/// - **DTS** ([`structs::dts`]): Core frame headers in all four layouts
/// - **Burst** ([`structs::burst`]): IEC 61937 preamble and data types
/// - **MAT** ([`structs::mat`]): TrueHD MAT frame layout and codes
/// - **Frames** ([`structs::frame`]): Input frames and output packets
pub mod structs;

/// Supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
