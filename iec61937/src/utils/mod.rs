//! Utility functions and supporting infrastructure.
//!
//! Provides bitstream reading for header parsing and the error types
//! shared by the parsers, the extractor and the encapsulator.

pub mod bitstream_io;
pub mod errors;
