//! Data structures for the formats handled by the encapsulator.

pub mod a52;
pub mod burst;
pub mod dts;
pub mod frame;
pub mod mat;
