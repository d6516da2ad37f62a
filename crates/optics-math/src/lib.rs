//! Mathematical primitives for SCPN Optics Core.

pub mod fft;
