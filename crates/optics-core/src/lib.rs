//! Point spread function engine.
//!
//! Pupil synthesis, Fourier propagation to the image plane, energy
//! normalization and Strehl ratio estimation, plus parallel evaluation of
//! parameter tables.

pub mod batch;
pub mod engine;
pub mod propagation;
pub mod pupil;
pub mod strehl;
