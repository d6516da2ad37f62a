// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Strehl
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Strehl ratio estimation.
//!
//! The reference is the diffraction-limited PSF of the same aperture mask,
//! propagated and normalized exactly like the aberrated one. Both PSFs are
//! averaged over a small window centred on `(n/2, n/2)` so that a single
//! sample does not dominate, and the ratio is clamped to [0, 1].

use ndarray::{s, Array2};
use optics_types::config::OpticalSystemParams;
use optics_types::constants::STREHL_WINDOW_HALF_WIDTH;

use crate::propagation::{normalized_intensity, propagate};
use crate::pupil::diffraction_limited_pupil;

/// Mean of the `(2h+1)²` window centred on `(n/2, n/2)`, clipped to the grid.
pub fn central_mean(intensity: &Array2<f64>, half_width: usize) -> f64 {
    let (nrows, ncols) = intensity.dim();
    if nrows == 0 || ncols == 0 {
        return 0.0;
    }
    let (ci, cj) = (nrows / 2, ncols / 2);
    let rows = ci.saturating_sub(half_width)..(ci + half_width + 1).min(nrows);
    let cols = cj.saturating_sub(half_width)..(cj + half_width + 1).min(ncols);
    intensity.slice(s![rows, cols]).mean().unwrap_or(0.0)
}

/// Normalized PSF of the unaberrated aperture described by `params`.
pub fn diffraction_limited_psf(params: &OpticalSystemParams) -> Array2<f64> {
    let pupil = diffraction_limited_pupil(params);
    normalized_intensity(&propagate(&pupil, params.pupil_step, params.object_step))
}

/// Ratio of centred window means, clamped to [0, 1]. 0 when the reference
/// carries no finite energy at the centre.
pub fn strehl_ratio(intensity: &Array2<f64>, reference: &Array2<f64>) -> f64 {
    let ideal = central_mean(reference, STREHL_WINDOW_HALF_WIDTH);
    if !ideal.is_finite() || ideal <= 0.0 {
        return 0.0;
    }
    let actual = central_mean(intensity, STREHL_WINDOW_HALF_WIDTH);
    (actual / ideal).clamp(0.0, 1.0)
}
