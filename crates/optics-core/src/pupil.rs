// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Pupil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Pupil function synthesis.
//!
//! Pupil coordinates are canonical: the aperture edge sits at ρ = 1
//! regardless of NA or wavelength. The field is
//!
//! ```text
//! P(ρ, φ) = mask(ρ ≤ 1) · exp(i·2π·W(ρ, φ))
//! W(ρ, φ) = defocus·(2ρ² − 1) + astigmatism·ρ²·cos(2φ)     [waves]
//! ```

use ndarray::Array2;
use num_complex::Complex64;
use optics_types::config::OpticalSystemParams;
use optics_types::constants::APERTURE_RADIUS;
use optics_types::state::PupilGrid;
use std::f64::consts::PI;

/// Wavefront error [waves] at one pupil point.
pub fn wavefront_error(rho2: f64, phi: f64, defocus: f64, astigmatism: f64) -> f64 {
    defocus * (2.0 * rho2 - 1.0) + astigmatism * rho2 * (2.0 * phi).cos()
}

/// False when the sampling leaves no pupil point inside the aperture.
pub fn has_coverage(params: &OpticalSystemParams) -> bool {
    params.sample_count > 0
        && params.pupil_diameter.is_finite()
        && params.pupil_diameter > 0.0
        && params.pupil_step.is_finite()
        && params.pupil_step > 0.0
}

pub fn is_aberration_free(params: &OpticalSystemParams) -> bool {
    params.defocus == 0.0 && params.astigmatism == 0.0
}

/// Binary aperture, 1.0 where ρ ≤ 1.
pub fn aperture_mask(params: &OpticalSystemParams) -> Array2<f64> {
    let n = params.sample_count;
    if !has_coverage(params) {
        return Array2::zeros((n, n));
    }
    let r2 = APERTURE_RADIUS * APERTURE_RADIUS;
    PupilGrid::new(n, params.pupil_step)
        .rho2()
        .mapv(|v| if v <= r2 { 1.0 } else { 0.0 })
}

/// Complex pupil field for `params`.
pub fn synthesize_pupil(params: &OpticalSystemParams) -> Array2<Complex64> {
    build_pupil(params, params.defocus, params.astigmatism)
}

/// Same aperture with a flat wavefront.
pub fn diffraction_limited_pupil(params: &OpticalSystemParams) -> Array2<Complex64> {
    build_pupil(params, 0.0, 0.0)
}

fn build_pupil(params: &OpticalSystemParams, defocus: f64, astigmatism: f64) -> Array2<Complex64> {
    let n = params.sample_count;
    if !has_coverage(params) {
        return Array2::zeros((n, n));
    }
    let grid = PupilGrid::new(n, params.pupil_step);
    let rho2 = grid.rho2();
    let phi = grid.azimuth();
    let r2 = APERTURE_RADIUS * APERTURE_RADIUS;

    Array2::from_shape_fn((n, n), |(i, j)| {
        let rho2 = rho2[[i, j]];
        if rho2 > r2 {
            return Complex64::new(0.0, 0.0);
        }
        let w = wavefront_error(rho2, phi[[i, j]], defocus, astigmatism);
        Complex64::from_polar(1.0, 2.0 * PI * w)
    })
}
