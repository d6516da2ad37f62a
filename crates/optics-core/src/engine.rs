// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! PSF engine.
//!
//! [`compute_psf`] is the stateless entry point: one parameter snapshot in,
//! one [`PsfResult`] out. [`PsfEngine`] wraps it for interactive callers
//! that want to inspect the last pupil and PSF after the fact; it is not
//! meant to be shared between threads.
//!
//! Algorithm:
//! 1. Synthesize the pupil field (aperture mask · aberration phase)
//! 2. Propagate: ifftshift → ifft2 → fftshift, scaled by pupil/object step
//! 3. Intensity |E|², normalized to unit energy when energy > 0
//! 4. Strehl ratio against the diffraction-limited PSF of the same mask

use log::{debug, warn};
use ndarray::Array2;
use num_complex::Complex64;
use optics_types::config::OpticalSystemParams;
use optics_types::state::PsfResult;

use crate::propagation::{normalized_intensity, propagate};
use crate::pupil::{has_coverage, is_aberration_free, synthesize_pupil};
use crate::strehl::{diffraction_limited_psf, strehl_ratio};

/// Evaluate one parameter set.
///
/// Never fails: an empty aperture or a field without energy gives the zero
/// array and a Strehl ratio of 0. Parameters should be validated by the
/// caller beforehand.
pub fn compute_psf(params: &OpticalSystemParams) -> PsfResult {
    let n = params.sample_count;
    let pixel_size_um = params.image_plane_pixel_size_um();
    debug!(
        "PSF n={} pupil_step={:.6} object_step={:.6} defocus={} astigmatism={}",
        n, params.pupil_step, params.object_step, params.defocus, params.astigmatism
    );

    if !has_coverage(params) {
        warn!(
            "empty aperture (pupil_diameter={}, pupil_step={}); returning zero-energy PSF",
            params.pupil_diameter, params.pupil_step
        );
        return PsfResult::zeros(n, params.object_step, pixel_size_um);
    }

    let pupil = synthesize_pupil(params);
    let field = propagate(&pupil, params.pupil_step, params.object_step);
    let intensity = normalized_intensity(&field);

    let strehl = if intensity.sum() <= 0.0 {
        warn!(
            "propagated field carries no energy (object_step={})",
            params.object_step
        );
        0.0
    } else if is_aberration_free(params) {
        // A flat wavefront is its own diffraction-limited reference
        strehl_ratio(&intensity, &intensity)
    } else {
        strehl_ratio(&intensity, &diffraction_limited_psf(params))
    };
    debug!("PSF strehl={strehl:.6} pixel={pixel_size_um:.6} um");

    PsfResult {
        intensity,
        pupil,
        strehl_ratio: strehl,
        pixel_size_um,
        object_step: params.object_step,
    }
}

/// Stateful convenience wrapper keeping the last result for display.
#[derive(Debug, Default)]
pub struct PsfEngine {
    last: Option<PsfResult>,
}

impl PsfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `params` and remember the result, replacing the previous one.
    pub fn compute(&mut self, params: &OpticalSystemParams) -> &PsfResult {
        self.last.insert(compute_psf(params))
    }

    pub fn last_result(&self) -> Option<&PsfResult> {
        self.last.as_ref()
    }

    pub fn last_pupil(&self) -> Option<&Array2<Complex64>> {
        self.last.as_ref().map(|r| &r.pupil)
    }

    pub fn last_intensity(&self) -> Option<&Array2<f64>> {
        self.last.as_ref().map(|r| &r.intensity)
    }

    /// Image-plane pixel size [µm] of the last call, 0 before the first.
    pub fn last_pixel_size_um(&self) -> f64 {
        self.last.as_ref().map_or(0.0, |r| r.pixel_size_um)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(defocus: f64) -> OpticalSystemParams {
        OpticalSystemParams {
            sample_count: 128,
            wavelength: 0.555,
            numerical_aperture: 0.5,
            magnification: 1.0,
            defocus,
            astigmatism: 0.0,
            pupil_diameter: 8.0,
            ..Default::default()
        }
        .recompute_from_pupil_diameter()
    }

    #[test]
    fn test_focused_scenario() {
        let r = compute_psf(&scenario(0.0));
        assert_eq!(r.intensity.dim(), (128, 128));
        assert!((r.energy() - 1.0).abs() < 1e-9);
        let (i, j, _) = r.peak().unwrap();
        assert_eq!((i, j), (64, 64));
        assert!(r.strehl_ratio >= 0.95);
        assert_eq!(r.strehl_ratio, 1.0);
        // object_step = 1/8 → 0.125 · 0.555 / 0.5
        assert!((r.pixel_size_um - 0.13875).abs() < 1e-12);
    }

    #[test]
    fn test_defocused_scenario() {
        let focused = compute_psf(&scenario(0.0));
        let defocused = compute_psf(&scenario(0.5));
        assert!((defocused.energy() - 1.0).abs() < 1e-9);
        assert!(defocused.strehl_ratio < 0.8, "strehl {}", defocused.strehl_ratio);
        let (_, _, peak_focused) = focused.peak().unwrap();
        let (_, _, peak_defocused) = defocused.peak().unwrap();
        assert!(peak_defocused < peak_focused);
    }

    #[test]
    fn test_strehl_decreases_with_defocus() {
        let strehl: Vec<f64> = [0.0, 0.1, 0.2, 0.3]
            .iter()
            .map(|&d| compute_psf(&scenario(d)).strehl_ratio)
            .collect();
        for w in strehl.windows(2) {
            assert!(w[1] < w[0], "Strehl not decreasing: {strehl:?}");
        }
        // Maréchal: exp(-(2π·0.1/√3)²) ≈ 0.88
        assert!(strehl[1] > 0.8 && strehl[1] < 0.95, "strehl(0.1) = {}", strehl[1]);
    }

    #[test]
    fn test_defocus_sign_symmetry() {
        let plus = compute_psf(&scenario(0.35));
        let minus = compute_psf(&scenario(-0.35));
        let max_diff = plus
            .intensity
            .iter()
            .zip(minus.intensity.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(max_diff < 1e-12, "max |I(d) - I(-d)| = {max_diff}");
        assert!((plus.strehl_ratio - minus.strehl_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_focused_psf_grid_symmetry() {
        let r = compute_psf(&scenario(0.0));
        let c = 64usize;
        let peak = r.intensity[[c, c]];
        for a in 0..20usize {
            for b in 0..20usize {
                let v = r.intensity[[c + a, c + b]];
                assert!((v - r.intensity[[c + b, c + a]]).abs() < 1e-12 * peak);
                assert!((v - r.intensity[[c - a, c + b]]).abs() < 1e-12 * peak);
                assert!((v - r.intensity[[c + a, c - b]]).abs() < 1e-12 * peak);
            }
        }
    }

    #[test]
    fn test_astigmatism_is_twofold() {
        let p = OpticalSystemParams {
            astigmatism: 0.25,
            ..scenario(0.0)
        };
        let r = compute_psf(&p);
        assert!((r.energy() - 1.0).abs() < 1e-9);
        assert!(r.strehl_ratio < 1.0);
        let c = 64usize;
        let peak = r.peak().unwrap().2;
        // cos(2φ) is even in x and in y
        for a in 0..16usize {
            for b in 0..16usize {
                let v = r.intensity[[c + a, c + b]];
                assert!((v - r.intensity[[c - a, c + b]]).abs() < 1e-12 * peak);
                assert!((v - r.intensity[[c + a, c - b]]).abs() < 1e-12 * peak);
            }
        }
    }

    #[test]
    fn test_degenerate_aperture() {
        let p = OpticalSystemParams {
            pupil_diameter: 0.0,
            ..scenario(0.2)
        };
        let r = compute_psf(&p);
        assert_eq!(r.intensity.dim(), (128, 128));
        assert!(r.intensity.iter().all(|&v| v == 0.0));
        assert_eq!(r.strehl_ratio, 0.0);
    }

    #[test]
    fn test_zero_object_step_gives_zero_energy() {
        let p = OpticalSystemParams {
            object_step: 0.0,
            ..scenario(0.0)
        };
        let r = compute_psf(&p);
        assert_eq!(r.energy(), 0.0);
        assert_eq!(r.strehl_ratio, 0.0);
        assert_eq!(r.pixel_size_um, 0.0);
    }

    #[test]
    fn test_engine_keeps_last_result() {
        let mut engine = PsfEngine::new();
        assert!(engine.last_pupil().is_none());
        assert_eq!(engine.last_pixel_size_um(), 0.0);

        let strehl = engine.compute(&scenario(0.0)).strehl_ratio;
        assert_eq!(strehl, 1.0);
        assert_eq!(engine.last_pupil().unwrap().dim(), (128, 128));
        assert!((engine.last_pixel_size_um() - 0.13875).abs() < 1e-12);

        let p = OpticalSystemParams {
            magnification: 2.0,
            ..scenario(0.5)
        };
        engine.compute(&p);
        let last = engine.last_result().unwrap();
        assert!(last.strehl_ratio < 0.8);
        assert!((engine.last_pixel_size_um() - 0.069375).abs() < 1e-12);
        assert!((engine.last_intensity().unwrap().sum() - 1.0).abs() < 1e-9);

        engine.clear();
        assert!(engine.last_result().is_none());
    }
}
