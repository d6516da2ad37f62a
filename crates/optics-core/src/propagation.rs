// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Propagation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fourier propagation from the pupil plane to the image plane.

use ndarray::Array2;
use num_complex::Complex64;
use optics_math::fft::{fftshift, ifft2, ifftshift};

/// Image-plane amplitude of a centred pupil field.
///
/// ifftshift → ifft2 → fftshift keeps the zero frequency at `(n/2, n/2)` in
/// both planes. The result is scaled by `pupil_step / object_step`, the
/// continuous-to-discrete transform factor; 0 when either step is not
/// positive.
pub fn propagate(pupil: &Array2<Complex64>, pupil_step: f64, object_step: f64) -> Array2<Complex64> {
    let mut field = fftshift(&ifft2(&ifftshift(pupil)));
    let scale = if pupil_step > 0.0 && object_step > 0.0 {
        pupil_step / object_step
    } else {
        0.0
    };
    field.mapv_inplace(|c| c * scale);
    field
}

/// |field|² divided by its total. A field with no energy comes back as
/// the zero array.
pub fn normalized_intensity(field: &Array2<Complex64>) -> Array2<f64> {
    let mut intensity = field.mapv(|c| c.norm_sqr());
    let energy = intensity.sum();
    if energy > 0.0 {
        intensity.mapv_inplace(|v| v / energy);
    }
    intensity
}
