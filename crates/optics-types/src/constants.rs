// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Side length of the square sampling grid.
pub const DEFAULT_SAMPLE_COUNT: usize = 512;

/// Wavelength [µm]. Green-yellow, peak photopic response.
pub const DEFAULT_WAVELENGTH_UM: f64 = 0.555;

/// Back aperture (numerical aperture), dimensionless.
pub const DEFAULT_NUMERICAL_APERTURE: f64 = 0.5;

pub const DEFAULT_MAGNIFICATION: f64 = 1.0;

/// Pupil coverage of the grid [canonical units].
pub const DEFAULT_PUPIL_DIAMETER: f64 = 8.0;

/// Aperture edge radius in canonical pupil units.
pub const APERTURE_RADIUS: f64 = 1.0;

/// Half-width [px] of the centred window averaged by the Strehl estimate.
/// 1 gives a 3×3 window.
pub const STREHL_WINDOW_HALF_WIDTH: usize = 1;

/// Floor added before taking log10 of an intensity map.
pub const LOG_INTENSITY_FLOOR: f64 = 1e-10;
