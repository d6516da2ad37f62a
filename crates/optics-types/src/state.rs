// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Square pupil-plane grid centred on index `n / 2`.
/// Meshgrid convention: `xx` varies along columns, `yy` along rows.
#[derive(Debug, Clone)]
pub struct PupilGrid {
    pub n: usize,
    pub step: f64,
    pub coords: Array1<f64>, // (i - n/2) · step
    pub xx: Array2<f64>,     // [n, n]
    pub yy: Array2<f64>,     // [n, n]
}

impl PupilGrid {
    pub fn new(n: usize, step: f64) -> Self {
        let half = (n / 2) as f64;
        let coords = Array1::from_shape_fn(n, |i| (i as f64 - half) * step);
        let xx = Array2::from_shape_fn((n, n), |(_, j)| coords[j]);
        let yy = Array2::from_shape_fn((n, n), |(i, _)| coords[i]);
        PupilGrid {
            n,
            step,
            coords,
            xx,
            yy,
        }
    }

    /// ρ² = x² + y²
    pub fn rho2(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n, self.n), |(i, j)| {
            self.xx[[i, j]].powi(2) + self.yy[[i, j]].powi(2)
        })
    }

    /// φ = atan2(y, x)
    pub fn azimuth(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n, self.n), |(i, j)| {
            self.yy[[i, j]].atan2(self.xx[[i, j]])
        })
    }
}

/// Units for image-plane axis coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisUnits {
    Pixels,
    Microns,
}

/// Output of one PSF evaluation.
#[derive(Debug, Clone)]
pub struct PsfResult {
    /// Normalized intensity [n, n]; sums to 1 unless the field carried no energy.
    pub intensity: Array2<f64>,
    /// Complex pupil field the intensity was propagated from [n, n].
    pub pupil: Array2<Complex64>,
    /// Strehl ratio, clamped to [0, 1].
    pub strehl_ratio: f64,
    /// Image-plane pixel size [µm], 0 when undefined.
    pub pixel_size_um: f64,
    /// Image-plane step [canonical units].
    pub object_step: f64,
}

impl PsfResult {
    /// Zero-energy result for an empty aperture.
    pub fn zeros(n: usize, object_step: f64, pixel_size_um: f64) -> Self {
        PsfResult {
            intensity: Array2::zeros((n, n)),
            pupil: Array2::zeros((n, n)),
            strehl_ratio: 0.0,
            pixel_size_um,
            object_step,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.intensity.nrows()
    }

    pub fn energy(&self) -> f64 {
        self.intensity.sum()
    }

    /// Brightest pixel as (row, col, value). The first one wins on ties.
    pub fn peak(&self) -> Option<(usize, usize, f64)> {
        self.intensity
            .indexed_iter()
            .fold(None, |best, ((i, j), &v)| match best {
                Some((_, _, b)) if b >= v => best,
                _ => Some((i, j, v)),
            })
    }

    /// Horizontal cut through the centre row.
    pub fn x_slice(&self) -> Array1<f64> {
        let nrows = self.intensity.nrows();
        if nrows == 0 {
            return Array1::zeros(0);
        }
        self.intensity.row(nrows / 2).to_owned()
    }

    /// Vertical cut through the centre column.
    pub fn y_slice(&self) -> Array1<f64> {
        let ncols = self.intensity.ncols();
        if ncols == 0 {
            return Array1::zeros(0);
        }
        self.intensity.column(ncols / 2).to_owned()
    }

    /// Axis coordinates for plotting the slices or the image.
    ///
    /// Pixels are `i - n/2`. Microns span `±n·px/2`; when the pixel size is
    /// undefined the pixel axis is returned instead, and the second element
    /// reports which units were actually used.
    pub fn axis_coordinates(&self, units: AxisUnits) -> (Array1<f64>, AxisUnits) {
        let n = self.sample_count();
        match units {
            AxisUnits::Microns if self.pixel_size_um > 0.0 => {
                let extent = n as f64 * self.pixel_size_um / 2.0;
                (Array1::linspace(-extent, extent, n), AxisUnits::Microns)
            }
            _ => {
                let half = (n / 2) as f64;
                (
                    Array1::from_shape_fn(n, |i| i as f64 - half),
                    AxisUnits::Pixels,
                )
            }
        }
    }

    /// log10(I + floor), for display with a logarithmic scale.
    pub fn log10_intensity(&self, floor: f64) -> Array2<f64> {
        self.intensity.mapv(|v| (v + floor).log10())
    }

    pub fn pupil_amplitude(&self) -> Array2<f64> {
        self.pupil.mapv(|c| c.norm())
    }

    /// Pupil phase [rad], wrapped to (-π, π].
    pub fn pupil_phase(&self) -> Array2<f64> {
        self.pupil.mapv(|c| c.arg())
    }
}
