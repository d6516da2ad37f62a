// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Optical system parameters and the sampling model.
//!
//! Four quantities describe how the square grid samples the pupil and image
//! planes: pupil diameter, pupil step, object step and image step. One of
//! them is authoritative, the other three follow from
//!
//! ```text
//! pupil_diameter = pupil_step · n
//! pupil_step · n · object_step = 1
//! image_step = object_step
//! ```
//!
//! All lengths are canonical units (aperture edge at radius 1) except the
//! wavelength, which is in microns.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAGNIFICATION, DEFAULT_NUMERICAL_APERTURE, DEFAULT_PUPIL_DIAMETER,
    DEFAULT_SAMPLE_COUNT, DEFAULT_WAVELENGTH_UM,
};
use crate::error::{OpticsError, OpticsResult};

/// Legacy key names accepted when loading records.
const KEY_ALIASES: [(&str, &str); 5] = [
    ("size", "sample_count"),
    ("back_aperture", "numerical_aperture"),
    ("step_pupil", "pupil_step"),
    ("step_object", "object_step"),
    ("step_image", "image_step"),
];

/// Which sampling quantity drives the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingSource {
    #[default]
    PupilDiameter,
    PupilStep,
    ObjectStep,
    ImageStep,
}

impl fmt::Display for SamplingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SamplingSource::PupilDiameter => "pupil_diameter",
            SamplingSource::PupilStep => "pupil_step",
            SamplingSource::ObjectStep => "object_step",
            SamplingSource::ImageStep => "image_step",
        };
        f.write_str(name)
    }
}

impl FromStr for SamplingSource {
    type Err = OpticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pupil_diameter" | "diameter" => Ok(SamplingSource::PupilDiameter),
            "pupil_step" | "step_pupil" => Ok(SamplingSource::PupilStep),
            "object_step" | "step_object" => Ok(SamplingSource::ObjectStep),
            "image_step" | "step_image" => Ok(SamplingSource::ImageStep),
            _ => Err(OpticsError::UnknownSamplingSource(s.to_string())),
        }
    }
}

/// Physical and discretization parameters of one PSF evaluation.
///
/// A plain value: the `recompute_from_*` family returns a new record and
/// never touches `self`. Unknown JSON keys are ignored and missing keys take
/// the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalSystemParams {
    /// Side length of the square grid.
    #[serde(alias = "size")]
    pub sample_count: usize,
    /// Wavelength [µm].
    pub wavelength: f64,
    #[serde(alias = "back_aperture")]
    pub numerical_aperture: f64,
    pub magnification: f64,
    /// Balanced defocus coefficient [waves].
    pub defocus: f64,
    /// Astigmatism coefficient [waves].
    pub astigmatism: f64,
    pub pupil_diameter: f64,
    #[serde(alias = "step_pupil")]
    pub pupil_step: f64,
    #[serde(alias = "step_object")]
    pub object_step: f64,
    #[serde(alias = "step_image")]
    pub image_step: f64,
}

impl Default for OpticalSystemParams {
    fn default() -> Self {
        OpticalSystemParams {
            sample_count: DEFAULT_SAMPLE_COUNT,
            wavelength: DEFAULT_WAVELENGTH_UM,
            numerical_aperture: DEFAULT_NUMERICAL_APERTURE,
            magnification: DEFAULT_MAGNIFICATION,
            defocus: 0.0,
            astigmatism: 0.0,
            pupil_diameter: DEFAULT_PUPIL_DIAMETER,
            pupil_step: DEFAULT_PUPIL_DIAMETER / DEFAULT_SAMPLE_COUNT as f64,
            object_step: 1.0 / DEFAULT_PUPIL_DIAMETER,
            image_step: 1.0 / DEFAULT_PUPIL_DIAMETER,
        }
        .recompute_from_pupil_diameter()
    }
}

impl OpticalSystemParams {
    /// Pupil diameter is authoritative: `pupil_step = D / n`, then the
    /// object and image steps follow. No-op for `n == 0`, a non-finite or
    /// non-positive diameter, or derived steps that would not be finite.
    pub fn recompute_from_pupil_diameter(&self) -> Self {
        if self.sample_count == 0 || !usable_step(self.pupil_diameter) {
            return *self;
        }
        let n = self.sample_count as f64;
        let pupil_step = self.pupil_diameter / n;
        let object_step = 1.0 / (pupil_step * n);
        if !usable_step(pupil_step) || !usable_step(object_step) {
            return *self;
        }
        let mut next = *self;
        next.pupil_step = pupil_step;
        next.object_step = object_step;
        next.image_step = object_step;
        next
    }

    /// Pupil step is authoritative: `D = pupil_step · n`.
    pub fn recompute_from_pupil_step(&self) -> Self {
        if self.sample_count == 0 || !usable_step(self.pupil_step) {
            return *self;
        }
        let n = self.sample_count as f64;
        let pupil_diameter = self.pupil_step * n;
        let object_step = 1.0 / pupil_diameter;
        if !usable_step(pupil_diameter) || !usable_step(object_step) {
            return *self;
        }
        let mut next = *self;
        next.pupil_diameter = pupil_diameter;
        next.object_step = object_step;
        next.image_step = object_step;
        next
    }

    /// Object step is authoritative: `pupil_step = 1 / (object_step · n)`.
    pub fn recompute_from_object_step(&self) -> Self {
        self.derive_from_object_step(self.object_step).unwrap_or(*self)
    }

    /// Image step is authoritative. The object step is set equal to it and
    /// the pupil side follows as in [`Self::recompute_from_object_step`].
    pub fn recompute_from_image_step(&self) -> Self {
        self.derive_from_object_step(self.image_step).unwrap_or(*self)
    }

    fn derive_from_object_step(&self, object_step: f64) -> Option<Self> {
        if self.sample_count == 0 || !usable_step(object_step) {
            return None;
        }
        let n = self.sample_count as f64;
        let pupil_step = 1.0 / (object_step * n);
        let pupil_diameter = pupil_step * n;
        if !usable_step(pupil_step) || !usable_step(pupil_diameter) {
            return None;
        }
        let mut next = *self;
        next.object_step = object_step;
        next.image_step = object_step;
        next.pupil_step = pupil_step;
        next.pupil_diameter = pupil_diameter;
        Some(next)
    }

    pub fn recompute_from(&self, source: SamplingSource) -> Self {
        match source {
            SamplingSource::PupilDiameter => self.recompute_from_pupil_diameter(),
            SamplingSource::PupilStep => self.recompute_from_pupil_step(),
            SamplingSource::ObjectStep => self.recompute_from_object_step(),
            SamplingSource::ImageStep => self.recompute_from_image_step(),
        }
    }

    /// Set the authoritative sampling field and re-derive the others.
    ///
    /// Returns `self` unchanged when the new value cannot drive a consistent
    /// record: non-positive, non-finite, an empty grid, or derived steps
    /// that overflow.
    pub fn with_sampling(&self, source: SamplingSource, value: f64) -> Self {
        if self.sample_count == 0 || !usable_step(value) {
            return *self;
        }
        let mut next = *self;
        match source {
            SamplingSource::PupilDiameter => next.pupil_diameter = value,
            SamplingSource::PupilStep => next.pupil_step = value,
            SamplingSource::ObjectStep => next.object_step = value,
            SamplingSource::ImageStep => next.image_step = value,
        }
        let derived = next.recompute_from(source);
        if derived.is_sampling_consistent(1e-9) {
            derived
        } else {
            *self
        }
    }

    /// Change the grid size, keeping `source` fixed and re-deriving the rest.
    pub fn with_sample_count(&self, sample_count: usize, source: SamplingSource) -> Self {
        if sample_count == 0 {
            return *self;
        }
        let mut next = *self;
        next.sample_count = sample_count;
        next.recompute_from(source)
    }

    /// True when the three sampling relations hold within `rel_tol`.
    pub fn is_sampling_consistent(&self, rel_tol: f64) -> bool {
        if self.sample_count == 0 {
            return false;
        }
        let n = self.sample_count as f64;
        approx_eq(self.pupil_diameter, self.pupil_step * n, rel_tol)
            && approx_eq(self.pupil_step * n * self.object_step, 1.0, rel_tol)
            && approx_eq(self.object_step, self.image_step, rel_tol)
    }

    /// Physical size of one image-plane pixel [µm].
    ///
    /// `object_step · λ / (M · NA)`: canonical units to waves, waves to
    /// microns, then referred to the focal plane. 0 when any divisor or the
    /// image step is not positive.
    pub fn image_plane_pixel_size_um(&self) -> f64 {
        if self.image_step > 0.0
            && self.wavelength > 0.0
            && self.numerical_aperture > 0.0
            && self.magnification > 0.0
        {
            self.object_step * self.wavelength / (self.magnification * self.numerical_aperture)
        } else {
            0.0
        }
    }

    /// Boundary validation for records coming from files or tables.
    ///
    /// A zero pupil diameter passes: it describes an empty aperture, which
    /// the engine turns into a zero-energy PSF.
    pub fn validate(&self) -> OpticsResult<()> {
        if self.sample_count == 0 {
            return Err(OpticsError::ParamError(
                "sample_count must be >= 1".to_string(),
            ));
        }
        require_positive("wavelength", self.wavelength)?;
        require_positive("numerical_aperture", self.numerical_aperture)?;
        require_positive("magnification", self.magnification)?;
        require_finite("defocus", self.defocus)?;
        require_finite("astigmatism", self.astigmatism)?;
        if !self.pupil_diameter.is_finite() || self.pupil_diameter < 0.0 {
            return Err(OpticsError::ParamError(format!(
                "pupil_diameter must be finite and >= 0, got {}",
                self.pupil_diameter
            )));
        }
        require_positive("pupil_step", self.pupil_step)?;
        require_positive("object_step", self.object_step)?;
        require_positive("image_step", self.image_step)?;
        Ok(())
    }

    /// Flat key/value view used by table collaborators.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("sample_count", self.sample_count as f64),
            ("wavelength", self.wavelength),
            ("numerical_aperture", self.numerical_aperture),
            ("magnification", self.magnification),
            ("defocus", self.defocus),
            ("astigmatism", self.astigmatism),
            ("pupil_diameter", self.pupil_diameter),
            ("pupil_step", self.pupil_step),
            ("object_step", self.object_step),
            ("image_step", self.image_step),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }

    /// Build a record from a flat key/value mapping.
    ///
    /// Legacy key names are accepted, unknown keys are ignored and missing
    /// keys keep their defaults. The sampling is re-derived from the pupil
    /// diameter before validation.
    pub fn from_map(map: &BTreeMap<String, f64>) -> OpticsResult<Self> {
        let mut params = Self::default();
        for (key, &value) in map {
            match canonical_key(key) {
                "sample_count" => params.sample_count = sample_count_from_f64(value)?,
                "wavelength" => params.wavelength = value,
                "numerical_aperture" => params.numerical_aperture = value,
                "magnification" => params.magnification = value,
                "defocus" => params.defocus = value,
                "astigmatism" => params.astigmatism = value,
                "pupil_diameter" => params.pupil_diameter = value,
                "pupil_step" => params.pupil_step = value,
                "object_step" => params.object_step = value,
                "image_step" => params.image_step = value,
                other => log::debug!("ignoring unknown parameter key '{other}'"),
            }
        }
        let params = params.recompute_from_pupil_diameter();
        params.validate()?;
        Ok(params)
    }

    /// Parse a single JSON record, re-derive its sampling and validate it.
    pub fn from_json_str(json: &str) -> OpticsResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        let params = params.recompute_from_pupil_diameter();
        params.validate()?;
        Ok(params)
    }

    /// Load a single JSON record from disk.
    pub fn from_file(path: impl AsRef<Path>) -> OpticsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse either one JSON record or an array of records (table rows).
    ///
    /// Rows are re-derived from their pupil diameter but not validated:
    /// per-row validation belongs to the batch evaluator, which reports
    /// each failure against its row.
    pub fn rows_from_json_str(json: &str) -> OpticsResult<Vec<Self>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let records = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        records
            .into_iter()
            .map(|record| {
                let params: Self = serde_json::from_value(record)?;
                Ok(params.recompute_from_pupil_diameter())
            })
            .collect()
    }

    pub fn to_json_string(&self) -> OpticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> OpticsResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

fn canonical_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, name)| *name)
        .unwrap_or(key)
}

fn sample_count_from_f64(value: f64) -> OpticsResult<usize> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(OpticsError::ParamError(format!(
            "sample_count must be a positive integer, got {value}"
        )));
    }
    Ok(value as usize)
}

fn require_positive(name: &str, value: f64) -> OpticsResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(OpticsError::ParamError(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn require_finite(name: &str, value: f64) -> OpticsResult<()> {
    if !value.is_finite() {
        return Err(OpticsError::ParamError(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(())
}

/// Finite and strictly positive.
fn usable_step(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}
