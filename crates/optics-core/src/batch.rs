// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Batch
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Table evaluation: one PSF per parameter row.
//!
//! Rows run in parallel through the stateless [`compute_psf`]; nothing
//! mutable is shared between them. Output order follows input order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use optics_types::config::OpticalSystemParams;
use optics_types::error::{OpticsError, OpticsResult};
use rayon::prelude::*;

use crate::engine::compute_psf;

/// Scalar summary of one evaluated row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    pub params: OpticalSystemParams,
    pub strehl_ratio: f64,
    pub pixel_size_um: f64,
    pub peak_intensity: f64,
}

impl RowResult {
    /// Parameter map with the computed quantities appended.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = self.params.to_map();
        map.insert("strehl_ratio".to_string(), self.strehl_ratio);
        map.insert("pixel_size_um".to_string(), self.pixel_size_um);
        map.insert("peak_intensity".to_string(), self.peak_intensity);
        map
    }
}

/// Validate and evaluate a single row.
pub fn evaluate_row(params: &OpticalSystemParams) -> OpticsResult<RowResult> {
    params.validate()?;
    let psf = compute_psf(params);
    let peak_intensity = psf.peak().map_or(0.0, |(_, _, v)| v);
    Ok(RowResult {
        params: *params,
        strehl_ratio: psf.strehl_ratio,
        pixel_size_um: psf.pixel_size_um,
        peak_intensity,
    })
}

/// Evaluate every row in parallel.
pub fn evaluate_rows(rows: &[OpticalSystemParams]) -> Vec<OpticsResult<RowResult>> {
    let results: Vec<_> = rows
        .par_iter()
        .enumerate()
        .map(|(i, params)| {
            trace!("evaluating row {i}");
            evaluate_row(params)
        })
        .collect();
    log_summary(&results);
    results
}

/// Like [`evaluate_rows`], but rows not yet started when `cancel` is set
/// come back as [`OpticsError::Cancelled`]. A row already running is
/// always finished.
pub fn evaluate_rows_cancellable(
    rows: &[OpticalSystemParams],
    cancel: &AtomicBool,
) -> Vec<OpticsResult<RowResult>> {
    let results: Vec<_> = rows
        .par_iter()
        .enumerate()
        .map(|(i, params)| {
            if cancel.load(Ordering::Relaxed) {
                trace!("row {i} skipped after cancellation");
                return Err(OpticsError::Cancelled);
            }
            evaluate_row(params)
        })
        .collect();
    log_summary(&results);
    results
}

fn log_summary(results: &[OpticsResult<RowResult>]) {
    let failed = results.iter().filter(|r| r.is_err()).count();
    debug!("evaluated {} rows, {} failed", results.len(), failed);
}
