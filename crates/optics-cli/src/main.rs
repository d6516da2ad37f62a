// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — PSF Command Line
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `optics-psf`: evaluate PSFs and Strehl ratios for JSON parameter rows.
//!
//! ```text
//! RUST_LOG=debug optics-psf rows.json --size 256 --source pupil-diameter --value 6
//! optics-psf single.json --npz psf.npz
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use ndarray_npy::NpzWriter;
use optics_core::batch::{evaluate_rows, RowResult};
use optics_core::engine::compute_psf;
use optics_types::config::{OpticalSystemParams, SamplingSource};
use optics_types::constants::LOG_INTENSITY_FLOOR;
use optics_types::error::OpticsResult;
use optics_types::state::PsfResult;

#[derive(Parser, Debug)]
#[command(name = "optics-psf")]
#[command(about = "Compute point spread functions and Strehl ratios")]
struct Args {
    /// JSON file with one parameter record or an array of rows.
    /// Defaults are used when omitted.
    params: Option<PathBuf>,

    /// Sampling field to hold fixed: pupil-diameter, pupil-step,
    /// object-step or image-step
    #[arg(long)]
    source: Option<SamplingSource>,

    /// New value for the `--source` field
    #[arg(long, requires = "source")]
    value: Option<f64>,

    /// Grid side length override
    #[arg(long)]
    size: Option<usize>,

    /// Write intensity and pupil arrays of the first row to this .npz archive
    #[arg(long)]
    npz: Option<PathBuf>,

    /// Print rows as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rows = load_rows(args.params.as_deref())?;
    if rows.is_empty() {
        bail!("no parameter rows to evaluate");
    }
    let rows: Vec<_> = rows.iter().map(|p| apply_overrides(p, &args)).collect();
    info!("evaluating {} row(s)", rows.len());

    let results = evaluate_rows(&rows);
    if args.json {
        println!("{}", render_json(&results)?);
    } else {
        print_table(&results);
    }

    if let Some(path) = &args.npz {
        if export_first_row(path, &rows[0], &results[0])? {
            info!("wrote {}", path.display());
        }
    }

    if results.iter().all(|r| r.is_err()) {
        bail!("every row failed validation");
    }
    Ok(())
}

fn load_rows(path: Option<&Path>) -> anyhow::Result<Vec<OpticalSystemParams>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            OpticalSystemParams::rows_from_json_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))
        }
        None => Ok(vec![OpticalSystemParams::default()]),
    }
}

/// Apply `--size` and `--source/--value` to one row.
fn apply_overrides(params: &OpticalSystemParams, args: &Args) -> OpticalSystemParams {
    let source = args.source.unwrap_or_default();
    let mut next = *params;
    if let Some(size) = args.size {
        next = next.with_sample_count(size, source);
    }
    match args.value {
        Some(value) => {
            if !(value > 0.0 && value.is_finite()) {
                warn!("ignoring {source} = {value}: must be finite and > 0");
            }
            next.with_sampling(source, value)
        }
        None => next.recompute_from(source),
    }
}

fn print_table(results: &[OpticsResult<RowResult>]) {
    println!(
        "{:>4} {:>6} {:>9} {:>9} {:>8} {:>12} {:>12}",
        "row", "n", "defocus", "astig", "strehl", "pixel_um", "peak"
    );
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(r) => println!(
                "{:>4} {:>6} {:>9.4} {:>9.4} {:>8.4} {:>12.6} {:>12.4e}",
                i,
                r.params.sample_count,
                r.params.defocus,
                r.params.astigmatism,
                r.strehl_ratio,
                r.pixel_size_um,
                r.peak_intensity
            ),
            Err(e) => println!("{i:>4} error: {e}"),
        }
    }
}

fn render_json(results: &[OpticsResult<RowResult>]) -> anyhow::Result<String> {
    let rows = results
        .iter()
        .enumerate()
        .map(|(i, result)| match result {
            Ok(r) => serde_json::to_value(r.to_map()),
            Err(e) => Ok(serde_json::json!({ "row": i, "error": e.to_string() })),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Write the arrays of the first row, unless that row failed validation.
fn export_first_row(
    path: &Path,
    params: &OpticalSystemParams,
    result: &OpticsResult<RowResult>,
) -> anyhow::Result<bool> {
    if let Err(e) = result {
        warn!("skipping {}: row 0 failed: {e}", path.display());
        return Ok(false);
    }
    write_npz(path, &compute_psf(params))?;
    Ok(true)
}

fn write_npz(path: &Path, psf: &PsfResult) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut npz = NpzWriter::new(file);
    npz.add_array("intensity", &psf.intensity)?;
    npz.add_array("log_intensity", &psf.log10_intensity(LOG_INTENSITY_FLOOR))?;
    npz.add_array("pupil_amplitude", &psf.pupil_amplitude())?;
    npz.add_array("pupil_phase", &psf.pupil_phase())?;
    npz.add_array("x_slice", &psf.x_slice())?;
    npz.add_array("y_slice", &psf.y_slice())?;
    npz.finish()?;
    Ok(())
}
