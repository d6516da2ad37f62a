// ─────────────────────────────────────────────────────────────────────
// SCPN Optics Core — Property-Based Tests (proptest) for optics-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for optics-types using proptest.
//!
//! Covers: sampling relations after every recompute rule, round-trips
//! between authoritative fields, pixel-size guards, flat map persistence.

use optics_types::config::{OpticalSystemParams, SamplingSource};
use optics_types::state::PupilGrid;
use proptest::prelude::*;

fn sources() -> impl Strategy<Value = SamplingSource> {
    prop_oneof![
        Just(SamplingSource::PupilDiameter),
        Just(SamplingSource::PupilStep),
        Just(SamplingSource::ObjectStep),
        Just(SamplingSource::ImageStep),
    ]
}

// ── Sampling Relations ───────────────────────────────────────────────

proptest! {
    /// Every recompute rule leaves a record satisfying
    /// pupil_step · n · object_step = 1, D = pupil_step · n, image = object.
    #[test]
    fn recompute_restores_consistency(
        n in 1usize..4096,
        value in 1e-3f64..100.0,
        source in sources(),
    ) {
        let base = OpticalSystemParams { sample_count: n, ..Default::default() }
            .recompute_from_pupil_diameter();
        let p = base.with_sampling(source, value);
        prop_assert!(p.is_sampling_consistent(1e-9),
            "inconsistent after {:?}={}: {:?}", source, value, p);
    }

    /// Diameter → step → diameter returns the starting diameter.
    #[test]
    fn diameter_step_round_trip(
        n in 1usize..4096,
        diameter in 1e-3f64..100.0,
    ) {
        let p = OpticalSystemParams { sample_count: n, pupil_diameter: diameter, ..Default::default() }
            .recompute_from_pupil_diameter();
        let back = p.recompute_from_pupil_step();
        prop_assert!((back.pupil_diameter - diameter).abs() <= 1e-12 * diameter,
            "{} vs {}", back.pupil_diameter, diameter);
    }

    /// Object step → pupil → object step is stable.
    #[test]
    fn object_step_round_trip(
        n in 1usize..4096,
        object_step in 1e-3f64..10.0,
    ) {
        let p = OpticalSystemParams::default()
            .with_sample_count(n, SamplingSource::PupilDiameter)
            .with_sampling(SamplingSource::ObjectStep, object_step);
        let back = p.recompute_from_pupil_diameter();
        prop_assert!((back.object_step - object_step).abs() <= 1e-9 * object_step);
        prop_assert_eq!(back.object_step, back.image_step);
    }

    /// Non-positive authoritative values never change the record.
    #[test]
    fn degenerate_values_are_noops(
        value in -100.0f64..=0.0,
        source in sources(),
    ) {
        let base = OpticalSystemParams::default();
        prop_assert_eq!(base.with_sampling(source, value), base);
    }
}

// ── Pixel Size & Persistence ─────────────────────────────────────────

proptest! {
    /// Pixel size is finite and non-negative for any finite inputs.
    #[test]
    fn pixel_size_never_poisoned(
        wavelength in -1.0f64..2.0,
        na in -1.0f64..1.5,
        mag in -10.0f64..100.0,
    ) {
        let p = OpticalSystemParams {
            wavelength,
            numerical_aperture: na,
            magnification: mag,
            ..Default::default()
        };
        let px = p.image_plane_pixel_size_um();
        prop_assert!(px.is_finite());
        prop_assert!(px >= 0.0);
    }

    /// to_map → from_map reproduces the record.
    #[test]
    fn map_round_trip(
        n in 1usize..2048,
        defocus in -2.0f64..2.0,
        astigmatism in -2.0f64..2.0,
        diameter in 0.5f64..32.0,
    ) {
        let p = OpticalSystemParams {
            sample_count: n,
            defocus,
            astigmatism,
            pupil_diameter: diameter,
            ..Default::default()
        }
        .recompute_from_pupil_diameter();
        let back = OpticalSystemParams::from_map(&p.to_map()).unwrap();
        prop_assert_eq!(back, p);
    }

    /// Grid coordinates are centred: index n/2 sits at the origin and the
    /// spacing equals the step.
    #[test]
    fn pupil_grid_centred(n in 2usize..256, step in 1e-3f64..1.0) {
        let grid = PupilGrid::new(n, step);
        prop_assert_eq!(grid.coords[n / 2], 0.0);
        for i in 1..n {
            prop_assert!((grid.coords[i] - grid.coords[i - 1] - step).abs() < 1e-9);
        }
    }
}
