// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for equilibrium-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for equilibrium-types using proptest.
//!
//! Covers: Grid2D construction invariants and rejection of invalid domains,
//! FluxField normalization, solver config serialization.

use equilibrium_types::config::SolverConfig;
use equilibrium_types::error::EquilibriumError;
use equilibrium_types::state::{FluxField, Grid2D};
use proptest::prelude::*;

// ── Grid2D Construction Invariants ───────────────────────────────────

proptest! {
    /// Grid dimensions match constructor arguments.
    #[test]
    fn grid_dimensions_match(
        nr in 3usize..128,
        nz in 3usize..128,
    ) {
        let grid = Grid2D::new(1.0, 9.0, -5.0, 5.0, nr, nz).unwrap();

        prop_assert_eq!(grid.nr, nr);
        prop_assert_eq!(grid.nz, nz);
        prop_assert_eq!(grid.r.len(), nr);
        prop_assert_eq!(grid.z.len(), nz);
        prop_assert_eq!(grid.rr.shape(), &[nz, nr]);
        prop_assert_eq!(grid.zz.shape(), &[nz, nr]);
    }

    /// Grid boundary values are correct.
    #[test]
    fn grid_boundary_values(
        nr in 3usize..64,
        nz in 3usize..64,
        r_min in 0.1f64..5.0,
        z_min in -10.0f64..0.0,
    ) {
        let r_max = r_min + 5.0;
        let z_max = z_min + 10.0;
        let grid = Grid2D::new(r_min, r_max, z_min, z_max, nr, nz).unwrap();

        prop_assert!((grid.r_min() - r_min).abs() < 1e-12);
        prop_assert!((grid.r_max() - r_max).abs() < 1e-12);
        prop_assert!((grid.z_min() - z_min).abs() < 1e-12);
        prop_assert!((grid.z_max() - z_max).abs() < 1e-12);
        prop_assert!((grid.rr[[0, nr - 1]] - r_max).abs() < 1e-12);
        prop_assert!((grid.zz[[nz - 1, 0]] - z_max).abs() < 1e-12);
    }

    /// Spacing is uniform along both axes.
    #[test]
    fn grid_uniform_spacing(nr in 4usize..64, nz in 4usize..64) {
        let grid = Grid2D::new(1.0, 9.0, -5.0, 5.0, nr, nz).unwrap();
        for i in 1..nr {
            let delta = grid.r[i] - grid.r[i - 1];
            prop_assert!((delta - grid.dr).abs() < 1e-12,
                "Non-uniform R spacing at {}: delta={}, dr={}", i, delta, grid.dr);
        }
        for i in 1..nz {
            let delta = grid.z[i] - grid.z[i - 1];
            prop_assert!((delta - grid.dz).abs() < 1e-12,
                "Non-uniform Z spacing at {}: delta={}, dz={}", i, delta, grid.dz);
        }
    }

    /// Inverted bounds are always rejected with InvalidDomain.
    #[test]
    fn grid_inverted_bounds_rejected(
        lo in 0.1f64..5.0,
        width in 0.0f64..5.0,
    ) {
        let hi = lo + width;
        let result = Grid2D::new(hi, lo, -1.0, 1.0, 17, 17);
        prop_assert!(matches!(result, Err(EquilibriumError::InvalidDomain(_))));
        let result = Grid2D::new(1.0, 2.0, hi, lo, 17, 17);
        prop_assert!(matches!(result, Err(EquilibriumError::InvalidDomain(_))));
    }

    /// Fewer than three points on either axis is rejected.
    #[test]
    fn grid_too_coarse_rejected(n_small in 0usize..3, n_ok in 3usize..40) {
        prop_assert!(Grid2D::new(1.0, 2.0, -1.0, 1.0, n_small, n_ok).is_err());
        prop_assert!(Grid2D::new(1.0, 2.0, -1.0, 1.0, n_ok, n_small).is_err());
    }

    /// Every grid node maps back to itself through nearest_index.
    #[test]
    fn grid_nearest_index_roundtrip(nr in 3usize..40, nz in 3usize..40, fr in 0.0f64..1.0, fz in 0.0f64..1.0) {
        let grid = Grid2D::new(0.5, 3.0, -2.0, 2.0, nr, nz).unwrap();
        let ir = ((nr - 1) as f64 * fr).round() as usize;
        let iz = ((nz - 1) as f64 * fz).round() as usize;
        prop_assert_eq!(grid.nearest_index(grid.r[ir], grid.z[iz]), (iz, ir));
    }
}

// ── FluxField Invariants ─────────────────────────────────────────────

proptest! {
    /// Normalized flux is 0 at the axis and 1 at the boundary for any
    /// non-degenerate pair.
    #[test]
    fn flux_normalization_endpoints(
        psi_axis in -10.0f64..10.0,
        delta in prop_oneof![-10.0f64..-1e-3, 1e-3f64..10.0],
    ) {
        let grid = Grid2D::new(1.0, 2.0, -1.0, 1.0, 5, 5).unwrap();
        let flux = FluxField {
            psi_axis,
            psi_boundary: psi_axis + delta,
            ..FluxField::zeros(&grid)
        };
        prop_assert!(flux.normalize(psi_axis).abs() < 1e-12);
        prop_assert!((flux.normalize(psi_axis + delta) - 1.0).abs() < 1e-9);
    }
}

// ── Config Serialization ─────────────────────────────────────────────

proptest! {
    /// Solver settings survive a JSON roundtrip.
    #[test]
    fn solver_config_json_roundtrip(
        omega in 0.05f64..1.0,
        tol in 1e-10f64..1e-2,
        iters in 0usize..500,
    ) {
        let cfg = SolverConfig {
            relaxation_factor: omega,
            convergence_tolerance: tol,
            max_iterations: iters,
            min_relaxation: omega.min(0.05),
            ..SolverConfig::default()
        };
        prop_assert!(cfg.validate().is_ok());
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SolverConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.max_iterations, iters);
        prop_assert!((back.relaxation_factor - omega).abs() < 1e-15);
        prop_assert!((back.convergence_tolerance - tol).abs() <= 1e-15 * tol.abs());
    }
}
