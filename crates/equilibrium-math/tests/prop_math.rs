// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for equilibrium-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for equilibrium-math using proptest.
//!
//! Covers: elliptic integrals, banded LU against the flux operator, SOR,
//! bilinear and bicubic interpolation, SVD and Tikhonov solves, summation.

use equilibrium_math::banded::BandMatrix;
use equilibrium_math::elliptic::{ellipe, ellipk, ellipke, ellipke_complement};
use equilibrium_math::interp::{interp2d, BicubicInterpolator};
use equilibrium_math::linalg::{svd_small, tikhonov_solve};
use equilibrium_math::quadrature::pairwise_sum;
use equilibrium_math::sor::sor_solve;
use equilibrium_math::stencil::{assemble_operator, dirichlet_rhs, interior_index, residual_norm};
use equilibrium_types::state::Grid2D;
use ndarray::{Array1, Array2};
use proptest::prelude::*;

// ── Elliptic Integral Properties ─────────────────────────────────────

proptest! {
    /// K(m) is monotonically increasing on [0, 1).
    #[test]
    fn ellipk_monotone(m1 in 0.01f64..0.49, m2 in 0.51f64..0.99) {
        let k1 = ellipk(m1);
        let k2 = ellipk(m2);
        prop_assert!(k2 > k1,
            "K({}) = {} should be > K({}) = {}", m2, k2, m1, k1);
    }

    /// E(m) is monotonically decreasing on [0, 1].
    #[test]
    fn ellipe_monotone(m1 in 0.01f64..0.49, m2 in 0.51f64..0.99) {
        let e1 = ellipe(m1);
        let e2 = ellipe(m2);
        prop_assert!(e2 < e1,
            "E({}) = {} should be < E({}) = {}", m2, e2, m1, e1);
    }

    /// Legendre relation: K(m)E(1-m) + E(m)K(1-m) - K(m)K(1-m) = pi/2
    #[test]
    fn legendre_relation(m in 0.001f64..0.999) {
        let (km, em) = ellipke(m);
        let (km1, em1) = ellipke(1.0 - m);
        let lhs = km * em1 + em * km1 - km * km1;
        prop_assert!((lhs - std::f64::consts::FRAC_PI_2).abs() < 1e-12,
            "Legendre at m = {}: {}", m, lhs);
    }

    /// The complementary form agrees with the direct one.
    #[test]
    fn complement_consistent(m in 0.0f64..0.99) {
        let (k1, e1) = ellipke(m);
        let (k2, e2) = ellipke_complement(1.0 - m);
        prop_assert!((k1 - k2).abs() < 1e-14);
        prop_assert!((e1 - e2).abs() < 1e-14);
    }
}

// ── Flux Operator Solves ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The banded LU solution satisfies the discrete equation and keeps the
    /// prescribed edge values.
    #[test]
    fn banded_solve_satisfies_stencil(
        nr in 5usize..24,
        nz in 5usize..24,
        r_min in 0.2f64..2.0,
        edge_level in -1.0f64..1.0,
    ) {
        let grid = Grid2D::new(r_min, r_min + 1.5, -1.0, 1.0, nr, nz).unwrap();
        let mut psi = Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
            if grid.is_boundary(iz, ir) { edge_level * grid.r[ir] } else { 0.0 }
        });
        let rhs = Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
            -(grid.r[ir] * (1.0 - grid.z[iz].powi(2)))
        });

        let lu = assemble_operator(&grid).factorize().unwrap();
        let x = lu.solve(&dirichlet_rhs(&psi, &rhs, &grid));
        for iz in 1..nz - 1 {
            for ir in 1..nr - 1 {
                psi[[iz, ir]] = x[interior_index(&grid, iz, ir)];
            }
        }

        let scale = rhs.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        prop_assert!(residual_norm(&psi, &rhs, &grid) < 1e-9 * scale.max(1.0));
        prop_assert!((psi[[0, 0]] - edge_level * grid.r[0]).abs() < 1e-15);
    }

    /// SOR approaches the direct solution.
    #[test]
    fn sor_approaches_direct(n in 9usize..17) {
        let grid = Grid2D::new(1.0, 2.0, -0.5, 0.5, n, n).unwrap();
        let rhs = Array2::from_elem(grid.shape(), -1.0);
        let zero = Array2::zeros(grid.shape());
        let x = assemble_operator(&grid).factorize().unwrap()
            .solve(&dirichlet_rhs(&zero, &rhs, &grid));

        let mut psi = Array2::zeros(grid.shape());
        sor_solve(&mut psi, &rhs, &grid, 1.6, 800);
        let centre = interior_index(&grid, n / 2, n / 2);
        let err = (psi[[n / 2, n / 2]] - x[centre]).abs();
        prop_assert!(err < 1e-8 * x[centre].abs().max(1e-12),
            "SOR {} vs direct {}", psi[[n / 2, n / 2]], x[centre]);
    }

    /// A general diagonally dominant band matrix is solved to round-off.
    #[test]
    fn banded_dominant_roundtrip(n in 4usize..40, bw in 1usize..4) {
        let mut a = BandMatrix::zeros(n, bw, bw);
        for i in 0..n {
            a.set(i, i, 3.0 * bw as f64 + 1.0);
            for d in 1..=bw {
                if i + d < n {
                    a.set(i, i + d, -((i + d) as f64).sin());
                    a.set(i + d, i, ((i * d) as f64).cos());
                }
            }
        }
        let x_true: Vec<f64> = (0..n).map(|i| (i as f64).sqrt() - 1.0).collect();
        let b = a.mul_vec(&x_true);
        let x = a.factorize().unwrap().solve(&b);
        for (xi, ti) in x.iter().zip(&x_true) {
            prop_assert!((xi - ti).abs() < 1e-10);
        }
    }
}

// ── Interpolation Properties ─────────────────────────────────────────

proptest! {
    /// Bilinear interpolation of a constant field returns that constant.
    #[test]
    fn interp_constant_field(
        val in -100.0f64..100.0,
        r in 1.0f64..8.9,
        z in -4.9f64..4.9,
    ) {
        let grid = Grid2D::new(1.0, 9.0, -5.0, 5.0, 20, 20).unwrap();
        let field = Array2::from_elem((20, 20), val);
        let result = interp2d(&field, &grid, r, z).unwrap();
        prop_assert!((result - val).abs() < 1e-10,
            "Constant field: interp({}, {}) = {}, expected {}", r, z, result, val);
    }

    /// Points outside the domain are rejected rather than clamped.
    #[test]
    fn interp_rejects_outside(r in 9.01f64..20.0, z in -4.0f64..4.0) {
        let grid = Grid2D::new(1.0, 9.0, -5.0, 5.0, 10, 10).unwrap();
        let field = Array2::zeros((10, 10));
        prop_assert!(interp2d(&field, &grid, r, z).is_err());
        let bicubic = BicubicInterpolator::new(&field, &grid);
        prop_assert!(bicubic.eval(r, z).is_err());
    }

    /// The bicubic gradient of a smooth field converges to the analytic one.
    #[test]
    fn bicubic_gradient_accuracy(r in 1.2f64..2.8, z in -0.8f64..0.8) {
        let grid = Grid2D::new(1.0, 3.0, -1.0, 1.0, 81, 81).unwrap();
        let field = Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
            (grid.r[ir] - 2.0).powi(2) * 0.5 + grid.z[iz].sin()
        });
        let interp = BicubicInterpolator::new(&field, &grid);
        let (d_r, d_z) = interp.gradient(r, z).unwrap();
        prop_assert!((d_r - (r - 2.0)).abs() < 1e-6);
        prop_assert!((d_z - z.cos()).abs() < 5e-4);
    }
}

// ── SVD / Tikhonov Properties ────────────────────────────────────────

proptest! {
    /// SVD reconstruction: U * diag(sigma) * Vt ≈ A.
    #[test]
    fn svd_reconstruction(m in 1usize..8, n in 1usize..8, seed in 0u32..1000) {
        let a = Array2::from_shape_fn((m, n), |(i, j)| {
            ((i * 7 + j * 13 + seed as usize) as f64).sin() * 3.0
        });
        let svd = svd_small(&a);
        let recon = svd.u.dot(&Array2::from_diag(&svd.sigma)).dot(&svd.vt);
        for (x, y) in recon.iter().zip(a.iter()) {
            prop_assert!((x - y).abs() < 1e-10, "{} vs {}", x, y);
        }
    }

    /// Singular values are non-negative and sorted descending.
    #[test]
    fn svd_sigma_nonneg_sorted(m in 1usize..8, n in 1usize..8) {
        let a = Array2::from_shape_fn((m, n), |(i, j)| {
            ((i * 5 + j * 11 + 3) as f64).cos() * 2.0
        });
        let sigma = svd_small(&a).sigma;
        prop_assert_eq!(sigma.len(), m.min(n));
        for i in 0..sigma.len() {
            prop_assert!(sigma[i] >= 0.0);
            if i > 0 {
                prop_assert!(sigma[i] <= sigma[i - 1] + 1e-12);
            }
        }
    }

    /// The regularized solution never grows as the regularization strengthens.
    #[test]
    fn tikhonov_norm_monotone(g1 in 1e-6f64..1e-2, factor in 2.0f64..100.0) {
        let a = Array2::from_shape_fn((4, 3), |(i, j)| 1.0 / (1.0 + i as f64 + j as f64));
        let b = Array1::from_vec(vec![1.0, -0.5, 0.25, 2.0]);
        let weak = tikhonov_solve(&a, &b, g1, 1e-13).unwrap();
        let strong = tikhonov_solve(&a, &b, g1 * factor, 1e-13).unwrap();
        let norm = |x: &Array1<f64>| x.dot(x).sqrt();
        prop_assert!(norm(&strong.x) <= norm(&weak.x) * (1.0 + 1e-12));
    }
}

// ── Summation ────────────────────────────────────────────────────────

proptest! {
    /// Pairwise summation agrees with a compensated reference.
    #[test]
    fn pairwise_sum_accuracy(values in prop::collection::vec(-1e6f64..1e6, 0..2000)) {
        let mut sum = 0.0_f64;
        let mut comp = 0.0_f64;
        for &v in &values {
            let y = v - comp;
            let t = sum + y;
            comp = (t - sum) - y;
            sum = t;
        }
        let scale = values.iter().map(|v| v.abs()).sum::<f64>().max(1.0);
        prop_assert!((pairwise_sum(&values) - sum).abs() < 1e-13 * scale);
    }
}
