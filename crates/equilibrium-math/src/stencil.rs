// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Grad-Shafranov Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Five-point discretization of the toroidal elliptic operator
//!
//!   Δ*ψ = R ∂/∂R (1/R ∂ψ/∂R) + ∂²ψ/∂Z²
//!
//! with second-order central differences. Δ*ψ = −μ0 R Jφ is the flux equation
//! solved by both the direct and the multigrid paths; they share these
//! coefficients so the two produce the same discrete solution.

use crate::banded::BandMatrix;
use equilibrium_types::state::Grid2D;
use ndarray::Array2;

/// Stencil weights at one radius.
///
/// Δ*ψ ≈ east·ψ(R+dR) + west·ψ(R−dR) + vertical·(ψ(Z+dZ) + ψ(Z−dZ)) − center·ψ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilWeights {
    pub east: f64,
    pub west: f64,
    pub vertical: f64,
    pub center: f64,
}

impl StencilWeights {
    pub fn at(r: f64, dr: f64, dz: f64) -> Self {
        let dr_sq = dr * dr;
        let dz_sq = dz * dz;
        StencilWeights {
            east: 1.0 / dr_sq - 1.0 / (2.0 * r * dr),
            west: 1.0 / dr_sq + 1.0 / (2.0 * r * dr),
            vertical: 1.0 / dz_sq,
            center: 2.0 / dr_sq + 2.0 / dz_sq,
        }
    }
}

/// Δ*ψ at interior node `(iz, ir)`.
#[inline]
pub fn apply_at(psi: &Array2<f64>, grid: &Grid2D, iz: usize, ir: usize) -> f64 {
    let w = StencilWeights::at(grid.r[ir], grid.dr, grid.dz);
    w.east * psi[[iz, ir + 1]]
        + w.west * psi[[iz, ir - 1]]
        + w.vertical * (psi[[iz + 1, ir]] + psi[[iz - 1, ir]])
        - w.center * psi[[iz, ir]]
}

/// rhs − Δ*ψ on interior nodes; zero on the edge.
pub fn residual(psi: &Array2<f64>, rhs: &Array2<f64>, grid: &Grid2D) -> Array2<f64> {
    let mut res = Array2::zeros(grid.shape());
    for iz in 1..grid.nz - 1 {
        for ir in 1..grid.nr - 1 {
            res[[iz, ir]] = rhs[[iz, ir]] - apply_at(psi, grid, iz, ir);
        }
    }
    res
}

/// Max-norm of rhs − Δ*ψ over interior nodes.
pub fn residual_norm(psi: &Array2<f64>, rhs: &Array2<f64>, grid: &Grid2D) -> f64 {
    let mut max_res: f64 = 0.0;
    for iz in 1..grid.nz - 1 {
        for ir in 1..grid.nr - 1 {
            max_res = max_res.max((rhs[[iz, ir]] - apply_at(psi, grid, iz, ir)).abs());
        }
    }
    max_res
}

/// Position of interior node `(iz, ir)` in the unknown vector.
#[inline]
pub fn interior_index(grid: &Grid2D, iz: usize, ir: usize) -> usize {
    (iz - 1) * (grid.nr - 2) + (ir - 1)
}

/// Assemble −Δ* over interior unknowns as a band matrix.
///
/// Rows are negated so the diagonal is positive and the matrix is weakly
/// diagonally dominant, which keeps the unpivoted factorization stable.
/// Edge nodes are eliminated: their contribution moves to the right-hand
/// side through [`dirichlet_rhs`].
pub fn assemble_operator(grid: &Grid2D) -> BandMatrix {
    let nr_in = grid.nr - 2;
    let n = grid.interior_len();
    let mut mat = BandMatrix::zeros(n, nr_in, nr_in);

    for iz in 1..grid.nz - 1 {
        for ir in 1..grid.nr - 1 {
            let row = interior_index(grid, iz, ir);
            let w = StencilWeights::at(grid.r[ir], grid.dr, grid.dz);
            mat.set(row, row, w.center);
            if ir + 1 < grid.nr - 1 {
                mat.set(row, row + 1, -w.east);
            }
            if ir > 1 {
                mat.set(row, row - 1, -w.west);
            }
            if iz + 1 < grid.nz - 1 {
                mat.set(row, row + nr_in, -w.vertical);
            }
            if iz > 1 {
                mat.set(row, row - nr_in, -w.vertical);
            }
        }
    }
    mat
}

/// Right-hand side for the negated interior system: −rhs plus the
/// contribution of the fixed edge values held in `psi`.
pub fn dirichlet_rhs(psi: &Array2<f64>, rhs: &Array2<f64>, grid: &Grid2D) -> Vec<f64> {
    let mut b = vec![0.0; grid.interior_len()];
    for iz in 1..grid.nz - 1 {
        for ir in 1..grid.nr - 1 {
            let w = StencilWeights::at(grid.r[ir], grid.dr, grid.dz);
            let mut value = -rhs[[iz, ir]];
            if ir + 1 == grid.nr - 1 {
                value += w.east * psi[[iz, ir + 1]];
            }
            if ir == 1 {
                value += w.west * psi[[iz, 0]];
            }
            if iz + 1 == grid.nz - 1 {
                value += w.vertical * psi[[iz + 1, ir]];
            }
            if iz == 1 {
                value += w.vertical * psi[[0, ir]];
            }
            b[interior_index(grid, iz, ir)] = value;
        }
    }
    b
}
