// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Red-Black SOR
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Red-Black Successive Over-Relaxation for Δ*ψ = rhs.
//!
//! Used as the smoother inside the multigrid V-cycle. Edge rows and columns
//! hold Dirichlet values and are never written.

use crate::stencil::StencilWeights;
use equilibrium_types::state::Grid2D;
use ndarray::Array2;

/// Perform one Red-Black SOR sweep.
///
/// `omega`: relaxation factor (1.0 = Gauss-Seidel, 1.8-1.9 = over-relaxation)
pub fn sor_step(psi: &mut Array2<f64>, rhs: &Array2<f64>, grid: &Grid2D, omega: f64) {
    for parity in [0, 1] {
        for iz in 1..grid.nz - 1 {
            for ir in 1..grid.nr - 1 {
                if (iz + ir) % 2 == parity {
                    update_point(psi, rhs, grid, iz, ir, omega);
                }
            }
        }
    }
}

/// Run `iterations` SOR sweeps.
pub fn sor_solve(
    psi: &mut Array2<f64>,
    rhs: &Array2<f64>,
    grid: &Grid2D,
    omega: f64,
    iterations: usize,
) {
    for _ in 0..iterations {
        sor_step(psi, rhs, grid, omega);
    }
}

#[inline(always)]
fn update_point(
    psi: &mut Array2<f64>,
    rhs: &Array2<f64>,
    grid: &Grid2D,
    iz: usize,
    ir: usize,
    omega: f64,
) {
    let w = StencilWeights::at(grid.r[ir], grid.dr, grid.dz);

    let p_star = (w.east * psi[[iz, ir + 1]]
        + w.west * psi[[iz, ir - 1]]
        + w.vertical * (psi[[iz + 1, ir]] + psi[[iz - 1, ir]])
        - rhs[[iz, ir]])
        / w.center;

    psi[[iz, ir]] = (1.0 - omega) * psi[[iz, ir]] + omega * p_star;
}
