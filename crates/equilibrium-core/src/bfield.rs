// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Poloidal Field
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Poloidal magnetic field from the flux function.
//!
//!   B_R = −(1/R) ∂ψ/∂Z
//!   B_Z =  (1/R) ∂ψ/∂R

use equilibrium_math::interp::{gradient_2d, BicubicInterpolator};
use equilibrium_types::error::EquilibriumResult;
use equilibrium_types::state::Grid2D;
use ndarray::{Array2, Zip};

/// `(B_R, B_Z)` on the grid, as `[nz, nr]` arrays.
pub fn compute_b_field(psi: &Array2<f64>, grid: &Grid2D) -> (Array2<f64>, Array2<f64>) {
    let (dpsi_dz, dpsi_dr) = gradient_2d(psi, grid);
    let b_r = Zip::from(&dpsi_dz)
        .and(&grid.rr)
        .par_map_collect(|&d, &r| -d / r);
    let b_z = Zip::from(&dpsi_dr)
        .and(&grid.rr)
        .par_map_collect(|&d, &r| d / r);
    (b_r, b_z)
}

/// `(B_R, B_Z)` at an arbitrary point from a bicubic flux interpolant.
pub fn b_field_at(interp: &BicubicInterpolator, r: f64, z: f64) -> EquilibriumResult<(f64, f64)> {
    let (d_r, d_z) = interp.gradient(r, z)?;
    Ok((-d_z / r, d_r / r))
}
