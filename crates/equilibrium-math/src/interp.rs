// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Interpolation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interpolation and differentiation of fields sampled on a [`Grid2D`].
//!
//! Bilinear interpolation is used for quick lookups; the bicubic Hermite
//! interpolant supplies the smooth value, gradient and Hessian needed by
//! Newton refinement of critical points and by flux-surface tracing.

use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::state::Grid2D;
use ndarray::Array2;

/// Locate the cell containing `(r, z)` and the fractional offsets inside it.
#[allow(clippy::too_many_arguments)]
fn locate(
    r: f64,
    z: f64,
    r_min: f64,
    z_min: f64,
    dr: f64,
    dz: f64,
    nr: usize,
    nz: usize,
) -> (usize, usize, f64, f64) {
    let fr = (r - r_min) / dr;
    let fz = (z - z_min) / dz;
    let ir0 = (fr.floor() as isize).clamp(0, nr as isize - 2) as usize;
    let iz0 = (fz.floor() as isize).clamp(0, nz as isize - 2) as usize;
    (iz0, ir0, fr - ir0 as f64, fz - iz0 as f64)
}

/// Bilinear interpolation of `field` at `(r, z)`.
///
/// Fails with `OutOfDomain` when the point lies outside the grid.
pub fn interp2d(field: &Array2<f64>, grid: &Grid2D, r: f64, z: f64) -> EquilibriumResult<f64> {
    grid.check_contains(r, z)?;
    let (iz0, ir0, tr, tz) = locate(
        r,
        z,
        grid.r_min(),
        grid.z_min(),
        grid.dr,
        grid.dz,
        grid.nr,
        grid.nz,
    );
    let tr = tr.clamp(0.0, 1.0);
    let tz = tz.clamp(0.0, 1.0);

    let v00 = field[[iz0, ir0]];
    let v10 = field[[iz0 + 1, ir0]];
    let v01 = field[[iz0, ir0 + 1]];
    let v11 = field[[iz0 + 1, ir0 + 1]];

    Ok((1.0 - tz) * ((1.0 - tr) * v00 + tr * v01) + tz * ((1.0 - tr) * v10 + tr * v11))
}

/// Derivative of a 1D run of samples, second order everywhere.
fn diff_line(values: impl Fn(usize) -> f64, n: usize, h: f64, i: usize) -> f64 {
    if i == 0 {
        (-3.0 * values(0) + 4.0 * values(1) - values(2)) / (2.0 * h)
    } else if i == n - 1 {
        (3.0 * values(n - 1) - 4.0 * values(n - 2) + values(n - 3)) / (2.0 * h)
    } else {
        (values(i + 1) - values(i - 1)) / (2.0 * h)
    }
}

/// Gradient of a 2D field by finite differences.
///
/// Returns (df_dz, df_dr) matching the axis convention:
/// - axis 0 = Z (rows) → df_dz
/// - axis 1 = R (cols) → df_dr
///
/// Central differences inside, second-order one-sided differences on the edge.
pub fn gradient_2d(field: &Array2<f64>, grid: &Grid2D) -> (Array2<f64>, Array2<f64>) {
    let (nz, nr) = field.dim();
    let df_dz = Array2::from_shape_fn((nz, nr), |(iz, ir)| {
        diff_line(|k| field[[k, ir]], nz, grid.dz, iz)
    });
    let df_dr = Array2::from_shape_fn((nz, nr), |(iz, ir)| {
        diff_line(|k| field[[iz, k]], nr, grid.dr, ir)
    });
    (df_dz, df_dr)
}

/// Value and first and second derivatives at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalExpansion {
    pub value: f64,
    pub d_r: f64,
    pub d_z: f64,
    pub d_rr: f64,
    pub d_rz: f64,
    pub d_zz: f64,
}

impl LocalExpansion {
    /// Determinant of the Hessian.
    pub fn hessian_det(&self) -> f64 {
        self.d_rr * self.d_zz - self.d_rz * self.d_rz
    }

    pub fn grad_norm_sq(&self) -> f64 {
        self.d_r * self.d_r + self.d_z * self.d_z
    }
}

/// Cubic Hermite basis on [0, 1]: (value, first, second derivative) of
/// h00, h01 (node values) and h10, h11 (node slopes).
fn hermite_basis(t: f64) -> [[f64; 3]; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        [2.0 * t3 - 3.0 * t2 + 1.0, 6.0 * t2 - 6.0 * t, 12.0 * t - 6.0],
        [-2.0 * t3 + 3.0 * t2, -6.0 * t2 + 6.0 * t, -12.0 * t + 6.0],
        [t3 - 2.0 * t2 + t, 3.0 * t2 - 4.0 * t + 1.0, 6.0 * t - 4.0],
        [t3 - t2, 3.0 * t2 - 2.0 * t, 6.0 * t - 2.0],
    ]
}

/// Piecewise bicubic Hermite interpolant of a gridded field.
///
/// Node derivatives come from second-order finite differences, so quadratic
/// fields are reproduced exactly and the interpolant is C¹ across cells.
#[derive(Debug, Clone)]
pub struct BicubicInterpolator {
    nr: usize,
    nz: usize,
    r_min: f64,
    r_max: f64,
    z_min: f64,
    z_max: f64,
    dr: f64,
    dz: f64,
    f: Array2<f64>,
    f_r: Array2<f64>,
    f_z: Array2<f64>,
    f_rz: Array2<f64>,
}

impl BicubicInterpolator {
    pub fn new(field: &Array2<f64>, grid: &Grid2D) -> Self {
        let (f_z, f_r) = gradient_2d(field, grid);
        let (f_rz, _) = gradient_2d(&f_r, grid);
        BicubicInterpolator {
            nr: grid.nr,
            nz: grid.nz,
            r_min: grid.r_min(),
            r_max: grid.r_max(),
            z_min: grid.z_min(),
            z_max: grid.z_max(),
            dr: grid.dr,
            dz: grid.dz,
            f: field.clone(),
            f_r,
            f_z,
            f_rz,
        }
    }

    /// True when `(r, z)` can be evaluated.
    pub fn contains(&self, r: f64, z: f64) -> bool {
        let slack_r = 1e-9 * (self.r_max - self.r_min);
        let slack_z = 1e-9 * (self.z_max - self.z_min);
        r.is_finite()
            && z.is_finite()
            && r >= self.r_min - slack_r
            && r <= self.r_max + slack_r
            && z >= self.z_min - slack_z
            && z <= self.z_max + slack_z
    }

    /// Value, gradient and Hessian at `(r, z)`.
    pub fn eval(&self, r: f64, z: f64) -> EquilibriumResult<LocalExpansion> {
        if !self.contains(r, z) {
            return Err(EquilibriumError::OutOfDomain { r, z });
        }
        let (iz0, ir0, t, u) = locate(
            r, z, self.r_min, self.z_min, self.dr, self.dz, self.nr, self.nz,
        );
        let bt = hermite_basis(t);
        let bu = hermite_basis(u);

        let mut out = [0.0_f64; 6];
        for (a, &ir) in [ir0, ir0 + 1].iter().enumerate() {
            for (b, &iz) in [iz0, iz0 + 1].iter().enumerate() {
                // (weight, basis index in t, basis index in u)
                let terms = [
                    (self.f[[iz, ir]], a, b),
                    (self.dr * self.f_r[[iz, ir]], 2 + a, b),
                    (self.dz * self.f_z[[iz, ir]], a, 2 + b),
                    (self.dr * self.dz * self.f_rz[[iz, ir]], 2 + a, 2 + b),
                ];
                for (w, it, iu) in terms {
                    let ht = bt[it];
                    let hu = bu[iu];
                    out[0] += w * ht[0] * hu[0];
                    out[1] += w * ht[1] * hu[0];
                    out[2] += w * ht[0] * hu[1];
                    out[3] += w * ht[2] * hu[0];
                    out[4] += w * ht[1] * hu[1];
                    out[5] += w * ht[0] * hu[2];
                }
            }
        }

        Ok(LocalExpansion {
            value: out[0],
            d_r: out[1] / self.dr,
            d_z: out[2] / self.dz,
            d_rr: out[3] / (self.dr * self.dr),
            d_rz: out[4] / (self.dr * self.dz),
            d_zz: out[5] / (self.dz * self.dz),
        })
    }

    pub fn value(&self, r: f64, z: f64) -> EquilibriumResult<f64> {
        Ok(self.eval(r, z)?.value)
    }

    /// (∂f/∂R, ∂f/∂Z) at `(r, z)`.
    pub fn gradient(&self, r: f64, z: f64) -> EquilibriumResult<(f64, f64)> {
        let e = self.eval(r, z)?;
        Ok((e.d_r, e.d_z))
    }
}
