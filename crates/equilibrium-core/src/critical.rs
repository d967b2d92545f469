// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Critical Points
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Magnetic axis, X-points and the plasma boundary.
//!
//! Critical points (∇ψ = 0) are seeded at local minima of |∇ψ|² on the grid,
//! refined by Newton iteration on the bicubic interpolant and classified by
//! the sign of the Hessian determinant: positive for O-points (extrema),
//! negative for X-points (saddles).

use equilibrium_math::interp::{gradient_2d, BicubicInterpolator};
use equilibrium_math::quadrature::linspace;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::state::Grid2D;
use log::debug;
use ndarray::Array2;
use std::collections::VecDeque;

/// Newton iterations per candidate.
const NEWTON_MAX_ITER: usize = 20;

/// Newton converges when the step is below this fraction of a cell.
const NEWTON_STEP_TOL: f64 = 1e-6;

/// Accepted final step, in cells, when Newton runs out of iterations.
const NEWTON_LOOSE_TOL: f64 = 1e-2;

/// Candidates drifting further than this many cells are dropped.
const MAX_DRIFT_CELLS: f64 = 2.0;

/// Points closer than this many cells are merged.
const DUPLICATE_CELLS: f64 = 0.5;

/// Relative Hessian determinant below which a point is not classified.
const DEGENERATE_HESSIAN: f64 = 1e-10;

/// Samples along the axis to X-point segment.
const XPOINT_LINE_SAMPLES: usize = 50;

/// Allowed non-monotonicity of ψ_N along that segment.
const XPOINT_MONOTONE_TOL: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticalKind {
    OPoint,
    XPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalPoint {
    pub r: f64,
    pub z: f64,
    pub psi: f64,
    pub kind: CriticalKind,
}

/// Axis, boundary flux and plasma region of one flux map.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxTopology {
    pub axis: CriticalPoint,
    pub psi_axis: f64,
    pub psi_boundary: f64,
    /// X-points connected to the axis, the boundary-defining one first.
    pub x_points: Vec<CriticalPoint>,
    /// True when no X-point bounds the plasma and the domain edge does.
    pub limited: bool,
    /// Interior nodes inside the last closed flux surface.
    pub mask: Array2<bool>,
}

fn grad_norm_sq(psi: &Array2<f64>, grid: &Grid2D) -> Array2<f64> {
    let (d_z, d_r) = gradient_2d(psi, grid);
    d_z.mapv(|v| v * v) + &d_r.mapv(|v| v * v)
}

/// Interior nodes where |∇ψ|² is a local minimum; ties go to the first node
/// in scan order.
fn candidate_nodes(g2: &Array2<f64>) -> Vec<(usize, usize)> {
    let (nz, nr) = g2.dim();
    let mut out = Vec::new();
    for iz in 1..nz - 1 {
        for ir in 1..nr - 1 {
            let c = g2[[iz, ir]];
            let mut is_min = true;
            'nbrs: for dz in -1isize..=1 {
                for dr in -1isize..=1 {
                    if dz == 0 && dr == 0 {
                        continue;
                    }
                    let jz = (iz as isize + dz) as usize;
                    let jr = (ir as isize + dr) as usize;
                    let n = g2[[jz, jr]];
                    let earlier = (jz, jr) < (iz, ir);
                    if (earlier && c >= n) || (!earlier && c > n) {
                        is_min = false;
                        break 'nbrs;
                    }
                }
            }
            if is_min {
                out.push((iz, ir));
            }
        }
    }
    out
}

/// Newton iteration for ∇ψ = 0 from a grid node.
fn refine(
    interp: &BicubicInterpolator,
    grid: &Grid2D,
    r0: f64,
    z0: f64,
) -> Option<CriticalPoint> {
    let (mut r, mut z) = (r0, z0);
    let mut last_step = f64::INFINITY;
    for _ in 0..NEWTON_MAX_ITER {
        let e = interp.eval(r, z).ok()?;
        let det = e.hessian_det();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let step_r = -(e.d_zz * e.d_r - e.d_rz * e.d_z) / det;
        let step_z = -(e.d_rr * e.d_z - e.d_rz * e.d_r) / det;
        r += step_r;
        z += step_z;
        if ((r - r0) / grid.dr).abs() > MAX_DRIFT_CELLS
            || ((z - z0) / grid.dz).abs() > MAX_DRIFT_CELLS
        {
            return None;
        }
        last_step = (step_r / grid.dr).abs().max((step_z / grid.dz).abs());
        if last_step < NEWTON_STEP_TOL {
            break;
        }
    }
    if last_step > NEWTON_LOOSE_TOL {
        return None;
    }

    let e = interp.eval(r, z).ok()?;
    let det = e.hessian_det();
    let scale = e.d_rr * e.d_rr + e.d_zz * e.d_zz + 2.0 * e.d_rz * e.d_rz;
    if scale == 0.0 || det.abs() <= DEGENERATE_HESSIAN * scale {
        return None;
    }
    let kind = if det > 0.0 {
        CriticalKind::OPoint
    } else {
        CriticalKind::XPoint
    };
    Some(CriticalPoint {
        r,
        z,
        psi: e.value,
        kind,
    })
}

/// All O- and X-points of `psi` inside the domain, in scan order.
pub fn find_critical_points(psi: &Array2<f64>, grid: &Grid2D) -> Vec<CriticalPoint> {
    let g2 = grad_norm_sq(psi, grid);
    let interp = BicubicInterpolator::new(psi, grid);

    let mut points: Vec<CriticalPoint> = Vec::new();
    for (iz, ir) in candidate_nodes(&g2) {
        let Some(cp) = refine(&interp, grid, grid.r[ir], grid.z[iz]) else {
            continue;
        };
        let duplicate = points.iter().any(|p| {
            ((p.r - cp.r) / grid.dr).abs() < DUPLICATE_CELLS
                && ((p.z - cp.z) / grid.dz).abs() < DUPLICATE_CELLS
        });
        if !duplicate {
            points.push(cp);
        }
    }
    points
}

/// ψ_N stays within [0, 1] and increases along the segment from the axis to
/// the X-point.
fn connects_to_axis(interp: &BicubicInterpolator, axis: &CriticalPoint, x: &CriticalPoint) -> bool {
    let span = x.psi - axis.psi;
    if span == 0.0 || !span.is_finite() {
        return false;
    }
    let mut running_max = f64::NEG_INFINITY;
    for t in linspace(0.0, 1.0, XPOINT_LINE_SAMPLES) {
        let r = axis.r + t * (x.r - axis.r);
        let z = axis.z + t * (x.z - axis.z);
        let Ok(value) = interp.value(r, z) else {
            return false;
        };
        let psi_n = (value - axis.psi) / span;
        if psi_n > 1.0 + XPOINT_MONOTONE_TOL || running_max - psi_n > XPOINT_MONOTONE_TOL {
            return false;
        }
        running_max = running_max.max(psi_n);
    }
    true
}

/// Locate the axis and boundary of `psi` and flood-fill the plasma region.
///
/// `hint` selects the O-point nearest to it as the magnetic axis; the grid
/// centre is used otherwise. Fails with `ProfileDegenerate` when no O-point
/// exists or the boundary flux equals the axis flux.
pub fn analyse(
    psi: &Array2<f64>,
    grid: &Grid2D,
    hint: Option<(f64, f64)>,
) -> EquilibriumResult<FluxTopology> {
    let points = find_critical_points(psi, grid);
    let (hr, hz) = hint.unwrap_or_else(|| grid.center());

    let axis = points
        .iter()
        .filter(|p| p.kind == CriticalKind::OPoint)
        .min_by(|a, b| {
            let da = (a.r - hr).powi(2) + (a.z - hz).powi(2);
            let db = (b.r - hr).powi(2) + (b.z - hz).powi(2);
            da.total_cmp(&db)
        })
        .copied()
        .ok_or(EquilibriumError::ProfileDegenerate {
            psi_axis: f64::NAN,
            psi_boundary: f64::NAN,
        })?;

    let interp = BicubicInterpolator::new(psi, grid);
    let mut x_points: Vec<CriticalPoint> = points
        .iter()
        .filter(|p| p.kind == CriticalKind::XPoint && connects_to_axis(&interp, &axis, p))
        .copied()
        .collect();
    x_points.sort_by(|a, b| (a.psi - axis.psi).abs().total_cmp(&(b.psi - axis.psi).abs()));

    let (psi_boundary, limited) = match x_points.first() {
        Some(x) => (x.psi, false),
        None => {
            let edge: Vec<f64> = grid
                .boundary_nodes()
                .into_iter()
                .map(|(iz, ir)| psi[[iz, ir]])
                .collect();
            let mean = edge.iter().sum::<f64>() / edge.len() as f64;
            let value = if mean >= axis.psi {
                edge.iter().copied().fold(f64::INFINITY, f64::min)
            } else {
                edge.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            };
            debug!("no X-point connects to the axis; limiter boundary psi = {value:.6e}");
            (value, true)
        }
    };

    let dpsi = psi_boundary - axis.psi;
    if dpsi == 0.0 || !dpsi.is_finite() {
        return Err(EquilibriumError::ProfileDegenerate {
            psi_axis: axis.psi,
            psi_boundary,
        });
    }

    let mask = plasma_mask(psi, grid, &axis, &x_points, psi_boundary)?;
    Ok(FluxTopology {
        axis,
        psi_axis: axis.psi,
        psi_boundary,
        x_points,
        limited,
        mask,
    })
}

/// 4-connected flood fill from the axis over interior nodes with ψ_N < 1,
/// never crossing beyond an X-point as seen from the axis.
fn plasma_mask(
    psi: &Array2<f64>,
    grid: &Grid2D,
    axis: &CriticalPoint,
    x_points: &[CriticalPoint],
    psi_boundary: f64,
) -> EquilibriumResult<Array2<bool>> {
    let (nz, nr) = grid.shape();
    let dpsi = psi_boundary - axis.psi;
    let open = |iz: usize, ir: usize| -> bool {
        if grid.is_boundary(iz, ir) || (psi[[iz, ir]] - axis.psi) / dpsi >= 1.0 {
            return false;
        }
        let (r, z) = (grid.r[ir], grid.z[iz]);
        !x_points
            .iter()
            .any(|x| (r - x.r) * (x.r - axis.r) + (z - x.z) * (x.z - axis.z) > 0.0)
    };

    let (sz, sr) = grid.nearest_index(axis.r, axis.z);
    if !open(sz, sr) {
        return Err(EquilibriumError::ProfileDegenerate {
            psi_axis: axis.psi,
            psi_boundary,
        });
    }

    let mut mask = Array2::from_elem((nz, nr), false);
    let mut queue = VecDeque::from([(sz, sr)]);
    mask[[sz, sr]] = true;
    while let Some((iz, ir)) = queue.pop_front() {
        let neighbours = [
            (iz.wrapping_sub(1), ir),
            (iz + 1, ir),
            (iz, ir.wrapping_sub(1)),
            (iz, ir + 1),
        ];
        for (jz, jr) in neighbours {
            if jz >= nz || jr >= nr || mask[[jz, jr]] {
                continue;
            }
            if open(jz, jr) {
                mask[[jz, jr]] = true;
                queue.push_back((jz, jr));
            }
        }
    }
    Ok(mask)
}
