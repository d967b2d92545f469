// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Multigrid Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geometric multigrid V-cycle for Δ*ψ = rhs with Dirichlet edges.
//!
//! - **Restriction**: full weighting from fine to coarse
//! - **Prolongation**: bilinear interpolation from coarse to fine
//! - **Smoother**: Red-Black SOR from [`crate::sor`]
//!
//! A level is coarsened only when both (nr − 1) and (nz − 1) are even, so
//! every coarse node coincides with a fine node. Grids of size 2^k + 1
//! coarsen all the way down; other sizes stop early and rely on the
//! coarse-level sweeps.

use crate::sor::sor_step;
use crate::stencil::{residual, residual_norm};
use equilibrium_types::error::EquilibriumResult;
use equilibrium_types::state::Grid2D;
use ndarray::Array2;

/// Configuration for the multigrid V-cycle solver.
#[derive(Debug, Clone)]
pub struct MultigridConfig {
    /// Number of pre-smoothing SOR sweeps (default: 3)
    pub pre_smooth: usize,
    /// Number of post-smoothing SOR sweeps (default: 3)
    pub post_smooth: usize,
    /// SOR relaxation parameter (default: 1.8)
    pub omega: f64,
    /// Number of coarsest-level SOR sweeps (default: 50)
    pub coarse_iters: usize,
    /// Minimum grid dimension for coarsening (default: 5)
    pub min_grid_size: usize,
}

impl Default for MultigridConfig {
    fn default() -> Self {
        MultigridConfig {
            pre_smooth: 3,
            post_smooth: 3,
            omega: 1.8,
            coarse_iters: 50,
            min_grid_size: 5,
        }
    }
}

/// Outcome of a multigrid solve.
#[derive(Debug, Clone)]
pub struct MultigridResult {
    /// Number of V-cycles performed.
    pub cycles: usize,
    /// Final max-norm residual.
    pub residual: f64,
    /// Whether the relative tolerance was reached.
    pub converged: bool,
}

/// Full-weighting restriction, 1/16 [1 2 1; 2 4 2; 1 2 1].
fn restrict(fine: &Array2<f64>, coarse: &mut Array2<f64>) {
    let (cnz, cnr) = coarse.dim();

    for iz in 1..cnz - 1 {
        for ir in 1..cnr - 1 {
            let fiz = 2 * iz;
            let fir = 2 * ir;
            coarse[[iz, ir]] = (4.0 * fine[[fiz, fir]]
                + 2.0
                    * (fine[[fiz - 1, fir]]
                        + fine[[fiz + 1, fir]]
                        + fine[[fiz, fir - 1]]
                        + fine[[fiz, fir + 1]])
                + fine[[fiz - 1, fir - 1]]
                + fine[[fiz - 1, fir + 1]]
                + fine[[fiz + 1, fir - 1]]
                + fine[[fiz + 1, fir + 1]])
                / 16.0;
        }
    }
}

/// Bilinear prolongation, added onto the interior of `fine`.
fn prolongate_add(coarse: &Array2<f64>, fine: &mut Array2<f64>) {
    let (nz, nr) = fine.dim();

    for iz in 1..nz - 1 {
        for ir in 1..nr - 1 {
            let (cz, oz) = (iz / 2, iz % 2);
            let (cr, or) = (ir / 2, ir % 2);
            let value = match (oz, or) {
                (0, 0) => coarse[[cz, cr]],
                (0, _) => 0.5 * (coarse[[cz, cr]] + coarse[[cz, cr + 1]]),
                (_, 0) => 0.5 * (coarse[[cz, cr]] + coarse[[cz + 1, cr]]),
                _ => {
                    0.25 * (coarse[[cz, cr]]
                        + coarse[[cz, cr + 1]]
                        + coarse[[cz + 1, cr]]
                        + coarse[[cz + 1, cr + 1]])
                }
            };
            fine[[iz, ir]] += value;
        }
    }
}

fn can_coarsen(grid: &Grid2D, config: &MultigridConfig) -> bool {
    grid.nr > config.min_grid_size
        && grid.nz > config.min_grid_size
        && (grid.nr - 1) % 2 == 0
        && (grid.nz - 1) % 2 == 0
}

fn coarsen_grid(fine: &Grid2D) -> EquilibriumResult<Grid2D> {
    Grid2D::new(
        fine.r_min(),
        fine.r_max(),
        fine.z_min(),
        fine.z_max(),
        fine.nr.div_ceil(2),
        fine.nz.div_ceil(2),
    )
}

/// One V-cycle on the current level, recursing to coarser levels.
fn v_cycle(
    psi: &mut Array2<f64>,
    rhs: &Array2<f64>,
    grid: &Grid2D,
    config: &MultigridConfig,
) -> EquilibriumResult<()> {
    if !can_coarsen(grid, config) {
        for _ in 0..config.coarse_iters {
            sor_step(psi, rhs, grid, config.omega);
        }
        return Ok(());
    }

    for _ in 0..config.pre_smooth {
        sor_step(psi, rhs, grid, config.omega);
    }

    let residual_fine = residual(psi, rhs, grid);
    let coarse_grid = coarsen_grid(grid)?;
    let mut residual_coarse = Array2::zeros(coarse_grid.shape());
    restrict(&residual_fine, &mut residual_coarse);

    // Error equation Δ*e = r with e = 0 on the edge
    let mut correction = Array2::zeros(coarse_grid.shape());
    v_cycle(&mut correction, &residual_coarse, &coarse_grid, config)?;
    prolongate_add(&correction, psi);

    for _ in 0..config.post_smooth {
        sor_step(psi, rhs, grid, config.omega);
    }
    Ok(())
}

/// Solve Δ*ψ = rhs by V-cycles, keeping the edge values of `psi` fixed.
///
/// Stops once the residual drops below `rel_tol` times the initial residual
/// or after `max_cycles`.
///
/// # Example
/// ```
/// use equilibrium_math::multigrid::{multigrid_solve, MultigridConfig};
/// use equilibrium_types::state::Grid2D;
/// use ndarray::Array2;
///
/// let grid = Grid2D::new(1.0, 9.0, -5.0, 5.0, 33, 33).unwrap();
/// let mut psi = Array2::zeros((33, 33));
/// let rhs = Array2::from_elem((33, 33), -1.0);
///
/// let result = multigrid_solve(
///     &mut psi, &rhs, &grid,
///     &MultigridConfig::default(), 30, 1e-8,
/// ).unwrap();
/// assert!(result.converged);
/// ```
pub fn multigrid_solve(
    psi: &mut Array2<f64>,
    rhs: &Array2<f64>,
    grid: &Grid2D,
    config: &MultigridConfig,
    max_cycles: usize,
    rel_tol: f64,
) -> EquilibriumResult<MultigridResult> {
    let initial = residual_norm(psi, rhs, grid);
    if initial == 0.0 {
        return Ok(MultigridResult {
            cycles: 0,
            residual: 0.0,
            converged: true,
        });
    }
    let target = rel_tol * initial;

    let mut res = initial;
    for cycle in 1..=max_cycles {
        v_cycle(psi, rhs, grid, config)?;
        res = residual_norm(psi, rhs, grid);
        if res <= target {
            return Ok(MultigridResult {
                cycles: cycle,
                residual: res,
                converged: true,
            });
        }
    }

    Ok(MultigridResult {
        cycles: max_cycles,
        residual: res,
        converged: false,
    })
}
