// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Free-Boundary Grad-Shafranov Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linear flux solve for a given toroidal current density.
//!
//! The plasma contribution solves Δ*ψ = −μ₀ R J_φ with Dirichlet values on
//! the domain edge taken from the free-space Green's function sum over the
//! plasma current. Coil flux is added as a superposition of precomputed
//! per-ampere response maps. Everything that depends only on the geometry
//! (the operator factorization, the edge Green's matrix, the coil maps) is
//! computed once in [`FreeBoundarySolver::new`] and shared read-only.

use crate::device::Device;
use crate::greens::greens_psi;
use equilibrium_math::banded::BandedLu;
use equilibrium_math::multigrid::{multigrid_solve, MultigridConfig};
use equilibrium_math::stencil::{assemble_operator, dirichlet_rhs, interior_index};
use equilibrium_types::config::EllipticMethod;
use equilibrium_types::constants::MU0_SI;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::state::Grid2D;
use log::{debug, warn};
use ndarray::{Array1, Array2, Zip};
use rayon::prelude::*;

/// V-cycle budget per multigrid flux solve.
const MULTIGRID_MAX_CYCLES: usize = 100;

/// Residual reduction requested from multigrid.
const MULTIGRID_REL_TOL: f64 = 1e-9;

#[derive(Debug)]
pub struct FreeBoundarySolver {
    grid: Grid2D,
    method: EllipticMethod,
    lu: Option<BandedLu>,
    boundary_nodes: Vec<(usize, usize)>,
    /// G(edge node, interior node) · dR dZ, `[n_edge, n_interior]`.
    boundary_greens: Array2<f64>,
    /// Flux per ampere of each coil on the grid.
    coil_greens: Vec<Array2<f64>>,
}

impl FreeBoundarySolver {
    pub fn new(grid: Grid2D, device: &Device, method: EllipticMethod) -> EquilibriumResult<Self> {
        let lu = match method {
            EllipticMethod::Direct => Some(assemble_operator(&grid).factorize()?),
            EllipticMethod::Multigrid => None,
        };

        let boundary_nodes = grid.boundary_nodes();
        let interior: Vec<(f64, f64)> = (1..grid.nz - 1)
            .flat_map(|iz| (1..grid.nr - 1).map(move |ir| (iz, ir)))
            .map(|(iz, ir)| (grid.r[ir], grid.z[iz]))
            .collect();
        let area = grid.cell_area();
        let mut boundary_greens = Array2::zeros((boundary_nodes.len(), interior.len()));
        Zip::indexed(&mut boundary_greens).par_for_each(|(b, k), g| {
            let (iz, ir) = boundary_nodes[b];
            let (rc, zc) = interior[k];
            *g = greens_psi(rc, zc, grid.r[ir], grid.z[iz]) * area;
        });

        let coil_greens = device
            .coils
            .par_iter()
            .map(|coil| {
                Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
                    coil.psi_per_amp(grid.r[ir], grid.z[iz])
                })
            })
            .collect();

        debug!(
            "flux solver ready: {}x{} grid, {:?}, {} edge nodes, {} coils",
            grid.nr,
            grid.nz,
            method,
            boundary_nodes.len(),
            device.coils.len()
        );

        Ok(FreeBoundarySolver {
            grid,
            method,
            lu,
            boundary_nodes,
            boundary_greens,
            coil_greens,
        })
    }

    pub fn grid(&self) -> &Grid2D {
        &self.grid
    }

    pub fn method(&self) -> EllipticMethod {
        self.method
    }

    /// Flux per ampere of coil `index` on the grid.
    pub fn coil_response(&self, index: usize) -> Option<&Array2<f64>> {
        self.coil_greens.get(index)
    }

    /// Flux of all coils at their present currents.
    pub fn coil_flux(&self, device: &Device) -> EquilibriumResult<Array2<f64>> {
        if device.coils.len() != self.coil_greens.len() {
            return Err(EquilibriumError::ConfigError(format!(
                "solver was built for {} coils, device has {}",
                self.coil_greens.len(),
                device.coils.len()
            )));
        }
        let mut psi = Array2::zeros(self.grid.shape());
        for (coil, map) in device.coils.iter().zip(&self.coil_greens) {
            if coil.current != 0.0 {
                psi.scaled_add(coil.current, map);
            }
        }
        Ok(psi)
    }

    /// Free-boundary flux of the plasma current alone.
    pub fn plasma_flux(&self, j_tor: &Array2<f64>) -> EquilibriumResult<Array2<f64>> {
        let grid = &self.grid;
        if j_tor.dim() != grid.shape() {
            return Err(EquilibriumError::ConfigError(format!(
                "current density shape {:?} does not match grid {:?}",
                j_tor.dim(),
                grid.shape()
            )));
        }

        let mut j_int = Array1::zeros(grid.interior_len());
        for iz in 1..grid.nz - 1 {
            for ir in 1..grid.nr - 1 {
                j_int[interior_index(grid, iz, ir)] = j_tor[[iz, ir]];
            }
        }

        let mut edge = Array1::zeros(self.boundary_nodes.len());
        Zip::from(&mut edge)
            .and(self.boundary_greens.rows())
            .par_for_each(|v, row| *v = row.dot(&j_int));

        let mut psi = Array2::zeros(grid.shape());
        for (&(iz, ir), &v) in self.boundary_nodes.iter().zip(edge.iter()) {
            psi[[iz, ir]] = v;
        }
        let rhs = Zip::from(j_tor)
            .and(&grid.rr)
            .par_map_collect(|&j, &r| -MU0_SI * r * j);

        match &self.lu {
            Some(lu) => {
                let x = lu.solve(&dirichlet_rhs(&psi, &rhs, grid));
                for iz in 1..grid.nz - 1 {
                    for ir in 1..grid.nr - 1 {
                        psi[[iz, ir]] = x[interior_index(grid, iz, ir)];
                    }
                }
            }
            None => {
                let result = multigrid_solve(
                    &mut psi,
                    &rhs,
                    grid,
                    &MultigridConfig::default(),
                    MULTIGRID_MAX_CYCLES,
                    MULTIGRID_REL_TOL,
                )?;
                if !result.converged {
                    warn!(
                        "multigrid flux solve stopped after {} cycles, residual {:.3e}",
                        result.cycles, result.residual
                    );
                }
            }
        }
        Ok(psi)
    }

    /// Total flux: plasma response to `j_tor` plus the given coil flux.
    pub fn solve(
        &self,
        j_tor: &Array2<f64>,
        coil_psi: &Array2<f64>,
    ) -> EquilibriumResult<Array2<f64>> {
        Ok(self.plasma_flux(j_tor)? + coil_psi)
    }
}
