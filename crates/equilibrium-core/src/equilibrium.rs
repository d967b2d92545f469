// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Equilibrium State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The unit a free-boundary solve produces and consumes.

use crate::control::FitReport;
use crate::critical::CriticalPoint;
use crate::device::Device;
use crate::gs_solver::FreeBoundarySolver;
use crate::profile::{Profile, ProfileCoefficients};
use equilibrium_types::config::{EllipticMethod, EquilibriumConfig};
use equilibrium_types::error::EquilibriumResult;
use equilibrium_types::state::{FluxField, Grid2D};
use ndarray::Array2;
use std::sync::Arc;

/// Lifecycle of a Picard solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Initializing,
    Iterating,
    Converged,
    Diverged,
    MaxIterationsExceeded,
}

impl SolveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SolveStatus::Converged | SolveStatus::Diverged | SolveStatus::MaxIterationsExceeded
        )
    }
}

/// Grid, flux, profile, coils and convergence metadata of one equilibrium.
///
/// The geometry-dependent solver is shared read-only between clones; every
/// field array and the coil currents are owned per state.
#[derive(Debug, Clone)]
pub struct EquilibriumState {
    solver: Arc<FreeBoundarySolver>,
    pub device: Device,
    pub profile: Profile,
    /// Coefficients of the last profile evaluation.
    pub coefficients: Option<ProfileCoefficients>,
    /// Total flux with axis and boundary values.
    pub flux: FluxField,
    /// Plasma contribution to the flux; coil flux is `flux.psi − psi_plasma`.
    pub psi_plasma: Array2<f64>,
    pub j_tor: Array2<f64>,
    pub axis: Option<(f64, f64)>,
    pub x_points: Vec<CriticalPoint>,
    pub plasma_mask: Array2<bool>,
    /// True when the edge of the domain, not an X-point, bounds the plasma.
    pub limited: bool,
    pub status: SolveStatus,
    pub iterations: usize,
    pub residual_history: Vec<f64>,
    /// Relaxation factor in use at the last iteration.
    pub relaxation: f64,
    /// Coil fit of the last iteration; `None` before the first one.
    pub last_fit: Option<FitReport>,
}

impl EquilibriumState {
    /// Empty state on `grid`; precomputes the flux solver for `device`.
    pub fn new(
        grid: Grid2D,
        device: Device,
        profile: Profile,
        method: EllipticMethod,
    ) -> EquilibriumResult<Self> {
        let solver = Arc::new(FreeBoundarySolver::new(grid, &device, method)?);
        Ok(Self::with_solver(solver, device, profile))
    }

    /// Empty state reusing an existing solver.
    pub fn with_solver(solver: Arc<FreeBoundarySolver>, device: Device, profile: Profile) -> Self {
        let shape = solver.grid().shape();
        EquilibriumState {
            device,
            profile,
            coefficients: None,
            flux: FluxField::zeros(solver.grid()),
            psi_plasma: Array2::zeros(shape),
            j_tor: Array2::zeros(shape),
            axis: None,
            x_points: Vec::new(),
            plasma_mask: Array2::from_elem(shape, false),
            limited: false,
            status: SolveStatus::Initializing,
            iterations: 0,
            residual_history: Vec::new(),
            relaxation: 1.0,
            last_fit: None,
            solver,
        }
    }

    pub fn from_config(config: &EquilibriumConfig) -> EquilibriumResult<Self> {
        let grid = config.create_grid()?;
        let device = Device::from_config(&config.device)?;
        let profile = Profile::from_config(&config.profile)?;
        Self::new(grid, device, profile, config.solver.elliptic_method)
    }

    pub fn grid(&self) -> &Grid2D {
        self.solver.grid()
    }

    pub fn solver(&self) -> &FreeBoundarySolver {
        &self.solver
    }

    pub fn shared_solver(&self) -> Arc<FreeBoundarySolver> {
        Arc::clone(&self.solver)
    }

    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    pub fn final_residual(&self) -> Option<f64> {
        self.residual_history.last().copied()
    }

    /// Coil contribution to the total flux.
    pub fn psi_coils(&self) -> Array2<f64> {
        &self.flux.psi - &self.psi_plasma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Coil, Filament};
    use equilibrium_types::config::ProfileConfig;

    fn state() -> EquilibriumState {
        let grid = Grid2D::new(1.0, 2.0, -1.0, 1.0, 17, 17).unwrap();
        let device = Device {
            name: "d".to_string(),
            coils: vec![Coil {
                name: "PF".to_string(),
                filaments: vec![Filament {
                    r: 2.2,
                    z: 0.0,
                    turns: 1.0,
                }],
                current: 0.0,
                control: true,
            }],
        };
        let profile = Profile::from_config(&ProfileConfig::PaxisIp {
            p_axis: 1e3,
            ip: 1e5,
            f_vac: 1.0,
            alpha_m: 1.0,
            alpha_n: 2.0,
            r_axis: None,
        })
        .unwrap();
        EquilibriumState::new(grid, device, profile, EllipticMethod::Direct).unwrap()
    }

    #[test]
    fn test_new_state_is_initializing_and_empty() {
        let s = state();
        assert_eq!(s.status, SolveStatus::Initializing);
        assert!(!s.status.is_terminal());
        assert_eq!(s.grid().shape(), (17, 17));
        assert!(s.flux.psi.iter().all(|&v| v == 0.0));
        assert!(s.final_residual().is_none());
        assert!(s.coefficients.is_none());
    }

    #[test]
    fn test_clones_share_solver_but_not_fields() {
        let a = state();
        let mut b = a.clone();
        b.flux.psi[[3, 3]] = 1.0;
        b.device.coils[0].current = 5.0;
        assert_eq!(a.flux.psi[[3, 3]], 0.0);
        assert_eq!(a.device.coils[0].current, 0.0);
        assert!(Arc::ptr_eq(&a.shared_solver(), &b.shared_solver()));
    }

    #[test]
    fn test_psi_coils_is_difference() {
        let mut s = state();
        s.flux.psi.fill(2.0);
        s.psi_plasma.fill(0.5);
        assert!(s.psi_coils().iter().all(|&v| (v - 1.5).abs() < 1e-15));
    }
}
