// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Interchange Record
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat snapshot of an equilibrium carrying every field an equilibrium file
//! writer needs. The byte layout of any particular format is left to the
//! writer.

use crate::diagnostics::{plasma_current, safety_factor};
use crate::equilibrium::EquilibriumState;
use equilibrium_math::quadrature::linspace;
use equilibrium_types::error::EquilibriumResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoilCurrent {
    pub name: String,
    pub current: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterchangeRecord {
    pub r_min: f64,
    pub r_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub nr: usize,
    pub nz: usize,
    /// Total flux, one row per Z.
    pub psi: Vec<Vec<f64>>,
    pub psi_axis: f64,
    pub psi_boundary: f64,
    pub r_axis: Option<f64>,
    pub z_axis: Option<f64>,
    pub plasma_current: f64,
    pub f_vac: f64,
    /// Normalized flux of the profile samples, 0 to 1 inclusive.
    pub psi_n: Vec<f64>,
    pub pressure: Vec<f64>,
    pub pprime: Vec<f64>,
    pub fpol: Vec<f64>,
    pub ffprime: Vec<f64>,
    /// Normalized flux of the q samples, 0.05 to 0.95 inclusive.
    pub q_psi_n: Vec<f64>,
    pub q: Vec<f64>,
    pub coils: Vec<CoilCurrent>,
    pub converged: bool,
    pub limited: bool,
    pub iterations: usize,
    pub residual: Option<f64>,
}

impl InterchangeRecord {
    pub fn to_json(&self) -> EquilibriumResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl EquilibriumState {
    /// Snapshot with `n` profile samples and `n` q samples.
    ///
    /// Works on unconverged states too. Profile samples are NaN until the
    /// profile has been evaluated, and q is NaN wherever no surface can be
    /// traced.
    pub fn interchange_record(&self, n: usize) -> InterchangeRecord {
        let grid = self.grid();
        let psi_n = linspace(0.0, 1.0, n);
        let sample = |f: &dyn Fn(f64) -> f64| psi_n.iter().map(|&s| f(s)).collect::<Vec<_>>();
        let (pressure, pprime, fpol, ffprime) = match &self.coefficients {
            Some(c) => (
                sample(&|s| self.profile.pressure(c, s)),
                sample(&|s| self.profile.pprime(c, s)),
                sample(&|s| self.profile.fpol(c, s)),
                sample(&|s| self.profile.ffprime(c, s)),
            ),
            None => {
                let nan = vec![f64::NAN; n];
                (nan.clone(), nan.clone(), nan.clone(), nan)
            }
        };
        let (q_psi_n, q) = match safety_factor(self, n) {
            Ok(profile) => profile.unzip(),
            Err(_) => (linspace(0.05, 0.95, n), vec![f64::NAN; n]),
        };

        InterchangeRecord {
            r_min: grid.r_min(),
            r_max: grid.r_max(),
            z_min: grid.z_min(),
            z_max: grid.z_max(),
            nr: grid.nr,
            nz: grid.nz,
            psi: self.flux.psi.rows().into_iter().map(|row| row.to_vec()).collect(),
            psi_axis: self.flux.psi_axis,
            psi_boundary: self.flux.psi_boundary,
            r_axis: self.axis.map(|a| a.0),
            z_axis: self.axis.map(|a| a.1),
            plasma_current: plasma_current(self),
            f_vac: self.profile.f_vac(),
            psi_n,
            pressure,
            pprime,
            fpol,
            ffprime,
            q_psi_n,
            q,
            coils: self
                .device
                .currents()
                .into_iter()
                .map(|(name, current)| CoilCurrent { name, current })
                .collect(),
            converged: self.is_converged(),
            limited: self.limited,
            iterations: self.iterations,
            residual: self.final_residual(),
        }
    }
}
