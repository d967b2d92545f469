// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Coil Control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coil current fitting against shape constraints.
//!
//! The plasma flux is held fixed and the controlled coil currents are
//! changed by ΔI so that, to first order:
//!
//! - each X-point target has B_R = B_Z = 0 (two rows),
//! - each isoflux pair has ψ(A) = ψ(B) (one row),
//! - each flux target has ψ = value (one row).
//!
//! The rows are linear in ΔI with the per-ampere coil responses as
//! coefficients. The system is solved with SVD-based Tikhonov
//! regularization, which yields the least-squares solution when the rows
//! conflict and the minimum-norm ΔI when coils outnumber constraints.

use crate::bfield::b_field_at;
use crate::device::Device;
use equilibrium_math::interp::BicubicInterpolator;
use equilibrium_math::linalg::tikhonov_solve;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::targets::ControlTargets;
use log::{debug, warn};
use ndarray::{Array1, Array2};

/// Singular values below this fraction of the largest are discarded.
const SINGULAR_VALUE_CUTOFF: f64 = 1e-13;

/// Condition number above which a fit is reported as poorly posed.
const ILL_CONDITIONED: f64 = 1e12;

/// Linearized constraint system A·ΔI = b.
#[derive(Debug, Clone)]
pub struct ControlSystem {
    pub matrix: Array2<f64>,
    pub rhs: Array1<f64>,
    /// Device coil index of each column.
    pub controlled: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Current change applied to each controlled coil.
    pub delta: Vec<f64>,
    pub controlled: Vec<usize>,
    /// ‖A·ΔI − b‖ after the fit.
    pub residual_norm: f64,
    /// ‖b‖, the constraint violation before the fit.
    pub initial_residual_norm: f64,
    pub rank: usize,
    pub condition_number: f64,
}

/// Build the constraint rows for the present plasma flux and coil currents.
pub fn assemble(
    targets: &ControlTargets,
    plasma: &BicubicInterpolator,
    device: &Device,
) -> EquilibriumResult<ControlSystem> {
    let controlled = device.controlled_indices();
    let rows = targets.equation_count();
    let mut matrix = Array2::zeros((rows, controlled.len()));
    let mut rhs = Array1::zeros(rows);

    let psi_total = |r: f64, z: f64| -> EquilibriumResult<f64> {
        Ok(plasma.value(r, z)? + device.psi_at(r, z))
    };

    let mut row = 0;
    for x in &targets.x_points {
        let (br_p, bz_p) = b_field_at(plasma, x.r, x.z)?;
        let (br_c, bz_c) = device.b_at(x.r, x.z);
        for (col, &k) in controlled.iter().enumerate() {
            let coil = &device.coils[k];
            matrix[[row, col]] = coil.br_per_amp(x.r, x.z);
            matrix[[row + 1, col]] = coil.bz_per_amp(x.r, x.z);
        }
        rhs[row] = -(br_p + br_c);
        rhs[row + 1] = -(bz_p + bz_c);
        row += 2;
    }
    for iso in &targets.isoflux {
        for (col, &k) in controlled.iter().enumerate() {
            let coil = &device.coils[k];
            matrix[[row, col]] =
                coil.psi_per_amp(iso.r_ref, iso.z_ref) - coil.psi_per_amp(iso.r, iso.z);
        }
        rhs[row] = psi_total(iso.r, iso.z)? - psi_total(iso.r_ref, iso.z_ref)?;
        row += 1;
    }
    for target in &targets.psi_values {
        for (col, &k) in controlled.iter().enumerate() {
            matrix[[row, col]] = device.coils[k].psi_per_amp(target.r, target.z);
        }
        rhs[row] = target.psi - psi_total(target.r, target.z)?;
        row += 1;
    }

    Ok(ControlSystem {
        matrix,
        rhs,
        controlled,
    })
}

/// Fit the controlled coil currents to `targets` and apply the change to
/// `device`.
///
/// `gamma` is the Tikhonov weight relative to the largest singular value.
/// Empty targets leave the currents untouched. Fails with
/// `UnderdeterminedControl` when targets exist but no coil is controlled.
pub fn fit(
    targets: &ControlTargets,
    plasma: &BicubicInterpolator,
    device: &mut Device,
    gamma: f64,
) -> EquilibriumResult<FitReport> {
    if targets.is_empty() {
        return Ok(FitReport {
            delta: Vec::new(),
            controlled: Vec::new(),
            residual_norm: 0.0,
            initial_residual_norm: 0.0,
            rank: 0,
            condition_number: 1.0,
        });
    }
    let system = assemble(targets, plasma, device)?;
    if system.controlled.is_empty() {
        return Err(EquilibriumError::UnderdeterminedControl(format!(
            "{} constraint equations but no controlled coils",
            system.rhs.len()
        )));
    }

    let solution = tikhonov_solve(&system.matrix, &system.rhs, gamma, SINGULAR_VALUE_CUTOFF)?;
    let residual = system.matrix.dot(&solution.x) - &system.rhs;
    let condition_number = solution.condition_number();
    if condition_number > ILL_CONDITIONED {
        warn!(
            "coil control system is poorly conditioned (cond = {condition_number:.3e}, rank {} of {})",
            solution.rank,
            system.controlled.len()
        );
    }

    let delta = solution.x.to_vec();
    device.apply_current_changes(&system.controlled, &delta)?;

    let report = FitReport {
        delta,
        controlled: system.controlled,
        residual_norm: residual.dot(&residual).sqrt(),
        initial_residual_norm: system.rhs.dot(&system.rhs).sqrt(),
        rank: solution.rank,
        condition_number,
    };
    debug!(
        "coil fit: constraint residual {:.3e} -> {:.3e}, rank {}",
        report.initial_residual_norm, report.residual_norm, report.rank
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Coil, Filament};
    use equilibrium_types::state::Grid2D;

    fn coil(name: &str, r: f64, z: f64, control: bool) -> Coil {
        Coil {
            name: name.to_string(),
            filaments: vec![Filament { r, z, turns: 1.0 }],
            current: 0.0,
            control,
        }
    }

    fn zero_plasma() -> BicubicInterpolator {
        let grid = Grid2D::new(0.5, 3.0, -2.0, 2.0, 17, 17).unwrap();
        BicubicInterpolator::new(&Array2::zeros(grid.shape()), &grid)
    }

    fn uniform_vertical_plasma() -> BicubicInterpolator {
        // ψ = c R² / 2 gives B_Z = c everywhere
        let grid = Grid2D::new(0.5, 3.0, -2.0, 2.0, 33, 33).unwrap();
        let psi = Array2::from_shape_fn(grid.shape(), |(_, ir)| 0.05 * grid.r[ir].powi(2));
        BicubicInterpolator::new(&psi, &grid)
    }

    #[test]
    fn test_flux_value_fitted_exactly_with_one_coil() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("PF", 2.5, 1.0, true)],
        };
        let targets = ControlTargets::new().with_psi_value(1.5, 0.0, 0.02);
        let report = fit(&targets, &zero_plasma(), &mut device, 1e-12).unwrap();
        let achieved = device.psi_at(1.5, 0.0);
        assert!((achieved - 0.02).abs() < 1e-9, "psi = {achieved}");
        assert!(report.residual_norm < 1e-9);
        assert_eq!(report.rank, 1);
    }

    #[test]
    fn test_minimum_norm_split_between_identical_coils() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("A", 2.5, 1.0, true), coil("B", 2.5, 1.0, true)],
        };
        let targets = ControlTargets::new().with_psi_value(1.5, 0.0, 0.02);
        fit(&targets, &zero_plasma(), &mut device, 1e-12).unwrap();
        let (a, b) = (device.coils[0].current, device.coils[1].current);
        assert!((a - b).abs() < 1e-9 * a.abs(), "{a} vs {b}");
    }

    #[test]
    fn test_single_x_point_one_coil_minimizes_field() {
        let plasma = uniform_vertical_plasma();
        let template = Device {
            name: "d".to_string(),
            coils: vec![coil("PF", 1.2, -1.6, true)],
        };
        let targets = ControlTargets::new().with_x_point(1.4, -1.0);
        let mut device = template.clone();
        let report = fit(&targets, &plasma, &mut device, 1e-12).unwrap();

        let field_sq = |current: f64| {
            let mut d = template.clone();
            d.coils[0].current = current;
            let (br_p, bz_p) = b_field_at(&plasma, 1.4, -1.0).unwrap();
            let (br_c, bz_c) = d.b_at(1.4, -1.0);
            (br_p + br_c).powi(2) + (bz_p + bz_c).powi(2)
        };
        let best = device.coils[0].current;
        assert!(best != 0.0);
        assert!(field_sq(best) <= field_sq(best * 1.01));
        assert!(field_sq(best) <= field_sq(best * 0.99));
        assert!((field_sq(best).sqrt() - report.residual_norm).abs() < 1e-9);
    }

    #[test]
    fn test_conflicting_isoflux_reports_residual() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("PF", 2.8, 1.8, true)],
        };
        // ψ(A) = ψ(B) and ψ(A) = ψ(C) cannot both hold with one coil
        // against this plasma
        let targets = ControlTargets::new()
            .with_isoflux(1.0, 0.0, 2.0, 0.0)
            .with_isoflux(1.0, 0.0, 1.0, 1.5);
        let report = fit(&targets, &uniform_vertical_plasma(), &mut device, 1e-12).unwrap();
        assert!(report.residual_norm.is_finite());
        assert!(report.residual_norm > 0.0);
        assert!(report.residual_norm <= report.initial_residual_norm);
    }

    #[test]
    fn test_fixed_coils_are_not_changed() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("FIXED", 2.5, 1.0, false), coil("PF", 2.5, -1.0, true)],
        };
        device.coils[0].current = 7e3;
        let targets = ControlTargets::new().with_psi_value(1.5, 0.0, 0.0);
        let report = fit(&targets, &zero_plasma(), &mut device, 1e-12).unwrap();
        assert_eq!(device.coils[0].current, 7e3);
        assert_eq!(report.controlled, vec![1]);
        assert!(device.psi_at(1.5, 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_controlled_coils_is_underdetermined() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("FIXED", 2.5, 1.0, false)],
        };
        let targets = ControlTargets::new().with_psi_value(1.5, 0.0, 0.0);
        assert!(matches!(
            fit(&targets, &zero_plasma(), &mut device, 1e-12),
            Err(EquilibriumError::UnderdeterminedControl(_))
        ));
    }

    #[test]
    fn test_empty_targets_leave_currents() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("PF", 2.5, 1.0, true)],
        };
        device.coils[0].current = 1.0;
        let report = fit(&ControlTargets::new(), &zero_plasma(), &mut device, 1e-12).unwrap();
        assert!(report.delta.is_empty());
        assert_eq!(device.coils[0].current, 1.0);
    }

    #[test]
    fn test_target_outside_domain_is_reported() {
        let mut device = Device {
            name: "d".to_string(),
            coils: vec![coil("PF", 2.5, 1.0, true)],
        };
        let targets = ControlTargets::new().with_x_point(9.0, 0.0);
        assert!(matches!(
            fit(&targets, &zero_plasma(), &mut device, 1e-12),
            Err(EquilibriumError::OutOfDomain { .. })
        ));
    }
}
