// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Diagnostics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Derived quantities of a solved equilibrium. None of these mutate the state.

use crate::equilibrium::EquilibriumState;
use crate::profile::ProfileCoefficients;
use equilibrium_math::interp::BicubicInterpolator;
use equilibrium_math::quadrature::{linspace, pairwise_sum_by};
use equilibrium_types::constants::{MU0_SI, TWO_PI};
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};

/// Rays traced per flux surface.
const SURFACE_RAYS: usize = 128;

/// Bisection steps when locating a surface crossing.
const BISECTION_STEPS: usize = 48;

/// First and last normalized flux of the q profile.
const Q_PSI_N_RANGE: (f64, f64) = (0.05, 0.95);

/// ∫ J_φ dR dZ [A].
pub fn plasma_current(state: &EquilibriumState) -> f64 {
    pairwise_sum_by(state.j_tor.iter(), |&j| j) * state.grid().cell_area()
}

/// Pressure [Pa] at normalized flux `psi_n`; NaN before the profile has been
/// evaluated.
pub fn pressure(state: &EquilibriumState, psi_n: f64) -> f64 {
    match &state.coefficients {
        Some(c) => state.profile.pressure(c, psi_n),
        None => f64::NAN,
    }
}

/// ∫ 2πR dR dZ over the plasma region [m³].
pub fn plasma_volume(state: &EquilibriumState) -> f64 {
    let grid = state.grid();
    pairwise_sum_by(state.plasma_mask.indexed_iter(), |((_, ir), &inside)| {
        if inside {
            TWO_PI * grid.r[ir]
        } else {
            0.0
        }
    }) * grid.cell_area()
}

/// βp = (8π / μ₀) ∫p dR dZ / Ip² over the plasma region.
///
/// This is the quantity a `BetapIp` profile holds fixed, so a solve
/// constrained to βp reports that value back.
pub fn poloidal_beta(state: &EquilibriumState) -> f64 {
    let Some(coeffs) = state.coefficients.as_ref() else {
        return f64::NAN;
    };
    let ip = plasma_current(state);
    if ip == 0.0 || !ip.is_finite() {
        return f64::NAN;
    }
    let p_int = pairwise_sum_by(
        state.flux.psi.iter().zip(state.plasma_mask.iter()),
        |(&psi, &inside)| {
            if inside {
                state.profile.pressure(coeffs, normalize(coeffs, psi))
            } else {
                0.0
            }
        },
    ) * state.grid().cell_area();
    4.0 * TWO_PI / MU0_SI * p_int / (ip * ip)
}

fn normalize(coeffs: &ProfileCoefficients, psi: f64) -> f64 {
    (psi - coeffs.psi_axis) / (coeffs.psi_boundary - coeffs.psi_axis)
}

/// Lazy (ψ_N, q) pairs on `n` flux surfaces evenly spaced in ψ_N between
/// 0.05 and 0.95.
///
/// Each q is computed when the iterator reaches it, by tracing the surface
/// along rays from the axis and integrating (F / 2π) ∮ dl / (R |∇ψ|). The
/// sign of q follows F. Surfaces that cannot be traced inside the domain
/// give NaN. Clones start over from the first surface.
pub fn safety_factor(state: &EquilibriumState, n: usize) -> EquilibriumResult<SafetyFactorProfile<'_>> {
    let (coeffs, axis) = match (state.coefficients, state.axis) {
        (Some(c), Some(a)) => (c, a),
        _ => {
            return Err(EquilibriumError::ProfileDegenerate {
                psi_axis: state.flux.psi_axis,
                psi_boundary: state.flux.psi_boundary,
            })
        }
    };
    Ok(SafetyFactorProfile {
        state,
        coeffs,
        axis,
        interp: BicubicInterpolator::new(&state.flux.psi, state.grid()),
        surfaces: linspace(Q_PSI_N_RANGE.0, Q_PSI_N_RANGE.1, n),
        next: 0,
    })
}

#[derive(Debug, Clone)]
pub struct SafetyFactorProfile<'a> {
    state: &'a EquilibriumState,
    coeffs: ProfileCoefficients,
    axis: (f64, f64),
    interp: BicubicInterpolator,
    surfaces: Vec<f64>,
    next: usize,
}

impl SafetyFactorProfile<'_> {
    /// Go back to the first surface.
    pub fn restart(&mut self) {
        self.next = 0;
    }

    fn psi_n_at(&self, r: f64, z: f64) -> Option<f64> {
        self.interp
            .value(r, z)
            .ok()
            .map(|psi| normalize(&self.coeffs, psi))
    }

    /// Distance along the ray at `angle` where ψ_N first reaches `target`.
    fn crossing(&self, angle: f64, target: f64) -> Option<f64> {
        let grid = self.state.grid();
        let step = 0.5 * grid.dr.min(grid.dz);
        let max_len = (grid.r_max() - grid.r_min()).hypot(grid.z_max() - grid.z_min());
        let (c, s) = (angle.cos(), angle.sin());
        let (r0, z0) = self.axis;

        let mut inner = 0.0;
        let mut outer = step;
        loop {
            if outer > max_len {
                return None;
            }
            let value = self.psi_n_at(r0 + outer * c, z0 + outer * s)?;
            if value >= target {
                break;
            }
            inner = outer;
            outer += step;
        }
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (inner + outer);
            let value = self.psi_n_at(r0 + mid * c, z0 + mid * s)?;
            if value >= target {
                outer = mid;
            } else {
                inner = mid;
            }
        }
        Some(0.5 * (inner + outer))
    }

    fn q_on_surface(&self, psi_n: f64) -> Option<f64> {
        let (r0, z0) = self.axis;
        let mut points = Vec::with_capacity(SURFACE_RAYS);
        for j in 0..SURFACE_RAYS {
            let angle = TWO_PI * j as f64 / SURFACE_RAYS as f64;
            let d = self.crossing(angle, psi_n)?;
            points.push((r0 + d * angle.cos(), z0 + d * angle.sin()));
        }

        let mut terms = Vec::with_capacity(SURFACE_RAYS);
        for j in 0..SURFACE_RAYS {
            let (ra, za) = points[j];
            let (rb, zb) = points[(j + 1) % SURFACE_RAYS];
            let (rm, zm) = (0.5 * (ra + rb), 0.5 * (za + zb));
            let (d_r, d_z) = self.interp.gradient(rm, zm).ok()?;
            let grad = d_r.hypot(d_z);
            if grad == 0.0 {
                return None;
            }
            terms.push((rb - ra).hypot(zb - za) / (rm * grad));
        }
        let f = self.state.profile.fpol(&self.coeffs, psi_n);
        Some(f / TWO_PI * pairwise_sum_by(terms, |t| t))
    }
}

impl Iterator for SafetyFactorProfile<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let psi_n = *self.surfaces.get(self.next)?;
        self.next += 1;
        Some((psi_n, self.q_on_surface(psi_n).unwrap_or(f64::NAN)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.surfaces.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SafetyFactorProfile<'_> {}
