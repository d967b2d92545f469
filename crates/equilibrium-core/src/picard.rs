// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Picard Iteration
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nonlinear free-boundary equilibrium iteration.
//!
//! Each iteration k:
//! 1. locate axis, boundary and plasma region of ψ_k; evaluate J_φ(ψ_k)
//! 2. fit the controlled coil currents to the shape targets
//! 3. solve for the plasma flux of J_φ
//! 4. relax the plasma flux, ψ_p ← (1 − ω) ψ_p + ω ψ_p'
//! 5. ψ_{k+1} = ψ_p + coil flux; residual = max|ψ_{k+1} − ψ_k| / (max ψ − min ψ)
//!
//! The loop ends Converged when the residual drops below the tolerance,
//! Diverged when it keeps growing far past its best value, and
//! MaxIterationsExceeded when the iteration or wall-clock budget runs out.

use crate::control;
use crate::critical::{analyse, FluxTopology};
use crate::equilibrium::{EquilibriumState, SolveStatus};
use crate::profile::Profile;
use equilibrium_math::interp::BicubicInterpolator;
use equilibrium_math::quadrature::pairwise_sum_by;
use equilibrium_types::config::SolverConfig;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::state::Grid2D;
use equilibrium_types::targets::ControlTargets;
use log::{debug, info, warn};
use ndarray::{Array2, Zip};
use std::time::Instant;
use thiserror::Error;

/// Width of the seed current, as a fraction of the smaller domain extent.
const SEED_WIDTH_FRACTION: f64 = 0.1;

/// Consecutive residual decreases before a reduced ω is raised again.
const RELAXATION_RECOVERY_STREAK: usize = 3;

/// Options of one solve.
#[derive(Debug, Clone, Default)]
pub struct PicardConfig {
    pub solver: SolverConfig,
    /// Prior equilibrium on the same grid to start from.
    pub warm_start: Option<EquilibriumState>,
}

impl PicardConfig {
    pub fn new(solver: SolverConfig) -> Self {
        PicardConfig {
            solver,
            warm_start: None,
        }
    }

    pub fn with_warm_start(mut self, state: EquilibriumState) -> Self {
        self.warm_start = Some(state);
        self
    }
}

/// Why a solve did not produce a converged equilibrium.
#[derive(Error, Debug)]
pub enum SolveError {
    /// Construction, configuration or numerical failure; no usable state.
    #[error(transparent)]
    Fatal(#[from] EquilibriumError),

    /// Iteration or time budget exhausted; carries the last state.
    #[error("no convergence after {} iterations (residual {:?})", .state.iterations, .state.final_residual())]
    NonConvergence { state: Box<EquilibriumState> },

    /// Residual grew without bound; carries the last state.
    #[error("diverged after {} iterations (residual {:?})", .state.iterations, .state.final_residual())]
    Diverged { state: Box<EquilibriumState> },
}

impl SolveError {
    /// Best-effort state, when the solve got that far.
    pub fn state(&self) -> Option<&EquilibriumState> {
        match self {
            SolveError::Fatal(_) => None,
            SolveError::NonConvergence { state } | SolveError::Diverged { state } => Some(state),
        }
    }

    pub fn into_state(self) -> Option<EquilibriumState> {
        match self {
            SolveError::Fatal(_) => None,
            SolveError::NonConvergence { state } | SolveError::Diverged { state } => Some(*state),
        }
    }

    pub fn residual_history(&self) -> &[f64] {
        self.state().map_or(&[], |s| s.residual_history.as_slice())
    }
}

/// Receives every completed iteration.
pub trait PicardObserver {
    fn on_iteration(&mut self, iteration: usize, residual: f64, state: &EquilibriumState);
}

impl<F> PicardObserver for F
where
    F: FnMut(usize, f64, &EquilibriumState),
{
    fn on_iteration(&mut self, iteration: usize, residual: f64, state: &EquilibriumState) {
        self(iteration, residual, state)
    }
}

/// Solve for a self-consistent free-boundary equilibrium.
pub fn solve(
    initial: EquilibriumState,
    profile: &Profile,
    targets: &ControlTargets,
    config: &PicardConfig,
) -> Result<EquilibriumState, SolveError> {
    let mut silent = |_: usize, _: f64, _: &EquilibriumState| {};
    solve_with_observer(initial, profile, targets, config, &mut silent)
}

/// [`solve`] with a callback after each iteration.
pub fn solve_with_observer<O: PicardObserver + ?Sized>(
    initial: EquilibriumState,
    profile: &Profile,
    targets: &ControlTargets,
    config: &PicardConfig,
    observer: &mut O,
) -> Result<EquilibriumState, SolveError> {
    let settings = &config.solver;
    settings.validate()?;
    let start = Instant::now();

    let mut state = match &config.warm_start {
        Some(prior) => warm_state(&initial, prior, profile)?,
        None => seed_state(initial, profile)?,
    };

    if settings.max_iterations == 0 {
        state.status = SolveStatus::MaxIterationsExceeded;
        info!("max_iterations = 0: returning the seeded state");
        return Err(SolveError::NonConvergence {
            state: Box::new(state),
        });
    }
    state.status = SolveStatus::Iterating;

    // a warm start resumes with the relaxation the prior solve ended on
    let mut tracker = RelaxationTracker::new(match &config.warm_start {
        Some(prior) => prior
            .relaxation
            .clamp(settings.min_relaxation, settings.relaxation_factor),
        None => settings.relaxation_factor,
    });
    let mut warned_limited = false;

    for iteration in 1..=settings.max_iterations {
        if let Some(budget) = settings.time_budget_ms {
            let elapsed = start.elapsed().as_secs_f64() * 1e3;
            if iteration > 1 && elapsed > budget {
                if let Err(err) = refresh(&mut state, profile) {
                    debug!("final topology unavailable: {err}");
                }
                state.status = SolveStatus::MaxIterationsExceeded;
                warn!(
                    "time budget of {budget} ms exhausted after {} iterations",
                    state.iterations
                );
                return Err(SolveError::NonConvergence {
                    state: Box::new(state),
                });
            }
        }

        let hint = axis_hint(&state, profile);
        let grid = state.grid().clone();
        let topology = analyse(&state.flux.psi, &grid, Some(hint))?;
        if topology.limited && !targets.x_points.is_empty() && !warned_limited {
            warn!(
                "iteration {iteration}: no X-point bounds the plasma, using the limiter boundary"
            );
            warned_limited = true;
        }
        let (j_tor, coefficients) = profile.evaluate(
            &grid,
            &state.flux.psi,
            topology.psi_axis,
            topology.psi_boundary,
            Some(&topology.mask),
        )?;

        let plasma_interp = BicubicInterpolator::new(&state.psi_plasma, &grid);
        let fit = control::fit(targets, &plasma_interp, &mut state.device, settings.control_gamma)?;

        let omega = tracker.omega;
        let candidate = state.solver().plasma_flux(&j_tor)?;
        let mut psi_plasma = state.psi_plasma.clone();
        Zip::from(&mut psi_plasma)
            .and(&candidate)
            .par_for_each(|old, &new| *old = (1.0 - omega) * *old + omega * new);
        let psi_new = &psi_plasma + &state.solver().coil_flux(&state.device)?;

        let residual = relative_change(&state.flux.psi, &psi_new);

        state.flux.psi = psi_new;
        state.flux.psi_axis = topology.psi_axis;
        state.flux.psi_boundary = topology.psi_boundary;
        state.psi_plasma = psi_plasma;
        state.j_tor = j_tor;
        state.coefficients = Some(coefficients);
        apply_topology(&mut state, topology);
        state.iterations = iteration;
        state.residual_history.push(residual);
        state.relaxation = omega;
        state.last_fit = Some(fit);

        debug!(
            "picard {iteration}: residual {residual:.3e}, omega {omega:.3}, psi_axis {:.6e}, psi_boundary {:.6e}",
            state.flux.psi_axis, state.flux.psi_boundary
        );
        observer.on_iteration(iteration, residual, &state);

        if !residual.is_finite() || state.flux.psi.iter().any(|v| !v.is_finite()) {
            state.status = SolveStatus::Diverged;
            warn!("non-finite flux at iteration {iteration}");
            return Err(SolveError::Diverged {
                state: Box::new(state),
            });
        }

        if residual < settings.convergence_tolerance {
            refresh(&mut state, profile)?;
            state.status = SolveStatus::Converged;
            info!(
                "equilibrium converged in {iteration} iterations (residual {residual:.3e}, {:.1} ms)",
                start.elapsed().as_secs_f64() * 1e3
            );
            return Ok(state);
        }

        if tracker.record(residual, settings) == Trend::Diverged {
            if let Err(err) = refresh(&mut state, profile) {
                debug!("diverged topology unavailable: {err}");
            }
            state.status = SolveStatus::Diverged;
            warn!(
                "residual grew for {} iterations to {residual:.3e} (best {:.3e}); diverged",
                tracker.rising, tracker.best
            );
            return Err(SolveError::Diverged {
                state: Box::new(state),
            });
        }
        if tracker.omega < omega {
            warn!(
                "residual increased at iteration {iteration}; relaxation reduced to {:.3}",
                tracker.omega
            );
        } else if tracker.omega > omega {
            debug!("relaxation restored to {:.3}", tracker.omega);
        }
    }

    if let Err(err) = refresh(&mut state, profile) {
        debug!("final topology unavailable: {err}");
    }
    state.status = SolveStatus::MaxIterationsExceeded;
    info!(
        "no convergence after {} iterations (residual {:?})",
        state.iterations,
        state.final_residual()
    );
    Err(SolveError::NonConvergence {
        state: Box::new(state),
    })
}

/// Outcome of recording one residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Continue,
    Diverged,
}

/// Residual trend bookkeeping: adaptive relaxation and divergence detection.
#[derive(Debug, Clone)]
struct RelaxationTracker {
    /// ω for the next iteration.
    omega: f64,
    best: f64,
    previous: f64,
    rising: usize,
    falling: usize,
}

impl RelaxationTracker {
    fn new(omega: f64) -> Self {
        RelaxationTracker {
            omega,
            best: f64::INFINITY,
            previous: f64::INFINITY,
            rising: 0,
            falling: 0,
        }
    }

    /// Divergence needs `divergence_window` consecutive rises ending above
    /// `divergence_factor` times the best residual. With adaptive relaxation
    /// ω halves on every rise, down to `min_relaxation`, and doubles after
    /// [`RELAXATION_RECOVERY_STREAK`] consecutive falls, up to
    /// `relaxation_factor`.
    fn record(&mut self, residual: f64, settings: &SolverConfig) -> Trend {
        self.best = self.best.min(residual);
        if residual > self.previous {
            self.rising += 1;
            self.falling = 0;
        } else {
            self.rising = 0;
            self.falling += 1;
        }
        self.previous = residual;

        if self.rising >= settings.divergence_window
            && residual > settings.divergence_factor * self.best
        {
            return Trend::Diverged;
        }
        if settings.adaptive_relaxation {
            if self.rising > 0 && self.omega > settings.min_relaxation {
                self.omega = (0.5 * self.omega).max(settings.min_relaxation);
            } else if self.falling >= RELAXATION_RECOVERY_STREAK
                && self.omega < settings.relaxation_factor
            {
                self.omega = (2.0 * self.omega).min(settings.relaxation_factor);
                self.falling = 0;
            }
        }
        Trend::Continue
    }
}

/// Fresh state: a Gaussian current of the target Ip centred on the axis
/// hint, its free-boundary flux and the initial coil flux.
///
/// States that already carry plasma flux are returned unchanged apart from
/// the profile.
pub fn seed_state(
    initial: EquilibriumState,
    profile: &Profile,
) -> EquilibriumResult<EquilibriumState> {
    let mut state = initial;
    state.profile = profile.clone();
    state.status = SolveStatus::Initializing;
    state.iterations = 0;
    state.residual_history.clear();
    state.last_fit = None;
    if state.psi_plasma.iter().any(|&v| v != 0.0) {
        return Ok(state);
    }

    let grid = state.grid().clone();
    let (r0, z0) = axis_hint(&state, profile);
    let width = SEED_WIDTH_FRACTION * (grid.r_max() - grid.r_min()).min(grid.z_max() - grid.z_min());
    let mut j_tor = Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
        if grid.is_boundary(iz, ir) {
            return 0.0;
        }
        let d2 = (grid.r[ir] - r0).powi(2) + (grid.z[iz] - z0).powi(2);
        (-d2 / (2.0 * width * width)).exp()
    });
    let total = pairwise_sum_by(j_tor.iter(), |&v| v) * grid.cell_area();
    let scale = if total > 0.0 { profile.ip() / total } else { 0.0 };
    j_tor.mapv_inplace(|v| v * scale);

    state.psi_plasma = state.solver().plasma_flux(&j_tor)?;
    state.flux.psi = &state.psi_plasma + &state.solver().coil_flux(&state.device)?;
    state.j_tor = j_tor;
    if let Ok(topology) = analyse(&state.flux.psi, &grid, Some((r0, z0))) {
        state.flux.psi_axis = topology.psi_axis;
        state.flux.psi_boundary = topology.psi_boundary;
        apply_topology(&mut state, topology);
    }
    debug!(
        "seeded {:.3e} A Gaussian current at R={r0:.3}, Z={z0:.3} (width {width:.3} m)",
        profile.ip()
    );
    Ok(state)
}

fn warm_state(
    initial: &EquilibriumState,
    prior: &EquilibriumState,
    profile: &Profile,
) -> EquilibriumResult<EquilibriumState> {
    if prior.grid() != initial.grid() {
        return Err(EquilibriumError::ConfigError(
            "warm start equilibrium was computed on a different grid".to_string(),
        ));
    }
    if prior.device.coils.len() != initial.device.coils.len() {
        return Err(EquilibriumError::ConfigError(
            "warm start equilibrium has a different coil set".to_string(),
        ));
    }
    seed_state(prior.clone(), profile)
}

/// Axis location to track: the previous axis, else the profile's R hint at
/// the domain mid-height, else the domain centre.
fn axis_hint(state: &EquilibriumState, profile: &Profile) -> (f64, f64) {
    if let Some(axis) = state.axis {
        return axis;
    }
    let (rc, zc) = state.grid().center();
    (profile.axis_hint().unwrap_or(rc), zc)
}

fn apply_topology(state: &mut EquilibriumState, topology: FluxTopology) {
    state.axis = Some((topology.axis.r, topology.axis.z));
    state.x_points = topology.x_points;
    state.plasma_mask = topology.mask;
    state.limited = topology.limited;
}

/// Re-derive axis, boundary, current and profile coefficients from the final
/// flux so every stored quantity describes the same ψ.
fn refresh(state: &mut EquilibriumState, profile: &Profile) -> EquilibriumResult<()> {
    let grid: Grid2D = state.grid().clone();
    let topology = analyse(&state.flux.psi, &grid, state.axis)?;
    let (j_tor, coefficients) = profile.evaluate(
        &grid,
        &state.flux.psi,
        topology.psi_axis,
        topology.psi_boundary,
        Some(&topology.mask),
    )?;
    state.flux.psi_axis = topology.psi_axis;
    state.flux.psi_boundary = topology.psi_boundary;
    state.j_tor = j_tor;
    state.coefficients = Some(coefficients);
    apply_topology(state, topology);
    Ok(())
}

/// max|new − old| / (max new − min new).
fn relative_change(old: &Array2<f64>, new: &Array2<f64>) -> f64 {
    let max_change = Zip::from(old)
        .and(new)
        .fold(0.0_f64, |m, &a, &b| m.max((b - a).abs()));
    let (lo, hi) = new
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if max_change == 0.0 {
        0.0
    } else if span > 0.0 {
        max_change / span
    } else {
        f64::INFINITY
    }
}
