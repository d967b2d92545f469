// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{EquilibriumError, EquilibriumResult};
use crate::state::Grid2D;
use crate::targets::ControlTargets;
use serde::{Deserialize, Serialize};

/// Top-level scenario: device, domain, plasma profile, shape targets, solver.
/// Maps 1:1 to the JSON files under `configs/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumConfig {
    pub name: String,
    /// `[nr, nz]`
    pub grid_resolution: [usize; 2],
    pub dimensions: GridDimensions,
    pub device: DeviceConfig,
    pub profile: ProfileConfig,
    #[serde(default)]
    pub targets: ControlTargets,
    #[serde(default)]
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDimensions {
    #[serde(rename = "R_min")]
    pub r_min: f64,
    #[serde(rename = "R_max")]
    pub r_max: f64,
    #[serde(rename = "Z_min")]
    pub z_min: f64,
    #[serde(rename = "Z_max")]
    pub z_max: f64,
}

/// Static machine description: a named set of coils.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub coils: Vec<CoilConfig>,
}

/// One coil, represented by one or more current filaments in series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoilConfig {
    pub name: String,
    pub filaments: Vec<FilamentConfig>,
    /// Initial current per turn [A].
    #[serde(default)]
    pub current: f64,
    /// Whether the constraint fitter may change this coil's current.
    #[serde(default = "default_control")]
    pub control: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilamentConfig {
    pub r: f64,
    pub z: f64,
    #[serde(default = "default_turns")]
    pub turns: f64,
}

fn default_control() -> bool {
    true
}
fn default_turns() -> f64 {
    1.0
}

/// Plasma current profile parameterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileConfig {
    /// Constrain the pressure on axis and the total plasma current.
    PaxisIp {
        p_axis: f64,
        ip: f64,
        f_vac: f64,
        #[serde(default = "default_alpha_m")]
        alpha_m: f64,
        #[serde(default = "default_alpha_n")]
        alpha_n: f64,
        #[serde(default)]
        r_axis: Option<f64>,
    },
    /// Constrain the poloidal beta and the total plasma current.
    BetapIp {
        beta_p: f64,
        ip: f64,
        f_vac: f64,
        #[serde(default = "default_alpha_m")]
        alpha_m: f64,
        #[serde(default = "default_alpha_n")]
        alpha_n: f64,
        #[serde(default)]
        r_axis: Option<f64>,
    },
}

fn default_alpha_m() -> f64 {
    1.0
}
fn default_alpha_n() -> f64 {
    2.0
}

/// Inner linear solver used for the Grad-Shafranov operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipticMethod {
    /// Banded LU factorization computed once per grid.
    #[default]
    Direct,
    /// Geometric multigrid V-cycles with a red-black SOR smoother.
    Multigrid,
}

/// Picard iteration controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Blend weight ω ∈ (0, 1] of the new plasma flux per iteration.
    #[serde(default = "default_relaxation")]
    pub relaxation_factor: f64,
    /// Converged when max|ΔΨ| / (max Ψ − min Ψ) drops below this.
    #[serde(default = "default_tolerance")]
    pub convergence_tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Halve ω whenever the residual grows.
    #[serde(default = "default_adaptive")]
    pub adaptive_relaxation: bool,
    #[serde(default = "default_min_relaxation")]
    pub min_relaxation: f64,
    /// Consecutive residual increases before divergence is declared.
    #[serde(default = "default_divergence_window")]
    pub divergence_window: usize,
    /// Residual / best residual ratio required to declare divergence.
    #[serde(default = "default_divergence_factor")]
    pub divergence_factor: f64,
    /// Wall-clock budget, checked between iterations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<f64>,
    #[serde(default)]
    pub elliptic_method: EllipticMethod,
    /// Tikhonov weight for the coil-current fit, relative to the largest
    /// singular value of the constraint matrix.
    #[serde(default = "default_control_gamma")]
    pub control_gamma: f64,
}

fn default_relaxation() -> f64 {
    1.0
}
fn default_tolerance() -> f64 {
    1e-3
}
fn default_max_iterations() -> usize {
    50
}
fn default_adaptive() -> bool {
    true
}
fn default_min_relaxation() -> f64 {
    0.05
}
fn default_divergence_window() -> usize {
    5
}
fn default_divergence_factor() -> f64 {
    1e3
}
fn default_control_gamma() -> f64 {
    1e-12
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            relaxation_factor: default_relaxation(),
            convergence_tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            adaptive_relaxation: default_adaptive(),
            min_relaxation: default_min_relaxation(),
            divergence_window: default_divergence_window(),
            divergence_factor: default_divergence_factor(),
            time_budget_ms: None,
            elliptic_method: EllipticMethod::default(),
            control_gamma: default_control_gamma(),
        }
    }
}

impl SolverConfig {
    /// Reject settings that would make the Picard loop meaningless.
    pub fn validate(&self) -> EquilibriumResult<()> {
        let omega = self.relaxation_factor;
        if !omega.is_finite() || omega <= 0.0 || omega > 1.0 {
            return Err(EquilibriumError::ConfigError(format!(
                "relaxation_factor must lie in (0, 1], got {omega}"
            )));
        }
        if !self.min_relaxation.is_finite()
            || self.min_relaxation <= 0.0
            || self.min_relaxation > omega
        {
            return Err(EquilibriumError::ConfigError(format!(
                "min_relaxation must lie in (0, relaxation_factor], got {}",
                self.min_relaxation
            )));
        }
        if !self.convergence_tolerance.is_finite() || self.convergence_tolerance <= 0.0 {
            return Err(EquilibriumError::ConfigError(format!(
                "convergence_tolerance must be finite and > 0, got {}",
                self.convergence_tolerance
            )));
        }
        if self.divergence_window == 0 {
            return Err(EquilibriumError::ConfigError(
                "divergence_window must be >= 1".to_string(),
            ));
        }
        if !self.divergence_factor.is_finite() || self.divergence_factor <= 1.0 {
            return Err(EquilibriumError::ConfigError(format!(
                "divergence_factor must be finite and > 1, got {}",
                self.divergence_factor
            )));
        }
        if let Some(budget) = self.time_budget_ms {
            if !budget.is_finite() || budget < 0.0 {
                return Err(EquilibriumError::ConfigError(format!(
                    "time_budget_ms must be finite and >= 0, got {budget}"
                )));
            }
        }
        if !self.control_gamma.is_finite() || self.control_gamma < 0.0 {
            return Err(EquilibriumError::ConfigError(format!(
                "control_gamma must be finite and >= 0, got {}",
                self.control_gamma
            )));
        }
        Ok(())
    }
}

impl EquilibriumConfig {
    /// Load a scenario from a JSON file.
    pub fn from_file(path: &str) -> EquilibriumResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Create a Grid2D from this config's dimensions and resolution.
    pub fn create_grid(&self) -> EquilibriumResult<Grid2D> {
        Grid2D::new(
            self.dimensions.r_min,
            self.dimensions.r_max,
            self.dimensions.z_min,
            self.dimensions.z_max,
            self.grid_resolution[0],
            self.grid_resolution[1],
        )
    }
}
