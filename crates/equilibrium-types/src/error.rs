// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EquilibriumError {
    /// Grid bounds inverted, non-finite, or too few points for the stencil.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Interpolation requested outside the grid bounds.
    #[error("Point (R={r}, Z={z}) lies outside the computational domain")]
    OutOfDomain { r: f64, z: f64 },

    /// Axis and boundary flux are indistinguishable: no plasma region.
    #[error("Degenerate profile: psi_axis={psi_axis:e}, psi_boundary={psi_boundary:e}")]
    ProfileDegenerate { psi_axis: f64, psi_boundary: f64 },

    /// Zero pivot while factorizing the discrete Grad-Shafranov operator.
    #[error("Singular elliptic operator (zero pivot at row {row})")]
    SingularOperator { row: usize },

    /// The regularized control system could not be solved.
    #[error("Underdetermined coil control: {0}")]
    UnderdeterminedControl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EquilibriumResult<T> = Result<T, EquilibriumError>;
