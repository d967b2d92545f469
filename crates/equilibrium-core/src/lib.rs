// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Equilibrium Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Free-boundary Grad-Shafranov equilibrium solver.
//!
//! Leaf to root: Green's functions and coils, current profiles, critical
//! points, the free-boundary elliptic solve, the coil constraint fitter,
//! the Picard iteration and diagnostics of the result.

pub mod bfield;
pub mod control;
pub mod critical;
pub mod device;
pub mod diagnostics;
pub mod equilibrium;
pub mod greens;
pub mod gs_solver;
pub mod interchange;
pub mod picard;
pub mod profile;
pub mod scenario;

pub use equilibrium::{EquilibriumState, SolveStatus};
pub use picard::{solve, solve_with_observer, PicardConfig, PicardObserver, SolveError};
pub use profile::Profile;
pub use scenario::Scenario;
