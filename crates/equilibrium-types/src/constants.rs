// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m). All equilibrium quantities are in SI units.
pub const MU0_SI: f64 = 1.2566370614e-6;

/// 2π, used for toroidal volume integrals and flux-surface averages.
pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Minimum number of grid points per axis for the 5-point stencil.
pub const MIN_GRID_POINTS: usize = 3;
