// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Greens
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Toroidal Green's functions for axisymmetric current filaments.
//!
//! A circular filament of radius Rc at height Zc carrying 1 A produces the
//! poloidal flux (per radian)
//!
//!   G = (μ₀ / 2π) · √(R Rc) · ((2 − k²) K(k²) − 2 E(k²)) / k
//!
//! with k² = 4 R Rc / ((R + Rc)² + (Z − Zc)²). It satisfies Δ*G = 0 away from
//! the filament. Field components follow from B_R = −(1/R) ∂G/∂Z and
//! B_Z = (1/R) ∂G/∂R, evaluated by central differences of G.

use equilibrium_math::elliptic::ellipke_complement;
use equilibrium_types::constants::MU0_SI;
use std::f64::consts::PI;

/// Lower bound on 1 − k²; keeps G finite when the field point sits on the
/// filament.
const MIN_COMPLEMENT_PARAMETER: f64 = 1e-10;

/// Finite-difference step [m] for field responses.
pub const FIELD_DIFF_STEP: f64 = 1e-4;

/// Flux at `(r, z)` per ampere in a filament at `(rc, zc)`.
pub fn greens_psi(rc: f64, zc: f64, r: f64, z: f64) -> f64 {
    let dz = z - zc;
    let sum_sq = (r + rc).powi(2) + dz * dz;
    let k2 = 4.0 * r * rc / sum_sq;
    // 1 − k² computed without cancellation
    let m1 = (((r - rc).powi(2) + dz * dz) / sum_sq).max(MIN_COMPLEMENT_PARAMETER);
    let k2 = k2.min(1.0 - MIN_COMPLEMENT_PARAMETER);
    let (k_int, e_int) = ellipke_complement(m1);
    (MU0_SI / (2.0 * PI)) * (r * rc).sqrt() * ((2.0 - k2) * k_int - 2.0 * e_int) / k2.sqrt()
}

/// Radial field at `(r, z)` per ampere in a filament at `(rc, zc)`.
pub fn greens_br(rc: f64, zc: f64, r: f64, z: f64) -> f64 {
    let h = FIELD_DIFF_STEP;
    -(greens_psi(rc, zc, r, z + h) - greens_psi(rc, zc, r, z - h)) / (2.0 * h * r)
}

/// Vertical field at `(r, z)` per ampere in a filament at `(rc, zc)`.
pub fn greens_bz(rc: f64, zc: f64, r: f64, z: f64) -> f64 {
    let h = FIELD_DIFF_STEP;
    (greens_psi(rc, zc, r + h, z) - greens_psi(rc, zc, r - h, z)) / (2.0 * h * r)
}
