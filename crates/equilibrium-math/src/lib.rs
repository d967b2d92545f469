// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Equilibrium Math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mathematical primitives for the free-boundary equilibrium solver.

pub mod banded;
pub mod elliptic;
pub mod interp;
pub mod linalg;
pub mod multigrid;
pub mod quadrature;
pub mod sor;
pub mod stencil;
