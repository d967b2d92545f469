// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Control Targets
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plasma shape targets used to fit coil currents.
//!
//! Coordinates are continuous (R, Z) positions in metres, not grid indices.

use serde::{Deserialize, Serialize};

/// Location where the poloidal field should vanish (a saddle of Ψ).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XPointTarget {
    pub r: f64,
    pub z: f64,
}

/// Two points required to lie on the same flux surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsofluxTarget {
    pub r_ref: f64,
    pub z_ref: f64,
    pub r: f64,
    pub z: f64,
}

/// Explicit flux value at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxValueTarget {
    pub r: f64,
    pub z: f64,
    pub psi: f64,
}

/// Immutable set of shape constraints for one solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlTargets {
    #[serde(default)]
    pub x_points: Vec<XPointTarget>,
    #[serde(default)]
    pub isoflux: Vec<IsofluxTarget>,
    #[serde(default)]
    pub psi_values: Vec<FluxValueTarget>,
}

impl ControlTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x_point(mut self, r: f64, z: f64) -> Self {
        self.x_points.push(XPointTarget { r, z });
        self
    }

    pub fn with_isoflux(mut self, r_ref: f64, z_ref: f64, r: f64, z: f64) -> Self {
        self.isoflux.push(IsofluxTarget { r_ref, z_ref, r, z });
        self
    }

    pub fn with_psi_value(mut self, r: f64, z: f64, psi: f64) -> Self {
        self.psi_values.push(FluxValueTarget { r, z, psi });
        self
    }

    /// Number of linear equations the targets contribute:
    /// two per X-point, one per isoflux pair, one per flux value.
    pub fn equation_count(&self) -> usize {
        2 * self.x_points.len() + self.isoflux.len() + self.psi_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equation_count() == 0
    }

    /// Every (R, Z) referenced by a target, in row order.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let mut pts = Vec::with_capacity(self.equation_count() + self.isoflux.len());
        pts.extend(self.x_points.iter().map(|x| (x.r, x.z)));
        for iso in &self.isoflux {
            pts.push((iso.r_ref, iso.z_ref));
            pts.push((iso.r, iso.z));
        }
        pts.extend(self.psi_values.iter().map(|p| (p.r, p.z)));
        pts
    }
}
