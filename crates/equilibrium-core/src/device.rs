// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Device
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Poloidal field coils as sets of axisymmetric current filaments.
//!
//! A coil's current is the current per turn; each filament carries
//! `turns × current`. The constraint fitter is the only caller that changes
//! currents, through [`Device::apply_current_changes`].

use crate::greens::{greens_br, greens_bz, greens_psi};
use equilibrium_types::config::DeviceConfig;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filament {
    pub r: f64,
    pub z: f64,
    pub turns: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coil {
    pub name: String,
    pub filaments: Vec<Filament>,
    /// Current per turn [A].
    pub current: f64,
    /// Whether the fitter may change this coil.
    pub control: bool,
}

impl Coil {
    /// Flux at `(r, z)` per ampere of coil current.
    pub fn psi_per_amp(&self, r: f64, z: f64) -> f64 {
        self.filaments
            .iter()
            .map(|f| f.turns * greens_psi(f.r, f.z, r, z))
            .sum()
    }

    /// Radial field at `(r, z)` per ampere of coil current.
    pub fn br_per_amp(&self, r: f64, z: f64) -> f64 {
        self.filaments
            .iter()
            .map(|f| f.turns * greens_br(f.r, f.z, r, z))
            .sum()
    }

    /// Vertical field at `(r, z)` per ampere of coil current.
    pub fn bz_per_amp(&self, r: f64, z: f64) -> f64 {
        self.filaments
            .iter()
            .map(|f| f.turns * greens_bz(f.r, f.z, r, z))
            .sum()
    }
}

/// Static machine description with the current coil state.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub coils: Vec<Coil>,
}

impl Device {
    /// Build a device from its JSON description, validating the geometry.
    pub fn from_config(config: &DeviceConfig) -> EquilibriumResult<Self> {
        let mut coils = Vec::with_capacity(config.coils.len());
        for coil in &config.coils {
            if coil.filaments.is_empty() {
                return Err(EquilibriumError::ConfigError(format!(
                    "coil '{}' has no filaments",
                    coil.name
                )));
            }
            if !coil.current.is_finite() {
                return Err(EquilibriumError::ConfigError(format!(
                    "coil '{}' current must be finite, got {}",
                    coil.name, coil.current
                )));
            }
            let mut filaments = Vec::with_capacity(coil.filaments.len());
            for f in &coil.filaments {
                if !f.r.is_finite() || f.r <= 0.0 {
                    return Err(EquilibriumError::ConfigError(format!(
                        "coil '{}' filament radius must be finite and > 0, got {}",
                        coil.name, f.r
                    )));
                }
                if !f.z.is_finite() || !f.turns.is_finite() {
                    return Err(EquilibriumError::ConfigError(format!(
                        "coil '{}' filament z/turns must be finite",
                        coil.name
                    )));
                }
                filaments.push(Filament {
                    r: f.r,
                    z: f.z,
                    turns: f.turns,
                });
            }
            coils.push(Coil {
                name: coil.name.clone(),
                filaments,
                current: coil.current,
                control: coil.control,
            });
        }
        Ok(Device {
            name: config.name.clone(),
            coils,
        })
    }

    /// `(name, current)` for every coil, in declaration order.
    pub fn currents(&self) -> Vec<(String, f64)> {
        self.coils
            .iter()
            .map(|c| (c.name.clone(), c.current))
            .collect()
    }

    /// Indices of the coils the fitter may adjust.
    pub fn controlled_indices(&self) -> Vec<usize> {
        self.coils
            .iter()
            .enumerate()
            .filter(|(_, c)| c.control)
            .map(|(i, _)| i)
            .collect()
    }

    /// Total coil flux at a point.
    pub fn psi_at(&self, r: f64, z: f64) -> f64 {
        self.coils
            .iter()
            .map(|c| c.current * c.psi_per_amp(r, z))
            .sum()
    }

    /// Total coil field `(B_R, B_Z)` at a point.
    pub fn b_at(&self, r: f64, z: f64) -> (f64, f64) {
        self.coils.iter().fold((0.0, 0.0), |(br, bz), c| {
            (
                br + c.current * c.br_per_amp(r, z),
                bz + c.current * c.bz_per_amp(r, z),
            )
        })
    }

    /// Add `delta[k]` to the current of coil `indices[k]`.
    pub fn apply_current_changes(
        &mut self,
        indices: &[usize],
        delta: &[f64],
    ) -> EquilibriumResult<()> {
        if indices.len() != delta.len() {
            return Err(EquilibriumError::UnderdeterminedControl(format!(
                "{} current changes for {} coils",
                delta.len(),
                indices.len()
            )));
        }
        if let Some(bad) = delta.iter().find(|d| !d.is_finite()) {
            return Err(EquilibriumError::UnderdeterminedControl(format!(
                "non-finite coil current change {bad}"
            )));
        }
        if let Some(idx) = indices.iter().find(|&&i| i >= self.coils.len()) {
            return Err(EquilibriumError::UnderdeterminedControl(format!(
                "no coil with index {idx}"
            )));
        }
        for (&idx, &d) in indices.iter().zip(delta) {
            self.coils[idx].current += d;
        }
        Ok(())
    }
}
