// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::MIN_GRID_POINTS;
use crate::error::{EquilibriumError, EquilibriumResult};
use ndarray::{Array1, Array2};

/// Relative slack allowed when testing whether a point lies on the grid edge.
const DOMAIN_EDGE_SLACK: f64 = 1e-9;

/// Uniform 2D computational grid in (R, Z) with precomputed coordinates.
///
/// Arrays are stored `[nz, nr]`: rows follow Z, columns follow R.
/// The grid is immutable once built; solvers share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    pub nr: usize,
    pub nz: usize,
    pub r: Array1<f64>,  // R coordinates [nr]
    pub z: Array1<f64>,  // Z coordinates [nz]
    pub dr: f64,         // R spacing
    pub dz: f64,         // Z spacing
    pub rr: Array2<f64>, // Meshgrid R [nz, nr]
    pub zz: Array2<f64>, // Meshgrid Z [nz, nr]
}

impl Grid2D {
    /// Build a grid spanning `[r_min, r_max] × [z_min, z_max]` with `nr × nz` points.
    ///
    /// Fails with [`EquilibriumError::InvalidDomain`] when bounds are inverted or
    /// non-finite, when `r_min <= 0` (the toroidal operator divides by R), or when
    /// either axis has fewer than three points.
    pub fn new(
        r_min: f64,
        r_max: f64,
        z_min: f64,
        z_max: f64,
        nr: usize,
        nz: usize,
    ) -> EquilibriumResult<Self> {
        if ![r_min, r_max, z_min, z_max].iter().all(|v| v.is_finite()) {
            return Err(EquilibriumError::InvalidDomain(
                "grid bounds must be finite".to_string(),
            ));
        }
        if r_min >= r_max || z_min >= z_max {
            return Err(EquilibriumError::InvalidDomain(format!(
                "inverted bounds: R=[{r_min}, {r_max}], Z=[{z_min}, {z_max}]"
            )));
        }
        if r_min <= 0.0 {
            return Err(EquilibriumError::InvalidDomain(format!(
                "R_min must be > 0 for the toroidal operator, got {r_min}"
            )));
        }
        if nr < MIN_GRID_POINTS || nz < MIN_GRID_POINTS {
            return Err(EquilibriumError::InvalidDomain(format!(
                "need at least {MIN_GRID_POINTS} points per axis, got nr={nr}, nz={nz}"
            )));
        }

        let r = Array1::linspace(r_min, r_max, nr);
        let z = Array1::linspace(z_min, z_max, nz);
        let dr = r[1] - r[0];
        let dz = z[1] - z[0];

        let rr = Array2::from_shape_fn((nz, nr), |(_, ir)| r[ir]);
        let zz = Array2::from_shape_fn((nz, nr), |(iz, _)| z[iz]);

        Ok(Grid2D {
            nr,
            nz,
            r,
            z,
            dr,
            dz,
            rr,
            zz,
        })
    }

    pub fn r_min(&self) -> f64 {
        self.r[0]
    }

    pub fn r_max(&self) -> f64 {
        self.r[self.nr - 1]
    }

    pub fn z_min(&self) -> f64 {
        self.z[0]
    }

    pub fn z_max(&self) -> f64 {
        self.z[self.nz - 1]
    }

    /// Area of one grid cell, dR·dZ.
    pub fn cell_area(&self) -> f64 {
        self.dr * self.dz
    }

    /// Shape of every field defined on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.nz, self.nr)
    }

    /// Geometric centre of the domain.
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.r_min() + self.r_max()),
            0.5 * (self.z_min() + self.z_max()),
        )
    }

    /// True when `(r, z)` lies inside the closed domain (with round-off slack).
    pub fn contains(&self, r: f64, z: f64) -> bool {
        let slack_r = DOMAIN_EDGE_SLACK * (self.r_max() - self.r_min());
        let slack_z = DOMAIN_EDGE_SLACK * (self.z_max() - self.z_min());
        r.is_finite()
            && z.is_finite()
            && r >= self.r_min() - slack_r
            && r <= self.r_max() + slack_r
            && z >= self.z_min() - slack_z
            && z <= self.z_max() + slack_z
    }

    /// Fail with [`EquilibriumError::OutOfDomain`] unless `(r, z)` is inside.
    pub fn check_contains(&self, r: f64, z: f64) -> EquilibriumResult<()> {
        if self.contains(r, z) {
            Ok(())
        } else {
            Err(EquilibriumError::OutOfDomain { r, z })
        }
    }

    pub fn is_boundary(&self, iz: usize, ir: usize) -> bool {
        iz == 0 || ir == 0 || iz == self.nz - 1 || ir == self.nr - 1
    }

    /// Nearest grid node `(iz, ir)` to `(r, z)`, clamped into the grid.
    pub fn nearest_index(&self, r: f64, z: f64) -> (usize, usize) {
        let fr = ((r - self.r_min()) / self.dr).round();
        let fz = ((z - self.z_min()) / self.dz).round();
        let ir = (fr.max(0.0) as usize).min(self.nr - 1);
        let iz = (fz.max(0.0) as usize).min(self.nz - 1);
        (iz, ir)
    }

    /// Edge nodes in a fixed order: bottom row, top row, then the left and
    /// right columns without their corners.
    pub fn boundary_nodes(&self) -> Vec<(usize, usize)> {
        let mut nodes = Vec::with_capacity(2 * self.nr + 2 * (self.nz - 2));
        for ir in 0..self.nr {
            nodes.push((0, ir));
        }
        for ir in 0..self.nr {
            nodes.push((self.nz - 1, ir));
        }
        for iz in 1..self.nz - 1 {
            nodes.push((iz, 0));
            nodes.push((iz, self.nr - 1));
        }
        nodes
    }

    /// Number of interior (non-edge) nodes.
    pub fn interior_len(&self) -> usize {
        (self.nr - 2) * (self.nz - 2)
    }
}

/// Poloidal flux samples on a grid plus the flux at the magnetic axis and at
/// the last closed flux surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxField {
    pub psi: Array2<f64>, // Ψ [nz, nr], Wb/rad
    pub psi_axis: f64,
    pub psi_boundary: f64,
}

impl FluxField {
    pub fn zeros(grid: &Grid2D) -> Self {
        FluxField {
            psi: Array2::zeros(grid.shape()),
            psi_axis: 0.0,
            psi_boundary: 0.0,
        }
    }

    /// ψ_N = (ψ − ψ_axis)/(ψ_boundary − ψ_axis); not clamped.
    ///
    /// Returns NaN when the axis and boundary flux coincide.
    pub fn normalize(&self, psi: f64) -> f64 {
        let denom = self.psi_boundary - self.psi_axis;
        if denom == 0.0 {
            return f64::NAN;
        }
        (psi - self.psi_axis) / denom
    }

    /// Largest minus smallest sample, used to scale convergence residuals.
    pub fn span(&self) -> f64 {
        let (lo, hi) = self
            .psi
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        hi - lo
    }
}
