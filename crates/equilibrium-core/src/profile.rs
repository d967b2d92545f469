// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Profile
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plasma toroidal current density from the normalized flux.
//!
//! Both parameterizations share the current shape
//!
//!   J_φ = L · (β₀ R / R_a + (1 − β₀) R_a / R) · (1 − ψ_N^αm)^αn
//!
//! inside the plasma and differ only in how the pressure share L·β₀ is fixed:
//! from the pressure on axis (`PaxisIp`) or from the poloidal beta
//! (`BetapIp`). L then follows in closed form from the plasma current, so the
//! grid integral of J_φ equals Ip exactly.

use equilibrium_math::quadrature::{pairwise_sum_by, simpson};
use equilibrium_types::config::ProfileConfig;
use equilibrium_types::constants::MU0_SI;
use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use equilibrium_types::state::Grid2D;
use ndarray::{Array2, Zip};
use std::f64::consts::PI;

/// Segments of the cumulative shape-integral table.
const TAIL_TABLE_SEGMENTS: usize = 512;

/// Simpson intervals within one table segment.
const SEGMENT_INTERVALS: usize = 8;

/// Relative separation below which axis and boundary flux coincide.
const DEGENERATE_FLUX_RATIO: f64 = 1e-12;

/// Shape exponents, targets and the tabulated tail integral
/// S(ψ_N) = ∫_{ψ_N}^1 (1 − x^αm)^αn dx.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentShape {
    pub ip: f64,
    pub f_vac: f64,
    pub alpha_m: f64,
    pub alpha_n: f64,
    /// Reference major radius R_a; the grid centre when absent.
    pub r_axis: Option<f64>,
    tail: Vec<f64>,
}

impl CurrentShape {
    pub fn new(
        ip: f64,
        f_vac: f64,
        alpha_m: f64,
        alpha_n: f64,
        r_axis: Option<f64>,
    ) -> EquilibriumResult<Self> {
        if !ip.is_finite() || !f_vac.is_finite() {
            return Err(EquilibriumError::ConfigError(format!(
                "profile ip/f_vac must be finite, got ip={ip}, f_vac={f_vac}"
            )));
        }
        for (name, alpha) in [("alpha_m", alpha_m), ("alpha_n", alpha_n)] {
            if !alpha.is_finite() || alpha <= 0.0 {
                return Err(EquilibriumError::ConfigError(format!(
                    "profile {name} must be finite and > 0, got {alpha}"
                )));
            }
        }
        if let Some(ra) = r_axis {
            if !ra.is_finite() || ra <= 0.0 {
                return Err(EquilibriumError::ConfigError(format!(
                    "profile r_axis must be finite and > 0, got {ra}"
                )));
            }
        }

        let mut shape = CurrentShape {
            ip,
            f_vac,
            alpha_m,
            alpha_n,
            r_axis,
            tail: Vec::new(),
        };
        let n = TAIL_TABLE_SEGMENTS;
        let mut tail = vec![0.0; n + 1];
        for i in (0..n).rev() {
            let a = i as f64 / n as f64;
            let b = (i + 1) as f64 / n as f64;
            tail[i] = tail[i + 1] + simpson(|x| shape.value(x), a, b, SEGMENT_INTERVALS);
        }
        shape.tail = tail;
        Ok(shape)
    }

    /// (1 − ψ_N^αm)^αn, with ψ_N clamped to the plasma range and zero at or
    /// beyond the boundary.
    pub fn value(&self, psi_n: f64) -> f64 {
        if psi_n >= 1.0 || psi_n.is_nan() {
            return 0.0;
        }
        let x = psi_n.max(0.0);
        (1.0 - x.powf(self.alpha_m)).powf(self.alpha_n)
    }

    /// S(ψ_N) = ∫_{ψ_N}^1 of the shape.
    pub fn tail_integral(&self, psi_n: f64) -> f64 {
        if psi_n >= 1.0 || psi_n.is_nan() {
            return 0.0;
        }
        let x = psi_n.max(0.0);
        let n = TAIL_TABLE_SEGMENTS;
        let seg = ((x * n as f64).floor() as usize).min(n - 1);
        let upper = (seg + 1) as f64 / n as f64;
        self.tail[seg + 1] + simpson(|t| self.value(t), x, upper, SEGMENT_INTERVALS)
    }

    /// S(0), the full shape integral.
    pub fn full_integral(&self) -> f64 {
        self.tail_integral(0.0)
    }
}

/// Plasma current profile parameterization.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Pressure on axis [Pa] and plasma current.
    PaxisIp { p_axis: f64, shape: CurrentShape },
    /// Poloidal beta and plasma current.
    BetapIp { beta_p: f64, shape: CurrentShape },
}

/// Coefficients solved by the last [`Profile::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileCoefficients {
    pub l: f64,
    pub beta0: f64,
    /// L·β₀, kept separately so a zero L does not lose the pressure share.
    pub l_beta0: f64,
    pub psi_axis: f64,
    pub psi_boundary: f64,
    pub r_axis: f64,
}

impl ProfileCoefficients {
    fn dpsi(&self) -> f64 {
        self.psi_boundary - self.psi_axis
    }
}

impl Profile {
    pub fn from_config(config: &ProfileConfig) -> EquilibriumResult<Self> {
        match *config {
            ProfileConfig::PaxisIp {
                p_axis,
                ip,
                f_vac,
                alpha_m,
                alpha_n,
                r_axis,
            } => {
                if !p_axis.is_finite() {
                    return Err(EquilibriumError::ConfigError(format!(
                        "p_axis must be finite, got {p_axis}"
                    )));
                }
                Ok(Profile::PaxisIp {
                    p_axis,
                    shape: CurrentShape::new(ip, f_vac, alpha_m, alpha_n, r_axis)?,
                })
            }
            ProfileConfig::BetapIp {
                beta_p,
                ip,
                f_vac,
                alpha_m,
                alpha_n,
                r_axis,
            } => {
                if !beta_p.is_finite() {
                    return Err(EquilibriumError::ConfigError(format!(
                        "beta_p must be finite, got {beta_p}"
                    )));
                }
                Ok(Profile::BetapIp {
                    beta_p,
                    shape: CurrentShape::new(ip, f_vac, alpha_m, alpha_n, r_axis)?,
                })
            }
        }
    }

    pub fn shape(&self) -> &CurrentShape {
        match self {
            Profile::PaxisIp { shape, .. } | Profile::BetapIp { shape, .. } => shape,
        }
    }

    /// Target plasma current [A].
    pub fn ip(&self) -> f64 {
        self.shape().ip
    }

    pub fn f_vac(&self) -> f64 {
        self.shape().f_vac
    }

    /// Major radius hint for the magnetic axis.
    pub fn axis_hint(&self) -> Option<f64> {
        self.shape().r_axis
    }

    /// Toroidal current density on the grid and the coefficients that
    /// produced it.
    ///
    /// `mask` restricts the plasma to the closed-flux region; without one
    /// every node with ψ_N < 1 carries current.
    pub fn evaluate(
        &self,
        grid: &Grid2D,
        psi: &Array2<f64>,
        psi_axis: f64,
        psi_boundary: f64,
        mask: Option<&Array2<bool>>,
    ) -> EquilibriumResult<(Array2<f64>, ProfileCoefficients)> {
        let dpsi = psi_boundary - psi_axis;
        let scale = psi_axis.abs().max(psi_boundary.abs());
        if !dpsi.is_finite() || dpsi == 0.0 || dpsi.abs() <= DEGENERATE_FLUX_RATIO * scale {
            return Err(EquilibriumError::ProfileDegenerate {
                psi_axis,
                psi_boundary,
            });
        }
        let shape = self.shape();
        let r_axis = shape.r_axis.unwrap_or_else(|| grid.center().0);

        let psi_n: Array2<f64> = Zip::from(psi).par_map_collect(|&p| (p - psi_axis) / dpsi);
        let plasma: Array2<f64> = Zip::indexed(&psi_n).par_map_collect(|(iz, ir), &pn| {
            let inside = mask.map_or(true, |m| m[[iz, ir]]);
            if inside {
                shape.value(pn)
            } else {
                0.0
            }
        });

        let da = grid.cell_area();
        let ir_int = pairwise_sum_by(plasma.indexed_iter(), |((_, ir), &s)| {
            s * grid.r[ir] / r_axis
        }) * da;
        let i_r_int = pairwise_sum_by(plasma.indexed_iter(), |((_, ir), &s)| {
            s * r_axis / grid.r[ir]
        }) * da;
        if i_r_int == 0.0 || !i_r_int.is_finite() {
            return Err(EquilibriumError::ProfileDegenerate {
                psi_axis,
                psi_boundary,
            });
        }

        let l_beta0 = match self {
            Profile::PaxisIp { p_axis, .. } => -p_axis * r_axis / (dpsi * shape.full_integral()),
            Profile::BetapIp { beta_p, .. } => {
                let intp = pairwise_sum_by(psi_n.iter().zip(plasma.iter()), |(&pn, &s)| {
                    if s > 0.0 {
                        shape.tail_integral(pn)
                    } else {
                        0.0
                    }
                }) * da
                    * dpsi;
                if intp == 0.0 || !intp.is_finite() {
                    return Err(EquilibriumError::ProfileDegenerate {
                        psi_axis,
                        psi_boundary,
                    });
                }
                -beta_p * (MU0_SI / (8.0 * PI)) * r_axis * shape.ip.powi(2) / intp
            }
        };

        let l = shape.ip / i_r_int - l_beta0 * (ir_int / i_r_int - 1.0);
        let beta0 = if l == 0.0 { 0.0 } else { l_beta0 / l };

        let mut j_tor = plasma;
        Zip::from(&mut j_tor)
            .and(&grid.rr)
            .par_for_each(|j, &r| {
                *j *= l_beta0 * r / r_axis + (l - l_beta0) * r_axis / r;
            });

        Ok((
            j_tor,
            ProfileCoefficients {
                l,
                beta0,
                l_beta0,
                psi_axis,
                psi_boundary,
                r_axis,
            },
        ))
    }

    /// dp/dψ at normalized flux `psi_n`.
    pub fn pprime(&self, coeffs: &ProfileCoefficients, psi_n: f64) -> f64 {
        coeffs.l_beta0 / coeffs.r_axis * self.shape().value(psi_n)
    }

    /// F dF/dψ at normalized flux `psi_n`.
    pub fn ffprime(&self, coeffs: &ProfileCoefficients, psi_n: f64) -> f64 {
        MU0_SI * (coeffs.l - coeffs.l_beta0) * coeffs.r_axis * self.shape().value(psi_n)
    }

    /// Pressure [Pa]; zero at and beyond the boundary.
    pub fn pressure(&self, coeffs: &ProfileCoefficients, psi_n: f64) -> f64 {
        -coeffs.dpsi() * coeffs.l_beta0 / coeffs.r_axis * self.shape().tail_integral(psi_n)
    }

    /// Toroidal field function F = R B_φ, equal to `f_vac` outside the plasma.
    pub fn fpol(&self, coeffs: &ProfileCoefficients, psi_n: f64) -> f64 {
        let f_vac = self.f_vac();
        let ff_int = MU0_SI * (coeffs.l - coeffs.l_beta0) * coeffs.r_axis
            * self.shape().tail_integral(psi_n);
        let f_sq = (f_vac * f_vac - 2.0 * coeffs.dpsi() * ff_int).max(0.0);
        let sign = if f_vac < 0.0 { -1.0 } else { 1.0 };
        sign * f_sq.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paraboloid(grid: &Grid2D, r0: f64, a: f64) -> Array2<f64> {
        // ψ = −1 on axis, 0 on the circle of radius a
        Array2::from_shape_fn(grid.shape(), |(iz, ir)| {
            let rho2 = ((grid.r[ir] - r0).powi(2) + grid.z[iz].powi(2)) / (a * a);
            rho2 - 1.0
        })
    }

    fn jt60_profile() -> Profile {
        Profile::from_config(&ProfileConfig::PaxisIp {
            p_axis: 1.69819e5,
            ip: -2.3e6,
            f_vac: -5.11,
            alpha_m: 4.0,
            alpha_n: 2.0,
            r_axis: Some(2.97),
        })
        .unwrap()
    }

    #[test]
    fn test_tail_integral_closed_form() {
        // αm = 1, αn = 1: S(x) = (1 − x)² / 2
        let shape = CurrentShape::new(1.0, 1.0, 1.0, 1.0, None).unwrap();
        for &x in &[0.0_f64, 0.13, 0.5, 0.999] {
            let exact = 0.5 * (1.0 - x).powi(2);
            assert!((shape.tail_integral(x) - exact).abs() < 1e-14);
        }
        assert_eq!(shape.tail_integral(1.0), 0.0);
        assert_eq!(shape.value(1.2), 0.0);
        assert_eq!(shape.value(-0.3), 1.0);
    }

    #[test]
    fn test_current_integral_matches_ip() {
        let grid = Grid2D::new(1.0, 5.0, -2.0, 2.0, 65, 65).unwrap();
        let psi = paraboloid(&grid, 3.0, 1.2);
        let profile = jt60_profile();
        let (j, coeffs) = profile.evaluate(&grid, &psi, -1.0, 0.0, None).unwrap();
        let total = pairwise_sum_by(j.iter(), |&v| v) * grid.cell_area();
        assert!((total - (-2.3e6)).abs() < 1e-9 * 2.3e6, "Ip = {total}");
        assert!(coeffs.l.is_finite() && coeffs.beta0.is_finite());
        // No current outside the plasma
        assert_eq!(j[[0, 0]], 0.0);
    }

    #[test]
    fn test_pressure_and_fpol_endpoints() {
        let grid = Grid2D::new(1.0, 5.0, -2.0, 2.0, 33, 33).unwrap();
        let psi = paraboloid(&grid, 3.0, 1.2);
        let profile = jt60_profile();
        let (_, coeffs) = profile.evaluate(&grid, &psi, -1.0, 0.0, None).unwrap();
        let p0 = profile.pressure(&coeffs, 0.0);
        assert!((p0 - 1.69819e5).abs() < 1e-8 * 1.69819e5, "p(0) = {p0}");
        assert_eq!(profile.pressure(&coeffs, 1.0), 0.0);
        assert!((profile.fpol(&coeffs, 1.0) + 5.11).abs() < 1e-14);
        assert!(profile.fpol(&coeffs, 0.0) < 0.0);
    }

    #[test]
    fn test_profile_functions_reproduce_current() {
        let grid = Grid2D::new(1.0, 5.0, -2.0, 2.0, 33, 33).unwrap();
        let psi = paraboloid(&grid, 3.0, 1.2);
        let profile = jt60_profile();
        let (j, coeffs) = profile.evaluate(&grid, &psi, -1.0, 0.0, None).unwrap();
        let (iz, ir) = (16, 18);
        let r = grid.r[ir];
        let pn = psi[[iz, ir]] + 1.0;
        let expected = r * profile.pprime(&coeffs, pn) + profile.ffprime(&coeffs, pn) / (MU0_SI * r);
        assert!((j[[iz, ir]] - expected).abs() < 1e-10 * expected.abs());
    }

    #[test]
    fn test_betap_profile_recovers_beta() {
        let grid = Grid2D::new(1.0, 5.0, -2.0, 2.0, 49, 49).unwrap();
        let psi = paraboloid(&grid, 3.0, 1.2);
        let profile = Profile::from_config(&ProfileConfig::BetapIp {
            beta_p: 0.8,
            ip: 1e6,
            f_vac: 3.0,
            alpha_m: 1.0,
            alpha_n: 2.0,
            r_axis: None,
        })
        .unwrap();
        let (j, coeffs) = profile.evaluate(&grid, &psi, -1.0, 0.0, None).unwrap();
        let total = pairwise_sum_by(j.iter(), |&v| v) * grid.cell_area();
        assert!((total - 1e6).abs() < 1e-9 * 1e6);

        let p_int = pairwise_sum_by(psi.iter(), |&p| profile.pressure(&coeffs, p + 1.0))
            * grid.cell_area();
        let beta = 8.0 * PI / MU0_SI * p_int / 1e12;
        assert!((beta - 0.8).abs() < 1e-10, "beta_p = {beta}");
        assert!((coeffs.r_axis - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_flux_rejected() {
        let grid = Grid2D::new(1.0, 5.0, -2.0, 2.0, 17, 17).unwrap();
        let psi = Array2::zeros(grid.shape());
        let profile = jt60_profile();
        assert!(matches!(
            profile.evaluate(&grid, &psi, 0.3, 0.3, None),
            Err(EquilibriumError::ProfileDegenerate { .. })
        ));
        // A mask excluding every node leaves no plasma
        let mask = Array2::from_elem(grid.shape(), false);
        assert!(matches!(
            profile.evaluate(&grid, &psi, -1.0, 1.0, Some(&mask)),
            Err(EquilibriumError::ProfileDegenerate { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_exponents() {
        assert!(CurrentShape::new(1.0, 1.0, 0.0, 2.0, None).is_err());
        assert!(CurrentShape::new(1.0, 1.0, 1.0, f64::NAN, None).is_err());
        assert!(CurrentShape::new(f64::INFINITY, 1.0, 1.0, 2.0, None).is_err());
        assert!(CurrentShape::new(1.0, 1.0, 1.0, 2.0, Some(-1.0)).is_err());
    }
}
