// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Linear Algebra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dense linear algebra for small systems.
//!
//! SVD by one-sided Jacobi rotations and Tikhonov-regularized least squares.

use equilibrium_types::error::{EquilibriumError, EquilibriumResult};
use ndarray::{Array1, Array2};

/// Sweeps over all column pairs before giving up on orthogonality.
const MAX_JACOBI_SWEEPS: usize = 60;

/// Column pairs whose normalized inner product is below this are orthogonal.
const JACOBI_TOL: f64 = 1e-15;

/// Thin singular value decomposition A = U diag(σ) Vᵀ.
#[derive(Debug, Clone)]
pub struct Svd {
    /// Left singular vectors [m, k]
    pub u: Array2<f64>,
    /// Singular values, descending [k]
    pub sigma: Array1<f64>,
    /// Right singular vectors, transposed [k, n]
    pub vt: Array2<f64>,
}

/// SVD by one-sided (Hestenes) Jacobi rotations with k = min(m, n).
///
/// Works directly on the columns of A (of Aᵀ when A is wide), so small
/// singular values are not squared away as with AᵀA. Columns whose singular
/// value is zero get a zero left vector.
pub fn svd_small(a: &Array2<f64>) -> Svd {
    let (m, n) = a.dim();
    if m < n {
        // Aᵀ = U' Σ V'ᵀ  ⇒  A = V' Σ U'ᵀ
        let t = svd_small(&a.t().to_owned());
        return Svd {
            u: t.vt.t().to_owned(),
            sigma: t.sigma,
            vt: t.u.t().to_owned(),
        };
    }
    let k = n;
    let mut w = a.clone();
    let mut v = Array2::<f64>::eye(n);
    let negligible = f64::EPSILON * f64::EPSILON * a.iter().map(|x| x * x).sum::<f64>();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in (p + 1)..n {
                let mut alpha = 0.0;
                let mut beta = 0.0;
                let mut gamma = 0.0;
                for i in 0..m {
                    alpha += w[[i, p]] * w[[i, p]];
                    beta += w[[i, q]] * w[[i, q]];
                    gamma += w[[i, p]] * w[[i, q]];
                }
                if gamma.abs() <= JACOBI_TOL * (alpha * beta).sqrt()
                    || alpha.min(beta) <= negligible
                {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                for i in 0..m {
                    let wp = w[[i, p]];
                    let wq = w[[i, q]];
                    w[[i, p]] = c * wp - s * wq;
                    w[[i, q]] = s * wp + c * wq;
                }
                for i in 0..n {
                    let vp = v[[i, p]];
                    let vq = v[[i, q]];
                    v[[i, p]] = c * vp - s * vq;
                    v[[i, q]] = s * vp + c * vq;
                }
            }
        }
        if !rotated {
            break;
        }
    }

    let norms: Vec<f64> = (0..n)
        .map(|j| w.column(j).iter().map(|x| x * x).sum::<f64>().sqrt())
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));

    let mut u = Array2::zeros((m, k));
    let mut sigma = Array1::zeros(k);
    let mut vt = Array2::zeros((k, n));
    for (idx, &col) in order.iter().take(k).enumerate() {
        let s = norms[col];
        sigma[idx] = s;
        if s > 0.0 {
            for i in 0..m {
                u[[i, idx]] = w[[i, col]] / s;
            }
        }
        for j in 0..n {
            vt[[idx, j]] = v[[j, col]];
        }
    }

    Svd { u, sigma, vt }
}

/// Regularized least-squares solution and conditioning summary.
#[derive(Debug, Clone)]
pub struct TikhonovSolution {
    pub x: Array1<f64>,
    pub sigma_max: f64,
    /// Smallest singular value that survived the cutoff.
    pub sigma_min_kept: f64,
    /// Number of singular values that survived the cutoff.
    pub rank: usize,
}

impl TikhonovSolution {
    pub fn condition_number(&self) -> f64 {
        self.sigma_max / self.sigma_min_kept
    }
}

/// Minimize ‖A x − b‖² + λ²‖x‖² with λ = `gamma_rel`·σ_max.
///
/// Evaluated through the SVD with filter factors σ/(σ² + λ²); singular values
/// below `cutoff_rel`·σ_max are discarded. Fails with
/// `UnderdeterminedControl` when A is zero, empty or not finite.
pub fn tikhonov_solve(
    a: &Array2<f64>,
    b: &Array1<f64>,
    gamma_rel: f64,
    cutoff_rel: f64,
) -> EquilibriumResult<TikhonovSolution> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(EquilibriumError::UnderdeterminedControl(format!(
            "empty system ({m} equations, {n} unknowns)"
        )));
    }
    if b.len() != m {
        return Err(EquilibriumError::UnderdeterminedControl(format!(
            "right-hand side has {} entries for {m} equations",
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(EquilibriumError::UnderdeterminedControl(
            "non-finite entries in the control system".to_string(),
        ));
    }

    let Svd { u, sigma, vt } = svd_small(a);
    let sigma_max = sigma.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    if sigma_max == 0.0 {
        return Err(EquilibriumError::UnderdeterminedControl(
            "control matrix is identically zero".to_string(),
        ));
    }

    let lambda = gamma_rel * sigma_max;
    let cutoff = cutoff_rel * sigma_max;
    let mut x = Array1::zeros(n);
    let mut rank = 0;
    let mut sigma_min_kept = sigma_max;
    for (idx, &s) in sigma.iter().enumerate() {
        if s < cutoff || s == 0.0 {
            continue;
        }
        rank += 1;
        sigma_min_kept = sigma_min_kept.min(s);
        let ub: f64 = (0..m).map(|i| u[[i, idx]] * b[i]).sum();
        let factor = s / (s * s + lambda * lambda) * ub;
        for j in 0..n {
            x[j] += factor * vt[[idx, j]];
        }
    }

    Ok(TikhonovSolution {
        x,
        sigma_max,
        sigma_min_kept,
        rank,
    })
}
