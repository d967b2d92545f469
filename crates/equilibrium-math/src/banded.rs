// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Banded LU
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Band matrix storage and LU factorization without pivoting.
//!
//! The five-point flux operator on an nr × nz grid has bandwidth nr − 2
//! above and below the diagonal, so an unpivoted Doolittle factorization fits
//! in the same band and costs O(n · bw²). The factors are computed once per
//! grid and reused for every solve.

use equilibrium_types::error::{EquilibriumError, EquilibriumResult};

/// Square matrix with `kl` sub-diagonals and `ku` super-diagonals.
///
/// Row `i` stores columns `i − kl ..= i + ku` contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct BandMatrix {
    n: usize,
    kl: usize,
    ku: usize,
    data: Vec<f64>,
}

impl BandMatrix {
    pub fn zeros(n: usize, kl: usize, ku: usize) -> Self {
        BandMatrix {
            n,
            kl,
            ku,
            data: vec![0.0; n * (kl + ku + 1)],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    #[inline]
    fn width(&self) -> usize {
        self.kl + self.ku + 1
    }

    #[inline]
    pub fn in_band(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && j + self.kl >= i && j <= i + self.ku
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        i * self.width() + j + self.kl - i
    }

    /// Entry `(i, j)`; zero outside the band.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.in_band(i, j) {
            self.data[self.offset(i, j)]
        } else {
            0.0
        }
    }

    /// Overwrite entry `(i, j)`, which must lie inside the band.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            self.in_band(i, j),
            "entry ({i}, {j}) outside band kl={} ku={}",
            self.kl,
            self.ku
        );
        let k = self.offset(i, j);
        self.data[k] = value;
    }

    /// Dense matrix-vector product y = A x.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n];
        for (i, yi) in y.iter_mut().enumerate() {
            let lo = i.saturating_sub(self.kl);
            let hi = (i + self.ku).min(self.n - 1);
            *yi = (lo..=hi).map(|j| self.get(i, j) * x[j]).sum();
        }
        y
    }

    /// In-place Doolittle factorization A = L U with unit-diagonal L.
    ///
    /// Fails with [`EquilibriumError::SingularOperator`] on the first pivot
    /// that is zero, non-finite, or negligible against the largest entry.
    pub fn factorize(mut self) -> EquilibriumResult<BandedLu> {
        let n = self.n;
        let scale = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tiny = f64::EPSILON * scale;

        for k in 0..n {
            let pivot = self.data[self.offset(k, k)];
            if !pivot.is_finite() || pivot.abs() <= tiny {
                return Err(EquilibriumError::SingularOperator { row: k });
            }
            let i_end = (k + self.kl).min(n - 1);
            let j_end = (k + self.ku).min(n - 1);
            for i in k + 1..=i_end {
                let ik = self.offset(i, k);
                let l = self.data[ik] / pivot;
                self.data[ik] = l;
                if l == 0.0 {
                    continue;
                }
                for j in k + 1..=j_end {
                    let kj = self.data[self.offset(k, j)];
                    let ij = self.offset(i, j);
                    self.data[ij] -= l * kj;
                }
            }
        }

        Ok(BandedLu { factors: self })
    }
}

/// Packed L and U factors of a [`BandMatrix`].
#[derive(Debug, Clone)]
pub struct BandedLu {
    factors: BandMatrix,
}

impl BandedLu {
    pub fn dim(&self) -> usize {
        self.factors.n
    }

    /// Solve A x = b, overwriting `b` with x.
    pub fn solve_in_place(&self, b: &mut [f64]) {
        let f = &self.factors;
        let n = f.n;
        debug_assert_eq!(b.len(), n);

        for i in 0..n {
            let lo = i.saturating_sub(f.kl);
            let mut acc = b[i];
            for j in lo..i {
                acc -= f.data[f.offset(i, j)] * b[j];
            }
            b[i] = acc;
        }
        for i in (0..n).rev() {
            let hi = (i + f.ku).min(n - 1);
            let mut acc = b[i];
            for j in i + 1..=hi {
                acc -= f.data[f.offset(i, j)] * b[j];
            }
            b[i] = acc / f.data[f.offset(i, i)];
        }
    }

    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x);
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiagonal(n: usize) -> BandMatrix {
        let mut a = BandMatrix::zeros(n, 1, 1);
        for i in 0..n {
            a.set(i, i, 4.0);
            if i > 0 {
                a.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                a.set(i, i + 1, -2.0);
            }
        }
        a
    }

    #[test]
    fn test_tridiagonal_solve() {
        let a = tridiagonal(10);
        let x_true: Vec<f64> = (0..10).map(|i| (i as f64 * 0.7).cos()).collect();
        let b = a.mul_vec(&x_true);
        let x = a.factorize().unwrap().solve(&b);
        for (xi, ti) in x.iter().zip(&x_true) {
            assert!((xi - ti).abs() < 1e-12, "x = {xi}, expected {ti}");
        }
    }

    #[test]
    fn test_wide_band_solve() {
        let n = 30;
        let bw = 5;
        let mut a = BandMatrix::zeros(n, bw, bw);
        for i in 0..n {
            a.set(i, i, 10.0);
            if i + bw < n {
                a.set(i, i + bw, -1.0);
                a.set(i + bw, i, -2.0);
            }
            if i + 1 < n {
                a.set(i, i + 1, -1.5);
                a.set(i + 1, i, -0.5);
            }
        }
        let x_true: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
        let b = a.mul_vec(&x_true);
        let x = a.factorize().unwrap().solve(&b);
        for (xi, ti) in x.iter().zip(&x_true) {
            assert!((xi - ti).abs() < 1e-10, "x = {xi}, expected {ti}");
        }
    }

    #[test]
    fn test_zero_pivot_reports_row() {
        let mut a = tridiagonal(5);
        a.set(2, 2, 0.0);
        a.set(2, 1, 0.0);
        match a.factorize() {
            Err(EquilibriumError::SingularOperator { row }) => assert_eq!(row, 2),
            other => panic!("expected SingularOperator, got {other:?}"),
        }
    }

    #[test]
    fn test_get_outside_band_is_zero() {
        let a = tridiagonal(6);
        assert_eq!(a.get(0, 3), 0.0);
        assert_eq!(a.get(5, 0), 0.0);
        assert_eq!(a.get(1, 0), -1.0);
    }
}
