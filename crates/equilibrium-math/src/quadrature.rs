// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Quadrature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One-dimensional quadrature and order-independent summation.

/// Below this length [`pairwise_sum`] falls back to a straight loop.
const PAIRWISE_BLOCK: usize = 32;

/// Pairwise (cascade) summation.
///
/// Rounding error grows as O(log n) instead of O(n), and the association
/// order depends only on the slice length, so repeated runs agree bitwise.
pub fn pairwise_sum(values: &[f64]) -> f64 {
    if values.len() <= PAIRWISE_BLOCK {
        return values.iter().fold(0.0, |acc, &v| acc + v);
    }
    let (lo, hi) = values.split_at(values.len() / 2);
    pairwise_sum(lo) + pairwise_sum(hi)
}

/// Pairwise sum of `f(x)` over an iterator, collected first so the
/// association order stays fixed.
pub fn pairwise_sum_by<I, F>(items: I, f: F) -> f64
where
    I: IntoIterator,
    F: FnMut(I::Item) -> f64,
{
    let values: Vec<f64> = items.into_iter().map(f).collect();
    pairwise_sum(&values)
}

/// Composite Simpson rule for ∫ₐᵇ f(x) dx with `intervals` subintervals.
///
/// An odd interval count is rounded up to the next even number.
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, intervals: usize) -> f64 {
    let n = intervals.max(2).next_multiple_of(2);
    let h = (b - a) / n as f64;
    let mut terms = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let weight = if i == 0 || i == n {
            1.0
        } else if i % 2 == 1 {
            4.0
        } else {
            2.0
        };
        terms.push(weight * f(a + i as f64 * h));
    }
    pairwise_sum(&terms) * h / 3.0
}

/// n evenly spaced points on [start, stop], endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise_sum_matches_exact_integers() {
        let values: Vec<f64> = (1..=1000).map(|i| i as f64).collect();
        assert_eq!(pairwise_sum(&values), 500_500.0);
        assert_eq!(pairwise_sum(&[]), 0.0);
    }

    #[test]
    fn test_pairwise_sum_beats_naive_on_small_increments() {
        let mut values = vec![1.0];
        values.extend(std::iter::repeat(1e-16).take(100_000));
        let exact = 1.0 + 1e-11;
        let naive: f64 = values.iter().sum();
        let pairwise = pairwise_sum(&values);
        assert!((pairwise - exact).abs() < (naive - exact).abs());
    }

    #[test]
    fn test_simpson_exact_for_cubics() {
        let val = simpson(|x| x * x * x - 2.0 * x + 1.0, 0.0, 2.0, 4);
        // ∫₀² x³ − 2x + 1 dx = 4 − 4 + 2
        assert!((val - 2.0).abs() < 1e-13, "got {val}");
    }

    #[test]
    fn test_simpson_rounds_odd_intervals() {
        let val = simpson(|x| x.sin(), 0.0, std::f64::consts::PI, 101);
        assert!((val - 2.0).abs() < 1e-7, "got {val}");
    }

    #[test]
    fn test_linspace_endpoints() {
        let xs = linspace(0.05, 0.95, 10);
        assert_eq!(xs.len(), 10);
        assert!((xs[0] - 0.05).abs() < 1e-15);
        assert!((xs[9] - 0.95).abs() < 1e-15);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }
}
