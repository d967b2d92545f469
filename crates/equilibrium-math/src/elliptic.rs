// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Elliptic
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Complete elliptic integrals K(m) and E(m).
//!
//! Evaluated with the arithmetic-geometric mean, which converges
//! quadratically and stays accurate to a few ulps over the whole range.
//! Parameter convention: m = k², with 0 <= m <= 1.
//!
//! Green's functions for filament coils evaluate the integrals very close to
//! m = 1, where 1 − m suffers cancellation. [`ellipke_complement`] takes the
//! complementary parameter m₁ = 1 − m directly for that case.

use std::f64::consts::FRAC_PI_2;

/// AGM iteration stops once |aₙ − bₙ|/2 falls below this fraction of aₙ.
const AGM_TOL: f64 = 1e-16;

/// Hard cap on AGM steps; convergence needs fewer than ten in practice.
const MAX_AGM_STEPS: usize = 40;

/// K(m) and E(m) from the complementary parameter m₁ = 1 − m.
///
/// Returns `(∞, 1)` at m₁ = 0 and `(NaN, NaN)` for negative or NaN m₁.
pub fn ellipke_complement(m1: f64) -> (f64, f64) {
    if m1.is_nan() || m1 < 0.0 {
        return (f64::NAN, f64::NAN);
    }
    if m1 == 0.0 {
        return (f64::INFINITY, 1.0);
    }

    let mut a = 1.0_f64;
    let mut b = m1.sqrt();
    // E = K (1 − Σ 2^{n−1} cₙ²) with c₀² = m
    let mut weight = 0.5;
    let mut sum = weight * (1.0 - m1);

    for _ in 0..MAX_AGM_STEPS {
        let c = 0.5 * (a - b);
        let a_next = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = a_next;
        weight *= 2.0;
        sum += weight * c * c;
        if c.abs() <= AGM_TOL * a {
            break;
        }
    }

    let k = FRAC_PI_2 / a;
    (k, k * (1.0 - sum))
}

/// K(m) and E(m) evaluated together.
pub fn ellipke(m: f64) -> (f64, f64) {
    ellipke_complement(1.0 - m)
}

/// Complete elliptic integral of the first kind K(m).
pub fn ellipk(m: f64) -> f64 {
    ellipke(m).0
}

/// Complete elliptic integral of the second kind E(m).
pub fn ellipe(m: f64) -> f64 {
    if m == 1.0 {
        return 1.0;
    }
    ellipke(m).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipk_at_zero() {
        assert!((ellipk(0.0) - FRAC_PI_2).abs() < 1e-15, "K(0) = pi/2");
    }

    #[test]
    fn test_ellipk_reference_values() {
        let cases: &[(f64, f64)] = &[
            (0.0, FRAC_PI_2),
            (0.1, 1.6124413487202192),
            (0.2, 1.659623598610528),
            (0.3, 1.713889448178791),
            (0.4, 1.7775193714912534),
            (0.5, 1.8540746773013719),
            (0.6, 1.9495677498060258),
            (0.7, 2.075363135292469),
            (0.8, 2.257205326820854),
            (0.9, 2.5780921133481733),
            (0.95, 2.9083372484445515),
            (0.99, 3.6956373629898747),
            (0.999, 4.841132560550296),
        ];
        for &(m, expected) in cases {
            let got = ellipk(m);
            let err = (got - expected).abs();
            assert!(
                err < 1e-12,
                "K({m}) = {got}, expected {expected}, error = {err}"
            );
        }
    }

    #[test]
    fn test_ellipe_at_zero() {
        assert!((ellipe(0.0) - FRAC_PI_2).abs() < 1e-15, "E(0) = pi/2");
    }

    #[test]
    fn test_ellipe_reference_values() {
        let cases: &[(f64, f64)] = &[
            (0.0, FRAC_PI_2),
            (0.1, 1.5307576368977633),
            (0.2, 1.489035058095853),
            (0.3, 1.4453630644126654),
            (0.4, 1.3993921388974322),
            (0.5, 1.3506438810476755),
            (0.6, 1.2984280350469133),
            (0.7, 1.2416705679458229),
            (0.8, 1.1784899243278386),
            (0.9, 1.1047747327040733),
            (0.95, 1.0604737277662784),
            (0.99, 1.015993545025224),
            (0.999, 1.0021707908344453),
        ];
        for &(m, expected) in cases {
            let got = ellipe(m);
            let err = (got - expected).abs();
            assert!(
                err < 1e-12,
                "E({m}) = {got}, expected {expected}, error = {err}"
            );
        }
    }

    #[test]
    fn test_ellipe_at_one() {
        assert!((ellipe(1.0) - 1.0).abs() < 1e-15, "E(1) = 1");
        assert!(ellipk(1.0).is_infinite(), "K(1) diverges");
    }

    #[test]
    fn test_complement_near_singularity() {
        // K(m) ~ ln(4/sqrt(m1)) as m1 -> 0
        let m1 = 1e-12;
        let (k, e) = ellipke_complement(m1);
        let asymptotic = (4.0 / m1.sqrt()).ln();
        assert!((k - asymptotic).abs() < 1e-9, "K = {k}, asymptote = {asymptotic}");
        assert!((e - 1.0).abs() < 1e-9, "E = {e}");
    }

    #[test]
    fn test_invalid_parameter_is_nan() {
        let (k, e) = ellipke(1.5);
        assert!(k.is_nan() && e.is_nan());
    }
}
