//! Polynomial helpers for the sum-check rounds
//!
//! - [`RoundPoly`]: a low-degree univariate in **coefficient** form. This is
//!   exactly what a prover sends per round and what the transcript absorbs.
//! - [`interpolate`]: recover coefficients from evaluations at `0, 1, …, d`.
//! - Multilinear helpers over lane vectors: [`eq_table`], [`eq_eval`],
//!   [`fold_in_place`], [`mle_eval`].
//!
//! Hypercube points bind the **most significant** lane bit first (see
//! [`crate::lanes`]), so `fold_in_place(t, r)` merges `t[j]` with
//! `t[j + len/2]`.

#![forbid(unsafe_code)]

use ark_ff::{Field, One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::F;

/// One sum-check round message: `p(X) = Σ_i coeffs[i] · X^i`.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct RoundPoly {
    /// Coefficients, constant term first.
    pub coeffs: Vec<F>,
}

impl RoundPoly {
    /// Interpolate the round polynomial from its evaluations at `0..=d`.
    pub fn from_evals(evals: &[F]) -> Self {
        Self { coeffs: interpolate(evals) }
    }

    /// Degree bound `d` implied by the coefficient count (`len - 1`).
    #[inline]
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Horner evaluation at `x`.
    pub fn eval(&self, x: F) -> F {
        let mut acc = F::zero();
        for &c in self.coeffs.iter().rev() {
            acc = acc * x + c;
        }
        acc
    }

    /// `p(0) + p(1)`, the quantity each round must match against the running claim.
    pub fn sum_over_boolean(&self) -> F {
        // p(0) = c0, p(1) = Σ c_i.
        let c0 = self.coeffs.first().copied().unwrap_or_else(F::zero);
        c0 + self.coeffs.iter().copied().sum::<F>()
    }
}

/// Lagrange interpolation through `(i, evals[i])` for `i = 0..n`.
///
/// Returns `n` coefficients (constant term first). The nodes are the small
/// integers `0..n`, so every denominator `Π_{j≠i}(i − j)` is a non-zero field
/// element for any practical `n`.
pub fn interpolate(evals: &[F]) -> Vec<F> {
    let n = evals.len();
    let mut coeffs = vec![F::zero(); n];
    for (i, &yi) in evals.iter().enumerate() {
        if yi.is_zero() {
            continue;
        }
        let xi = F::from(i as u64);
        let mut basis = vec![F::one()];
        let mut denom = F::one();
        for j in (0..n).filter(|&j| j != i) {
            let xj = F::from(j as u64);
            // basis *= (X - xj)
            let mut next = vec![F::zero(); basis.len() + 1];
            for (k, &b) in basis.iter().enumerate() {
                next[k + 1] += b;
                next[k] -= b * xj;
            }
            basis = next;
            denom *= xi - xj;
        }
        let scale = yi * denom.inverse().expect("distinct interpolation nodes");
        for (c, b) in coeffs.iter_mut().zip(basis) {
            *c += scale * b;
        }
    }
    coeffs
}

/// `eq(r, x)` for every `x ∈ {0,1}^v`, laid out in lane order.
///
/// `r[0]` binds the most significant bit of the lane index.
pub fn eq_table(r: &[F]) -> Vec<F> {
    let mut table = Vec::with_capacity(1 << r.len());
    table.push(F::one());
    for &ri in r {
        let mut next = Vec::with_capacity(table.len() * 2);
        for &e in &table {
            let hi = e * ri;
            next.push(e - hi);
            next.push(hi);
        }
        table = next;
    }
    table
}

/// `eq(r, s) = Π_i (r_i·s_i + (1 − r_i)(1 − s_i))`.
pub fn eq_eval(r: &[F], s: &[F]) -> F {
    debug_assert_eq!(r.len(), s.len());
    r.iter()
        .zip(s)
        .map(|(&ri, &si)| ri * si + (F::one() - ri) * (F::one() - si))
        .product()
}

/// Bind the leading variable of a multilinear table to `r`, halving it.
pub fn fold_in_place(table: &mut Vec<F>, r: F) {
    let half = table.len() / 2;
    for j in 0..half {
        let lo = table[j];
        let hi = table[j + half];
        table[j] = lo + r * (hi - lo);
    }
    table.truncate(half);
}

/// Evaluate the multilinear extension of `evals` (length `2^v`) at `point ∈ F^v`.
pub fn mle_eval(evals: &[F], point: &[F]) -> F {
    debug_assert_eq!(evals.len(), 1 << point.len(), "table/point size mismatch");
    let mut table = evals.to_vec();
    for &r in point {
        fold_in_place(&mut table, r);
    }
    table.first().copied().unwrap_or_else(F::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(x: u64) -> F {
        F::from(x)
    }

    #[test]
    fn interpolation_recovers_coefficients() {
        // p(X) = 3 + 2X + 5X^2 + X^3
        let p = RoundPoly { coeffs: vec![f(3), f(2), f(5), f(1)] };
        let evals: Vec<F> = (0..4u64).map(|i| p.eval(f(i))).collect();
        let q = RoundPoly::from_evals(&evals);
        assert_eq!(q, p);
        assert_eq!(q.degree(), 3);
        assert_eq!(q.sum_over_boolean(), p.eval(f(0)) + p.eval(f(1)));
    }

    #[test]
    fn eq_table_is_indicator_on_boolean_points() {
        let r = [f(1), f(0), f(1)];
        let t = eq_table(&r);
        // MSB first: (1,0,1) -> lane 0b101 = 5
        for (i, v) in t.iter().enumerate() {
            if i == 5 {
                assert_eq!(*v, F::one());
            } else {
                assert!(v.is_zero());
            }
        }
    }

    #[test]
    fn eq_table_matches_eq_eval() {
        let r = [f(7), f(11)];
        let t = eq_table(&r);
        for (i, v) in t.iter().enumerate() {
            let bits = [f(((i >> 1) & 1) as u64), f((i & 1) as u64)];
            assert_eq!(*v, eq_eval(&r, &bits));
        }
    }

    #[test]
    fn mle_agrees_with_table_on_hypercube_and_eq_sum_off_it() {
        let evals: Vec<F> = (0..8u64).map(|i| f(i * i + 1)).collect();
        assert_eq!(mle_eval(&evals, &[f(1), f(1), f(0)]), evals[6]);

        // Off the cube: MLE(r) = Σ_x eq(r, x) · evals[x]
        let r = [f(9), f(4), f(13)];
        let by_eq: F = eq_table(&r).iter().zip(&evals).map(|(e, v)| *e * v).sum();
        assert_eq!(mle_eval(&evals, &r), by_eq);
    }

    #[test]
    fn zero_variable_mle_is_the_single_entry() {
        assert_eq!(mle_eval(&[f(42)], &[]), f(42));
        assert_eq!(eq_table(&[]), vec![F::one()]);
        assert_eq!(eq_eval(&[], &[]), F::one());
    }
}
