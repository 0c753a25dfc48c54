//! Sum-check for one gate
//!
//! A wire `w = g(in_1, …, in_m)` arrives here with one or more claims
//! `Ṽ_w(r_j) = y_j`. Since every gate is lane-wise,
//!
//! ```text
//! Ṽ_w(r) = Σ_{x ∈ {0,1}^v} eq(r, x) · g(Ṽ_in1(x), …, Ṽ_inm(x))
//! ```
//!
//! Several claims are batched with powers of a transcript coefficient `α`:
//! the sum-check runs over `E(x) = Σ_j α^j eq(r_j, x)` against the target
//! `Σ_j α^j y_j`. Each round polynomial has degree `deg(g) + 1` and is sent in
//! coefficient form. After `v` rounds the prover reveals `Ṽ_ink(s)` at the
//! final point `s`; those become the claims on the input wires.
//!
//! Prover and verifier absorb exactly the same items in the same order:
//! `ClaimCombiner` (only with more than one claim), then per round
//! `RoundPoly` → `RoundChallenge`, then `InputEvals`.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_ff::{One, Zero};

use crate::circuit::GateKind;
use crate::gkr::{MismatchStage, VerificationError};
use crate::poly::{eq_eval, eq_table, fold_in_place, RoundPoly};
use crate::transcript::{FsLabel, Transcript};
use crate::F;

/// `Ṽ_w(point) = value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub point: Vec<F>,
    pub value: F,
}

/// Prover output for one gate.
#[derive(Clone, Debug)]
pub struct GateReduction {
    pub rounds: Vec<RoundPoly>,
    /// Final challenge point `s`.
    pub point: Vec<F>,
    /// `Ṽ_ink(s)` for every input `k`, in gate input order.
    pub input_evals: Vec<F>,
}

/// Batching weights `1, α, α², …` and the batched target sum.
fn batch(claims: &[Claim], fs: &mut Transcript) -> (Vec<F>, F) {
    let mut weights = Vec::with_capacity(claims.len());
    if claims.len() > 1 {
        let alpha = fs.challenge_f(FsLabel::ClaimCombiner);
        let mut acc = F::one();
        for _ in claims {
            weights.push(acc);
            acc *= alpha;
        }
    } else {
        weights.resize(claims.len(), F::one());
    }
    let target = weights.iter().zip(claims).map(|(w, c)| *w * c.value).sum();
    (weights, target)
}

/// Run the prover side for gate `kind` over the padded input tables.
pub fn prove_gate(kind: GateKind, claims: &[Claim], inputs: &[&[F]], fs: &mut Transcript) -> GateReduction {
    let num_vars = claims.first().map(|c| c.point.len()).unwrap_or(0);
    let size = 1usize << num_vars;
    let (weights, _) = batch(claims, fs);

    let mut eq = vec![F::zero(); size];
    for (w, c) in weights.iter().zip(claims) {
        for (acc, e) in eq.iter_mut().zip(eq_table(&c.point)) {
            *acc += *w * e;
        }
    }
    let mut tables: Vec<Vec<F>> = inputs.iter().map(|t| t.to_vec()).collect();

    let degree = kind.degree() + 1;
    let nodes: Vec<F> = (0..=degree as u64).map(F::from).collect();
    let mut rounds = Vec::with_capacity(num_vars);
    let mut point = Vec::with_capacity(num_vars);
    let mut row = vec![F::zero(); tables.len()];

    for _ in 0..num_vars {
        let half = eq.len() / 2;
        let mut evals = vec![F::zero(); degree + 1];
        for j in 0..half {
            let e_lo = eq[j];
            let e_step = eq[j + half] - e_lo;
            for (t, x) in nodes.iter().enumerate() {
                for (slot, tab) in row.iter_mut().zip(&tables) {
                    *slot = tab[j] + *x * (tab[j + half] - tab[j]);
                }
                evals[t] += (e_lo + *x * e_step) * kind.eval(&row);
            }
        }
        let poly = RoundPoly::from_evals(&evals);
        fs.absorb_scalars(FsLabel::RoundPoly, &poly.coeffs);
        let r = fs.challenge_f(FsLabel::RoundChallenge);

        fold_in_place(&mut eq, r);
        for tab in tables.iter_mut() {
            fold_in_place(tab, r);
        }
        rounds.push(poly);
        point.push(r);
    }

    let input_evals: Vec<F> = tables.iter().map(|t| t[0]).collect();
    fs.absorb_scalars(FsLabel::InputEvals, &input_evals);
    GateReduction { rounds, point, input_evals }
}

/// Replay the verifier side for wire `wire`; returns the final point `s`.
pub fn verify_gate(
    kind: GateKind,
    wire: usize,
    claims: &[Claim],
    rounds: &[RoundPoly],
    input_evals: &[F],
    num_vars: usize,
    fs: &mut Transcript,
) -> Result<Vec<F>, VerificationError> {
    if rounds.len() != num_vars {
        return Err(VerificationError::ProofMalformed("wrong number of sum-check rounds"));
    }
    let degree = kind.degree() + 1;
    let (weights, mut claim) = batch(claims, fs);

    let mut point = Vec::with_capacity(num_vars);
    for (i, poly) in rounds.iter().enumerate() {
        if poly.coeffs.len() != degree + 1 {
            return Err(VerificationError::ProofMalformed("round polynomial has the wrong degree"));
        }
        if poly.sum_over_boolean() != claim {
            return Err(VerificationError::SumCheckMismatch { wire, stage: MismatchStage::Round(i) });
        }
        fs.absorb_scalars(FsLabel::RoundPoly, &poly.coeffs);
        let r = fs.challenge_f(FsLabel::RoundChallenge);
        claim = poly.eval(r);
        point.push(r);
    }

    if input_evals.len() != kind.arity() {
        return Err(VerificationError::ProofMalformed("wrong number of input evaluations"));
    }
    fs.absorb_scalars(FsLabel::InputEvals, input_evals);

    let weight: F = weights.iter().zip(claims).map(|(w, c)| *w * eq_eval(&c.point, &point)).sum();
    if weight * kind.eval(input_evals) != claim {
        return Err(VerificationError::SumCheckMismatch { wire, stage: MismatchStage::Final });
    }
    Ok(point)
}
