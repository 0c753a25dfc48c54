//! Fiat–Shamir transcript with domain separation
//!
//! A **deterministic, label-stable** Fiat–Shamir transform over any
//! [`NativeHasher`] resolved from the [`HashRegistry`](crate::hash::HashRegistry).
//!
//! ### Design highlights
//! - **Stable labels.** Every absorb is prefixed by a fixed tag and an
//!   [`FsLabel`], so prover and verifier replay the exact same byte schedule.
//! - **Length-delimited items.** All absorbs carry an explicit byte-length
//!   prefix to avoid concatenation ambiguity.
//! - **Clone-before-challenge.** Challenge derivation forks the running hash
//!   state; deriving challenges never mutates the absorbed bytes, only the
//!   local derivation counter advances.
//! - **Hash-agnostic expansion.** A field challenge needs 64 uniform bytes;
//!   they are produced by hashing the forked state with a block counter, so a
//!   32-byte digest (BLAKE3, SHA-256) is enough.
//!
//! ```
//! use gkrzkp::hash::HashRegistry;
//! use gkrzkp::transcript::{FsLabel, Transcript};
//!
//! let reg = HashRegistry::with_defaults();
//! let b = reg.resolve("blake3").unwrap();
//!
//! let mut t1 = Transcript::new("example", b.native());
//! t1.absorb_bytes(FsLabel::Header, b"hdr");
//! let a = t1.challenge_f(FsLabel::OutputPoint);
//!
//! let mut t2 = Transcript::new("example", b.native());
//! // Same data but a different label ⇒ different challenge.
//! t2.absorb_bytes(FsLabel::Nonce, b"hdr");
//! assert_ne!(a, t2.challenge_f(FsLabel::OutputPoint));
//! ```

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;

use crate::hash::NativeHasher;
use crate::F;

/// Canonical labels shared by prover and verifier.
///
/// These strings are part of the transcript's stable domain separation.
/// Adding variants is backward-compatible; renaming existing ones is **not**.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsLabel {
    /// Name of the hash binding in use.
    HashName,
    /// Serialized [`ProofHeader`](crate::ProofHeader).
    Header,
    /// Caller-supplied nonce.
    Nonce,
    /// Lane values of an import wire.
    ImportValues,
    /// Lane values of an output wire.
    OutputValues,
    /// Random point for an output claim.
    OutputPoint,
    /// Batching coefficient for multiple claims on one wire.
    ClaimCombiner,
    /// Coefficients of a sum-check round polynomial.
    RoundPoly,
    /// Sum-check round challenge.
    RoundChallenge,
    /// Input-wire evaluations at the end of a gate's sum-check.
    InputEvals,
}

impl FsLabel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            FsLabel::HashName => "hash_name",
            FsLabel::Header => "header",
            FsLabel::Nonce => "nonce",
            FsLabel::ImportValues => "import_values",
            FsLabel::OutputValues => "output_values",
            FsLabel::OutputPoint => "output_point",
            FsLabel::ClaimCombiner => "claim_combiner",
            FsLabel::RoundPoly => "round_poly",
            FsLabel::RoundChallenge => "round_challenge",
            FsLabel::InputEvals => "input_evals",
        }
    }
}

/// Fiat–Shamir transcript over a pluggable hash.
pub struct Transcript {
    label: &'static str,
    hasher: Box<dyn NativeHasher>,
    ctr: u64,
}

impl Transcript {
    /// New transcript for the domain `label`, absorbing into `hasher`.
    pub fn new(label: &'static str, mut hasher: Box<dyn NativeHasher>) -> Self {
        hasher.update(b"GKRZKP.transcript.v1");
        hasher.update(&(label.len() as u64).to_be_bytes());
        hasher.update(label.as_bytes());
        Self { label, hasher, ctr: 0 }
    }

    /// Absorb an arbitrary byte string (length-delimited).
    pub fn absorb_bytes(&mut self, label: FsLabel, bytes: &[u8]) {
        let l = label.as_str();
        self.hasher.update(b"item:");
        self.hasher.update(l.as_bytes());
        self.hasher.update(b":len:");
        self.hasher.update(&(bytes.len() as u64).to_be_bytes());
        self.hasher.update(b":data:");
        self.hasher.update(bytes);
    }

    /// Absorb a big-endian `u64`.
    #[inline]
    pub fn absorb_counter(&mut self, label: FsLabel, ctr: u64) {
        self.absorb_bytes(label, &ctr.to_be_bytes());
    }

    /// Absorb a field element (compressed canonical encoding).
    pub fn absorb_scalar(&mut self, label: FsLabel, f: &F) {
        let mut bytes = Vec::new();
        f.serialize_compressed(&mut bytes).expect("serialize field");
        self.absorb_bytes(label, &bytes);
    }

    /// Absorb a slice of field elements as **one** item: `u64(len) || elems`.
    pub fn absorb_scalars(&mut self, label: FsLabel, fs: &[F]) {
        let mut bytes = Vec::with_capacity(8 + fs.len() * 32);
        bytes.extend_from_slice(&(fs.len() as u64).to_be_bytes());
        for f in fs {
            f.serialize_compressed(&mut bytes).expect("serialize field");
        }
        self.absorb_bytes(label, &bytes);
    }

    /// Absorb any canonically serializable value (compressed).
    pub fn absorb_serializable<T: CanonicalSerialize>(&mut self, label: FsLabel, v: &T) {
        let mut bytes = Vec::new();
        v.serialize_compressed(&mut bytes).expect("serialize transcript item");
        self.absorb_bytes(label, &bytes);
    }

    /// Derive one field challenge.
    pub fn challenge_f(&mut self, label: FsLabel) -> F {
        let out = hash_to_field(self.hasher.as_ref(), self.label, label.as_str(), self.ctr, 1);
        self.ctr = self.ctr.wrapping_add(1);
        out[0]
    }

    /// Derive `k` field challenges (one derivation step).
    pub fn challenge_points(&mut self, label: FsLabel, k: usize) -> Vec<F> {
        let out = hash_to_field(self.hasher.as_ref(), self.label, label.as_str(), self.ctr, k);
        self.ctr = self.ctr.wrapping_add(1);
        out
    }
}

/// Derive `k` field elements from a fork of `base`.
///
/// Each element reduces 64 bytes (two digest blocks) modulo the field order,
/// keeping the reduction bias negligible.
fn hash_to_field(base: &dyn NativeHasher, tlabel: &'static str, label: &'static str, ctr: u64, k: usize) -> Vec<F> {
    let mut h = base.box_clone();
    h.update(b"challenge:");
    h.update(b"GKRZKP.v1");
    h.update(b":tlabel:");
    h.update(tlabel.as_bytes());
    h.update(b":label:");
    h.update(label.as_bytes());
    h.update(b":ctr:");
    h.update(&ctr.to_be_bytes());

    let mut out = Vec::with_capacity(k);
    let mut block = 0u64;
    for _ in 0..k {
        let mut wide = Vec::with_capacity(64);
        while wide.len() < 64 {
            let mut b = h.box_clone();
            b.update(b":block:");
            b.update(&block.to_be_bytes());
            wide.extend_from_slice(&b.finalize());
            block += 1;
        }
        out.push(F::from_le_bytes_mod_order(&wide[..64]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashRegistry, BLAKE3, SHA256};

    fn fresh(hash: &str) -> Transcript {
        let reg = HashRegistry::with_defaults();
        Transcript::new("test", reg.resolve(hash).unwrap().native())
    }

    #[test]
    fn same_schedule_same_challenges() {
        let mut t1 = fresh(BLAKE3);
        let mut t2 = fresh(BLAKE3);
        for t in [&mut t1, &mut t2] {
            t.absorb_counter(FsLabel::Nonce, 42);
            t.absorb_scalars(FsLabel::RoundPoly, &[F::from(1u64), F::from(2u64)]);
        }
        assert_eq!(t1.challenge_points(FsLabel::OutputPoint, 3), t2.challenge_points(FsLabel::OutputPoint, 3));
        assert_eq!(t1.challenge_f(FsLabel::RoundChallenge), t2.challenge_f(FsLabel::RoundChallenge));
    }

    #[test]
    fn counter_advances_between_challenges() {
        let mut t = fresh(SHA256);
        let a = t.challenge_f(FsLabel::RoundChallenge);
        let b = t.challenge_f(FsLabel::RoundChallenge);
        assert_ne!(a, b);
    }

    #[test]
    fn absorbed_data_changes_challenges() {
        let mut t1 = fresh(BLAKE3);
        let mut t2 = fresh(BLAKE3);
        t1.absorb_scalar(FsLabel::InputEvals, &F::from(5u64));
        t2.absorb_scalar(FsLabel::InputEvals, &F::from(6u64));
        assert_ne!(t1.challenge_f(FsLabel::RoundChallenge), t2.challenge_f(FsLabel::RoundChallenge));
    }

    #[test]
    fn hash_choice_changes_challenges() {
        let mut t1 = fresh(BLAKE3);
        let mut t2 = fresh(SHA256);
        assert_ne!(t1.challenge_f(FsLabel::OutputPoint), t2.challenge_f(FsLabel::OutputPoint));
    }

    #[test]
    fn multi_point_challenges_are_distinct() {
        let mut t = fresh(BLAKE3);
        let pts = t.challenge_points(FsLabel::OutputPoint, 4);
        assert_eq!(pts.len(), 4);
        for i in 0..pts.len() {
            for j in (i + 1)..pts.len() {
                assert_ne!(pts[i], pts[j]);
            }
        }
    }
}
