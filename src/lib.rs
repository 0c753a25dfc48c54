//! Crate root: public surface, core aliases, and protocol-wide invariants
//!
//! `gkrzkp` delegates a data-parallel arithmetic sub-computation to a GKR
//! sub-circuit. The sub-circuit is evaluated once, outside any enclosing
//! constraint system, and proved correct with a sum-check protocol made
//! non-interactive by a Fiat–Shamir transform over a **named** hash.
//!
//! ## Invariants
//!
//! - **Field.** The scalar field is `ark_bn254::Fr` (`F` in this crate). All
//!   arithmetic comes from Arkworks; we **forbid unsafe** throughout the crate.
//!
//! - **Lanes.** Every wire carries one value per lane. Lane vectors are padded
//!   to `2^v` entries; padding lanes see all-zero imports and the gate values
//!   that follow from them, so a verifier can rebuild them alone.
//!
//! - **Acyclicity.** A wire is an index into an append-only gate arena and a
//!   gate may only reference earlier wires, so arena order is a topological
//!   order.
//!
//! - **Fiat–Shamir (FS).** Labelled, length-delimited absorbs over the hash
//!   resolved from a [`hash::HashRegistry`]. The prover and verifier replay the
//!   exact same sequence of absorbs/challenges.
//!
//! - **Configuration binding.** The proof header carries a digest of the
//!   circuit shape computed with the binding's field hasher; a proof for a
//!   different circuit fails with [`VerificationError::CircuitMismatch`].
//!
//! ## Flow
//!
//! ```
//! use gkrzkp::{binding::Solution, circuit::Builder, hash::HashRegistry, F};
//!
//! let mut b = Builder::new();
//! let x = b.import([1u64, 2]).unwrap();
//! let y = b.import([3u64, 4]).unwrap();
//! let z = b.add(x, y).unwrap();
//! let circuit = b.freeze().unwrap();
//!
//! let sol = Solution::new(circuit, b.assignment()).unwrap();
//! assert_eq!(sol.export(z).unwrap(), vec![F::from(4u64), F::from(6u64)]);
//!
//! let reg = HashRegistry::with_defaults();
//! sol.verify(&reg, "blake3", 7).unwrap();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Lane counts, hypercube padding, and the parallelism switch.
pub mod lanes;
/// Round polynomials, `eq`, and multilinear extensions.
pub mod poly;
/// Named hash registry (native and field hashers).
pub mod hash;
/// Fiat–Shamir transcript (domain-separated hashing, hash→field).
pub mod transcript;
/// Gate arena and builder.
pub mod circuit;
/// Witness solver (evaluation outside the enclosing system).
pub mod solver;
/// Per-gate sum-check.
pub mod sumcheck;
/// Prover / verifier orchestration over the whole circuit.
pub mod gkr;
/// Export, prove/verify, and the enclosing-system seam.
pub mod binding;
/// Happy-path builder facade and proof file I/O.
pub mod api;
/// Demo configuration (defaults → file → env → CLI).
pub mod config;
/// Demo circuit shared by the binaries.
pub mod demo;

// ============================================================================
// Canonical aliases and root-level re-exports
// ============================================================================

/// Scalar field used across the crate (BN254).
pub type F = ark_bn254::Fr;

pub use crate::binding::{verify_statement, ConstraintApi, NativeEngine, Solution};
pub use crate::circuit::{Builder, Circuit, ConstructionError, GateKind, Wire};
pub use crate::gkr::{MismatchStage, Prover, Statement, VerificationError, Verifier, PROOF_VERSION};
pub use crate::hash::{HashBuilder, HashRegistry, RegistryError};
pub use crate::poly::RoundPoly;
pub use crate::solver::{solve, Assignment, SolveError, Witness};

/// Every library error, for callers that want a single type.
#[derive(Debug, thiserror::Error)]
pub enum GkrError {
    /// Circuit construction or wire addressing.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    /// Witness solving.
    #[error(transparent)]
    Solve(#[from] SolveError),
    /// Proof generation or verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),
    /// Hash registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Prover given a witness of another circuit.
    #[error(transparent)]
    Prove(#[from] gkr::ProveError),
    /// Enclosing-system assertion.
    #[error(transparent)]
    Assertion(#[from] binding::AssertionError),
    /// Demo configuration.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Proof (de)serialization.
    #[error("proof encoding: {0}")]
    Encoding(ark_serialize::SerializationError),
}

impl From<ark_serialize::SerializationError> for GkrError {
    fn from(e: ark_serialize::SerializationError) -> Self {
        GkrError::Encoding(e)
    }
}

// ============================================================================
// Proof types
// ============================================================================

/// Versioned, serializable **protocol header** bound into the transcript.
///
/// Serialization uses Arkworks canonical compressed encodings.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProofHeader {
    /// Proof format version ([`PROOF_VERSION`]).
    pub version: u16,
    /// Unpadded lane count.
    pub lanes: u64,
    /// Hypercube dimension `v`.
    pub num_vars: u32,
    /// Circuit configuration digest under the binding's field hasher.
    pub circuit_digest: F,
}

/// Sum-check transcript of one non-import wire.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct WireProof {
    /// Arena index of the wire.
    pub wire: u32,
    /// One round polynomial per variable, in coefficient form.
    pub rounds: Vec<RoundPoly>,
    /// Input-wire evaluations at the final sum-check point, in gate input order.
    pub input_evals: Vec<F>,
}

/// The GKR proof object.
///
/// `wire_proofs` holds one entry per non-import gate in **descending** wire
/// order, which is the order the verifier consumes them in.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof {
    /// Protocol header bound into FS.
    pub header: ProofHeader,
    /// Per-wire sum-check transcripts.
    pub wire_proofs: Vec<WireProof>,
}

impl Proof {
    /// Total number of sum-check rounds across all wires.
    pub fn round_count(&self) -> usize {
        self.wire_proofs.iter().map(|w| w.rounds.len()).sum()
    }

    /// Canonical compressed encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ark_serialize::SerializationError> {
        let mut out = Vec::with_capacity(self.compressed_size());
        self.serialize_compressed(&mut out)?;
        Ok(out)
    }

    /// Decode a canonical compressed encoding (with validation).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ark_serialize::SerializationError> {
        let mut reader = bytes;
        let proof = Self::deserialize_compressed(&mut reader)?;
        if !reader.is_empty() {
            return Err(ark_serialize::SerializationError::InvalidData);
        }
        Ok(proof)
    }
}
