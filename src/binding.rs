//! Binding layer: hand GKR results back to the enclosing proof system
//!
//! A [`Solution`] owns a frozen circuit and its solved witness. It exports
//! output lanes as plain field values, produces proofs under a named hash,
//! and verifies them. The enclosing system sees only [`ConstraintApi`]; this
//! module never asserts anything on its own, callers decide what to compare.
//!
//! ```
//! use gkrzkp::binding::{ConstraintApi, NativeEngine, Solution};
//! use gkrzkp::{circuit::Builder, hash::HashRegistry, F};
//!
//! let mut b = Builder::new();
//! let x = b.import([200_000_000_000_000_000u64]).unwrap();
//! let y = b.import([20u64]).unwrap();
//! let z = b.add(x, y).unwrap();
//! let sol = Solution::new(b.freeze().unwrap(), b.assignment()).unwrap();
//!
//! let reg = HashRegistry::with_defaults();
//! sol.verify(&reg, "sha256", 134234).unwrap();
//!
//! let mut api = NativeEngine::default();
//! api.assert_is_equal(F::from(200_000_000_000_000_020u64), sol.export(z).unwrap()[0]).unwrap();
//! assert_eq!(api.assertions(), 1);
//! ```

#![forbid(unsafe_code)]

use std::sync::Arc;

use crate::circuit::{Circuit, ConstructionError, Wire};
use crate::gkr::{Prover, Statement, VerificationError, Verifier};
use crate::hash::{HashBuilder, HashRegistry};
use crate::solver::{solve, Assignment, SolveError, Witness};
use crate::{Proof, F};

/// An enclosing-system equality check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assertion #{index} failed: {left} != {right}")]
pub struct AssertionError {
    /// Zero-based position of the failing assertion.
    pub index: usize,
    /// Left operand.
    pub left: F,
    /// Right operand.
    pub right: F,
}

/// The slice of an enclosing constraint system the binding layer relies on.
pub trait ConstraintApi {
    /// Constrain `a == b`.
    fn assert_is_equal(&mut self, a: F, b: F) -> Result<(), AssertionError>;

    /// Constrain two lane vectors to be equal, lane by lane.
    fn assert_all_equal(&mut self, a: &[F], b: &[F]) -> Result<(), AssertionError> {
        for (x, y) in a.iter().zip(b) {
            self.assert_is_equal(*x, *y)?;
        }
        Ok(())
    }
}

/// Eager enclosing engine over concrete values: checks each assertion
/// immediately and counts them.
#[derive(Debug, Default, Clone)]
pub struct NativeEngine {
    assertions: usize,
}

impl NativeEngine {
    /// Number of assertions made so far (passing or not).
    pub fn assertions(&self) -> usize {
        self.assertions
    }
}

impl ConstraintApi for NativeEngine {
    fn assert_is_equal(&mut self, a: F, b: F) -> Result<(), AssertionError> {
        let index = self.assertions;
        self.assertions += 1;
        if a == b {
            Ok(())
        } else {
            Err(AssertionError { index, left: a, right: b })
        }
    }
}

fn resolve<'r>(registry: &'r HashRegistry, hash_name: &str) -> Result<&'r HashBuilder, VerificationError> {
    registry.resolve(hash_name).map_err(|_| VerificationError::UnknownHash(hash_name.to_string()))
}

/// A solved circuit.
#[derive(Clone, Debug)]
pub struct Solution {
    circuit: Arc<Circuit>,
    witness: Witness,
}

impl Solution {
    /// Solve `circuit` over `assignment`.
    pub fn new(circuit: Arc<Circuit>, assignment: &Assignment) -> Result<Self, SolveError> {
        let witness = solve(&circuit, assignment)?;
        Ok(Self { circuit, witness })
    }

    /// The frozen circuit.
    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    /// The full (padded) witness.
    pub fn witness(&self) -> &Witness {
        &self.witness
    }

    /// Lane values of output wire `w`.
    pub fn export(&self, w: Wire) -> Result<Vec<F>, ConstructionError> {
        let i = self.circuit.check_wire(w)?;
        if !self.circuit.is_output(i) {
            return Err(ConstructionError::NotAnOutput(w));
        }
        Ok(self.witness.lanes_of(i).to_vec())
    }

    /// [`export`](Self::export) for several wires, in the given order.
    pub fn export_many(&self, wires: &[Wire]) -> Result<Vec<Vec<F>>, ConstructionError> {
        wires.iter().map(|&w| self.export(w)).collect()
    }

    /// Public statement (imports and outputs) of this solution.
    pub fn statement(&self) -> Statement {
        Statement::from_witness(&self.circuit, &self.witness)
    }

    /// Prove the solution under the hash registered as `hash_name`.
    pub fn prove(&self, registry: &HashRegistry, hash_name: &str, nonce: u64) -> Result<Proof, VerificationError> {
        let hash = resolve(registry, hash_name)?;
        let prover = Prover::new(&self.circuit, &self.witness)
            .map_err(|_| VerificationError::InvalidStatement("witness does not match circuit"))?;
        Ok(prover.prove(hash, hash_name, nonce))
    }

    /// Check `proof` against this solution's statement.
    pub fn verify_proof(
        &self,
        registry: &HashRegistry,
        hash_name: &str,
        nonce: u64,
        proof: &Proof,
    ) -> Result<(), VerificationError> {
        verify_statement(&self.circuit, &self.statement(), registry, hash_name, nonce, proof)
    }

    /// Prove and immediately verify.
    pub fn verify(&self, registry: &HashRegistry, hash_name: &str, nonce: u64) -> Result<(), VerificationError> {
        let proof = self.prove(registry, hash_name, nonce)?;
        self.verify_proof(registry, hash_name, nonce, &proof)
    }
}

/// Verify `proof` for `statement` without any witness.
pub fn verify_statement(
    circuit: &Circuit,
    statement: &Statement,
    registry: &HashRegistry,
    hash_name: &str,
    nonce: u64,
    proof: &Proof,
) -> Result<(), VerificationError> {
    let hash = resolve(registry, hash_name)?;
    Verifier::new(circuit).verify(hash, hash_name, nonce, statement, proof)
}
