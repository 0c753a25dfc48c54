//! GKR prover / verifier orchestration
//!
//! ## Overview
//! The prover walks the gate arena **backwards**, from the outputs to the
//! imports, reducing every claim on a wire to claims on its inputs through
//! one sum-check (see [`crate::sumcheck`]). The verifier replays the same
//! transcript and, at the bottom, checks the claims on import wires by
//! evaluating the multilinear extension of the assignment directly.
//!
//! ## Transcript schedule (prover = verifier)
//!   **[ hash name ] [ header ] [ nonce ] [ imports… ] [ outputs… ]
//!   [ output points ] [ per wire, descending: sum-check items ]**
//!
//! The nonce is pure domain separation: it is absorbed right after the header,
//! so a proof only verifies under the nonce it was produced with whenever the
//! protocol draws a challenge at all.
//!
//! ## Output claims
//! Output vectors are padded by the verifier itself with
//! [`Circuit::padding_lane`], so the statement only carries the real lanes.

#![forbid(unsafe_code)]

use std::fmt;

use crate::circuit::{Circuit, GateKind};
use crate::hash::HashBuilder;
use crate::lanes;
use crate::poly::mle_eval;
use crate::solver::Witness;
use crate::sumcheck::{self, Claim};
use crate::transcript::{FsLabel, Transcript};
use crate::{Proof, ProofHeader, WireProof, F};

/// Current proof format version.
pub const PROOF_VERSION: u16 = 1;

const TRANSCRIPT_LABEL: &str = "gkrzkp.gkr";

/// Where a sum-check consistency check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchStage {
    /// `p(0) + p(1)` disagreed with the running claim in this round.
    Round(usize),
    /// The last round's claim disagreed with the gate applied to the input evaluations.
    Final,
    /// A claim on an import wire disagreed with the assignment.
    Import,
}

impl fmt::Display for MismatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchStage::Round(i) => write!(f, "round {i}"),
            MismatchStage::Final => f.write_str("final evaluation"),
            MismatchStage::Import => f.write_str("import evaluation"),
        }
    }
}

/// Cryptographic or protocol failures. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The proof's shape does not fit the circuit.
    #[error("malformed proof: {0}")]
    ProofMalformed(&'static str),
    /// A sum-check equation does not hold.
    #[error("sum-check mismatch on wire {wire} at {stage}")]
    SumCheckMismatch {
        /// Arena index of the wire being reduced.
        wire: usize,
        /// Failing check.
        stage: MismatchStage,
    },
    /// The hash name is not registered.
    #[error("hash `{0}` is not registered")]
    UnknownHash(String),
    /// The proof was produced for a different circuit configuration.
    #[error("circuit configuration digest does not match the proof")]
    CircuitMismatch,
    /// The public statement does not fit the circuit.
    #[error("invalid statement: {0}")]
    InvalidStatement(&'static str),
}

/// Prover-side shape errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProveError {
    /// The witness was not solved from this circuit.
    #[error("witness does not match circuit: {0}")]
    WitnessShape(&'static str),
}

/// Public data the verifier checks against: real (unpadded) lanes only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    /// Lane count.
    pub lanes: usize,
    /// `(wire index, lane values)` for every import, ascending.
    pub imports: Vec<(usize, Vec<F>)>,
    /// `(wire index, lane values)` for every output, ascending.
    pub outputs: Vec<(usize, Vec<F>)>,
}

impl Statement {
    /// Collect the statement of a solved circuit.
    pub fn from_witness(circuit: &Circuit, witness: &Witness) -> Self {
        let imports = circuit.imports().map(|i| (i, witness.lanes_of(i).to_vec())).collect();
        let outputs = circuit.outputs().iter().map(|&i| (i, witness.lanes_of(i).to_vec())).collect();
        Self { lanes: witness.lanes(), imports, outputs }
    }

    fn validate(&self, circuit: &Circuit) -> Result<(), VerificationError> {
        if self.lanes != circuit.lanes() || self.lanes == 0 {
            return Err(VerificationError::InvalidStatement("lane count differs from circuit"));
        }
        if !self.imports.iter().map(|(i, _)| *i).eq(circuit.imports()) {
            return Err(VerificationError::InvalidStatement("imports differ from circuit imports"));
        }
        if !self.outputs.iter().map(|(i, _)| *i).eq(circuit.outputs().iter().copied()) {
            return Err(VerificationError::InvalidStatement("outputs differ from circuit outputs"));
        }
        let lanes_ok = self.imports.iter().chain(&self.outputs).all(|(_, v)| v.len() == self.lanes);
        if !lanes_ok {
            return Err(VerificationError::InvalidStatement("vector length differs from lane count"));
        }
        Ok(())
    }
}

fn open_transcript(
    hash: &HashBuilder,
    hash_name: &str,
    header: &ProofHeader,
    nonce: u64,
    statement: &Statement,
) -> Transcript {
    let mut fs = Transcript::new(TRANSCRIPT_LABEL, hash.native());
    fs.absorb_bytes(FsLabel::HashName, hash_name.as_bytes());
    fs.absorb_serializable(FsLabel::Header, header);
    fs.absorb_counter(FsLabel::Nonce, nonce);
    for (i, v) in &statement.imports {
        fs.absorb_counter(FsLabel::ImportValues, *i as u64);
        fs.absorb_scalars(FsLabel::ImportValues, v);
    }
    for (i, v) in &statement.outputs {
        fs.absorb_counter(FsLabel::OutputValues, *i as u64);
        fs.absorb_scalars(FsLabel::OutputValues, v);
    }
    fs
}

fn header_for(circuit: &Circuit, hash: &HashBuilder) -> ProofHeader {
    ProofHeader {
        version: PROOF_VERSION,
        lanes: circuit.lanes() as u64,
        num_vars: circuit.num_vars() as u32,
        circuit_digest: circuit.digest(hash.field_hasher().as_mut()),
    }
}

/// Proves that a witness is the correct evaluation of its circuit.
pub struct Prover<'a> {
    circuit: &'a Circuit,
    witness: &'a Witness,
}

impl<'a> Prover<'a> {
    /// Pair a circuit with the witness solved from it.
    pub fn new(circuit: &'a Circuit, witness: &'a Witness) -> Result<Self, ProveError> {
        if witness.len() != circuit.len() {
            return Err(ProveError::WitnessShape("wire count"));
        }
        if witness.lanes() != circuit.lanes() || witness.num_vars() != circuit.num_vars() {
            return Err(ProveError::WitnessShape("lane count"));
        }
        Ok(Self { circuit, witness })
    }

    /// Produce a proof under the named hash binding and `nonce`.
    pub fn prove(&self, hash: &HashBuilder, hash_name: &str, nonce: u64) -> Proof {
        let _span = tracing::debug_span!("gkr_prove", hash = hash_name, nonce).entered();
        let circuit = self.circuit;
        let v = circuit.num_vars();
        let header = header_for(circuit, hash);
        let statement = Statement::from_witness(circuit, self.witness);
        let mut fs = open_transcript(hash, hash_name, &header, nonce, &statement);

        let mut claims: Vec<Vec<Claim>> = vec![Vec::new(); circuit.len()];
        for &o in circuit.outputs() {
            let point = fs.challenge_points(FsLabel::OutputPoint, v);
            let value = mle_eval(self.witness.padded(o), &point);
            claims[o].push(Claim { point, value });
        }

        let mut wire_proofs = Vec::new();
        for (i, gate) in circuit.gates().iter().enumerate().rev() {
            if gate.kind == GateKind::Import {
                continue;
            }
            let wire_claims = std::mem::take(&mut claims[i]);
            let inputs: Vec<&[F]> = gate.inputs.iter().map(|&j| self.witness.padded(j)).collect();
            let red = sumcheck::prove_gate(gate.kind, &wire_claims, &inputs, &mut fs);
            for (&j, &e) in gate.inputs.iter().zip(&red.input_evals) {
                claims[j].push(Claim { point: red.point.clone(), value: e });
            }
            tracing::trace!(wire = i, gate = gate.kind.name(), claims = wire_claims.len(), "wire reduced");
            wire_proofs.push(WireProof { wire: i as u32, rounds: red.rounds, input_evals: red.input_evals });
        }

        let proof = Proof { header, wire_proofs };
        tracing::debug!(wire_proofs = proof.wire_proofs.len(), rounds = proof.round_count(), "gkr proof produced");
        proof
    }
}

/// Replays the transcript and checks a proof against a statement.
pub struct Verifier<'a> {
    circuit: &'a Circuit,
}

impl<'a> Verifier<'a> {
    /// Verifier for `circuit`.
    pub fn new(circuit: &'a Circuit) -> Self {
        Self { circuit }
    }

    /// Check `proof` for `statement` under the named hash binding and `nonce`.
    pub fn verify(
        &self,
        hash: &HashBuilder,
        hash_name: &str,
        nonce: u64,
        statement: &Statement,
        proof: &Proof,
    ) -> Result<(), VerificationError> {
        let _span = tracing::debug_span!("gkr_verify", hash = hash_name, nonce).entered();
        let res = self.verify_inner(hash, hash_name, nonce, statement, proof);
        if let Err(e) = &res {
            tracing::warn!(error = %e, "gkr proof rejected");
        }
        res
    }

    fn verify_inner(
        &self,
        hash: &HashBuilder,
        hash_name: &str,
        nonce: u64,
        statement: &Statement,
        proof: &Proof,
    ) -> Result<(), VerificationError> {
        let circuit = self.circuit;
        statement.validate(circuit)?;

        let h = &proof.header;
        if h.version != PROOF_VERSION {
            return Err(VerificationError::ProofMalformed("unsupported proof version"));
        }
        if h.lanes != circuit.lanes() as u64 || h.num_vars as usize != circuit.num_vars() {
            return Err(VerificationError::ProofMalformed("header shape differs from circuit"));
        }
        if h.circuit_digest != circuit.digest(hash.field_hasher().as_mut()) {
            return Err(VerificationError::CircuitMismatch);
        }

        let v = circuit.num_vars();
        let padded = lanes::padded_lanes(circuit.lanes());
        let pad = circuit.padding_lane();
        let mut fs = open_transcript(hash, hash_name, h, nonce, statement);

        let mut claims: Vec<Vec<Claim>> = vec![Vec::new(); circuit.len()];
        for (o, values) in &statement.outputs {
            let point = fs.challenge_points(FsLabel::OutputPoint, v);
            let value = mle_eval(&lanes::pad_lanes(values, padded, pad[*o]), &point);
            claims[*o].push(Claim { point, value });
        }

        let expected = circuit.gates().iter().filter(|g| g.kind != GateKind::Import).count();
        if proof.wire_proofs.len() != expected {
            return Err(VerificationError::ProofMalformed("wrong number of wire proofs"));
        }
        let mut wps = proof.wire_proofs.iter();
        for (i, gate) in circuit.gates().iter().enumerate().rev() {
            if gate.kind == GateKind::Import {
                continue;
            }
            let wp = wps.next().ok_or(VerificationError::ProofMalformed("wrong number of wire proofs"))?;
            if wp.wire as usize != i {
                return Err(VerificationError::ProofMalformed("wire proofs out of order"));
            }
            let wire_claims = std::mem::take(&mut claims[i]);
            let point = sumcheck::verify_gate(gate.kind, i, &wire_claims, &wp.rounds, &wp.input_evals, v, &mut fs)?;
            for (&j, &e) in gate.inputs.iter().zip(&wp.input_evals) {
                claims[j].push(Claim { point: point.clone(), value: e });
            }
            tracing::trace!(wire = i, gate = gate.kind.name(), "wire verified");
        }

        for (i, values) in &statement.imports {
            let table = lanes::pad_lanes(values, padded, pad[*i]);
            for c in &claims[*i] {
                if mle_eval(&table, &c.point) != c.value {
                    return Err(VerificationError::SumCheckMismatch { wire: *i, stage: MismatchStage::Import });
                }
            }
        }
        tracing::debug!(wire_proofs = proof.wire_proofs.len(), "gkr proof verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Builder;
    use crate::hash::{HashRegistry, BLAKE3, SHA256};
    use crate::solver::solve;
    use ark_ff::{One, UniformRand};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;

    struct Fixture {
        circuit: Arc<Circuit>,
        witness: Witness,
    }

    impl Fixture {
        fn statement(&self) -> Statement {
            Statement::from_witness(&self.circuit, &self.witness)
        }
        fn prove(&self, hash: &str, nonce: u64) -> Proof {
            let reg = HashRegistry::with_defaults();
            Prover::new(&self.circuit, &self.witness).unwrap().prove(reg.resolve(hash).unwrap(), hash, nonce)
        }
        fn verify(&self, hash: &str, nonce: u64, proof: &Proof) -> Result<(), VerificationError> {
            let reg = HashRegistry::with_defaults();
            Verifier::new(&self.circuit).verify(reg.resolve(hash).unwrap(), hash, nonce, &self.statement(), proof)
        }
    }

    /// x, y imported; s = x + y; m = s * x; d = m - y; e = identity(s); outputs d, e (and s marked).
    fn mixed(lanes: usize, seed: u64) -> Fixture {
        let mut rng = StdRng::seed_from_u64(seed);
        let xs: Vec<F> = (0..lanes).map(|_| F::rand(&mut rng)).collect();
        let ys: Vec<F> = (0..lanes).map(|_| F::rand(&mut rng)).collect();
        let mut b = Builder::new();
        let x = b.import(xs).unwrap();
        let y = b.import(ys).unwrap();
        let s = b.add(x, y).unwrap();
        let m = b.mul(s, x).unwrap();
        b.sub(m, y).unwrap();
        b.identity(s).unwrap();
        b.mark_output(s).unwrap();
        let circuit = b.freeze().unwrap();
        let witness = solve(&circuit, b.assignment()).unwrap();
        Fixture { circuit, witness }
    }

    #[test]
    fn honest_proofs_verify_for_various_lane_counts() {
        for lanes in [1usize, 2, 3, 8, 13] {
            let fx = mixed(lanes, lanes as u64);
            let proof = fx.prove(BLAKE3, 1);
            assert_eq!(proof.header.num_vars as usize, fx.circuit.num_vars());
            fx.verify(BLAKE3, 1, &proof).unwrap();
        }
    }

    #[test]
    fn every_tampered_coefficient_is_a_sumcheck_mismatch() {
        let fx = mixed(6, 99);
        let proof = fx.prove(SHA256, 7);
        for (p, wp) in proof.wire_proofs.iter().enumerate() {
            for (r, rp) in wp.rounds.iter().enumerate() {
                for c in 0..rp.coeffs.len() {
                    let mut bad = proof.clone();
                    bad.wire_proofs[p].rounds[r].coeffs[c] += F::one();
                    let err = fx.verify(SHA256, 7, &bad).unwrap_err();
                    assert_eq!(
                        err,
                        VerificationError::SumCheckMismatch { wire: wp.wire as usize, stage: MismatchStage::Round(r) }
                    );
                }
            }
        }
    }

    #[test]
    fn tampered_input_evaluation_is_rejected() {
        let fx = mixed(4, 5);
        let proof = fx.prove(BLAKE3, 0);
        let mut bad = proof.clone();
        bad.wire_proofs[0].input_evals[0] += F::one();
        assert!(matches!(
            fx.verify(BLAKE3, 0, &bad).unwrap_err(),
            VerificationError::SumCheckMismatch { .. }
        ));
    }

    #[test]
    fn wrong_outputs_are_rejected() {
        let fx = mixed(4, 6);
        let proof = fx.prove(BLAKE3, 0);
        let mut st = fx.statement();
        st.outputs[0].1[2] += F::one();
        let reg = HashRegistry::with_defaults();
        let err = Verifier::new(&fx.circuit)
            .verify(reg.resolve(BLAKE3).unwrap(), BLAKE3, 0, &st, &proof)
            .unwrap_err();
        assert!(matches!(err, VerificationError::SumCheckMismatch { .. }));
    }

    #[test]
    fn wrong_imports_are_rejected() {
        let fx = mixed(4, 8);
        let proof = fx.prove(BLAKE3, 0);
        let mut st = fx.statement();
        st.imports[1].1[0] += F::one();
        let reg = HashRegistry::with_defaults();
        let err = Verifier::new(&fx.circuit)
            .verify(reg.resolve(BLAKE3).unwrap(), BLAKE3, 0, &st, &proof)
            .unwrap_err();
        assert!(matches!(err, VerificationError::SumCheckMismatch { .. }));
    }

    #[test]
    fn nonce_and_hash_are_bound() {
        let fx = mixed(8, 1);
        let proof = fx.prove(BLAKE3, 134234);
        assert!(fx.verify(BLAKE3, 134235, &proof).is_err());
        // The digest itself depends on the hash, so this is a configuration mismatch.
        assert_eq!(fx.verify(SHA256, 134234, &proof).unwrap_err(), VerificationError::CircuitMismatch);
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        let fx = mixed(4, 2);
        let proof = fx.prove(BLAKE3, 0);

        let mut bad = proof.clone();
        bad.wire_proofs.pop();
        assert!(matches!(fx.verify(BLAKE3, 0, &bad).unwrap_err(), VerificationError::ProofMalformed(_)));

        let mut bad = proof.clone();
        bad.wire_proofs.swap(0, 1);
        assert!(matches!(fx.verify(BLAKE3, 0, &bad).unwrap_err(), VerificationError::ProofMalformed(_)));

        let mut bad = proof.clone();
        bad.wire_proofs[0].rounds.pop();
        assert!(matches!(fx.verify(BLAKE3, 0, &bad).unwrap_err(), VerificationError::ProofMalformed(_)));

        let mut bad = proof.clone();
        bad.header.version = 9;
        assert!(matches!(fx.verify(BLAKE3, 0, &bad).unwrap_err(), VerificationError::ProofMalformed(_)));
    }

    #[test]
    fn proof_for_another_circuit_is_a_mismatch() {
        let a = mixed(4, 3);
        let proof = a.prove(BLAKE3, 0);

        let mut b = Builder::new();
        let x = b.import(a.witness.lanes_of(0).to_vec()).unwrap();
        let y = b.import(a.witness.lanes_of(1).to_vec()).unwrap();
        b.mul(x, y).unwrap();
        let circuit = b.freeze().unwrap();
        let witness = solve(&circuit, b.assignment()).unwrap();
        let other = Fixture { circuit, witness };
        assert_eq!(other.verify(BLAKE3, 0, &proof).unwrap_err(), VerificationError::CircuitMismatch);
    }

    #[test]
    fn statement_shape_is_checked() {
        let fx = mixed(4, 4);
        let proof = fx.prove(BLAKE3, 0);
        let mut st = fx.statement();
        st.imports.pop();
        let reg = HashRegistry::with_defaults();
        let err = Verifier::new(&fx.circuit)
            .verify(reg.resolve(BLAKE3).unwrap(), BLAKE3, 0, &st, &proof)
            .unwrap_err();
        assert!(matches!(err, VerificationError::InvalidStatement(_)));
    }

    #[test]
    fn prover_rejects_foreign_witness() {
        let a = mixed(4, 1);
        let b = mixed(8, 1);
        assert!(Prover::new(&a.circuit, &b.witness).is_err());
    }
}
