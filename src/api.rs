// src/api.rs
//! “Happy-path” crate API
//!
//! This module wraps the protocol core with a small, ergonomic surface area:
//! - `GkrApi`: one object that imports, composes gates and solves, in the
//!   same call sequence a circuit author writes (`import`, `add`, `solve`)
//! - one-shot `prove` / `verify` helpers returning `anyhow::Result`
//! - proof file I/O helpers: `io::write_proof` / `io::read_proof`
//!
//! Everything delegates to `circuit`, `binding` and `gkr`. No protocol changes.

#![forbid(unsafe_code)]

use crate::{
    binding::Solution,
    circuit::{Builder, ConstructionError, GateKind, Wire},
    hash::HashRegistry,
    GkrError, Proof, F,
};

// ===============================================================================================
// Facade
// ===============================================================================================

/// Builder + solver behind one handle.
///
/// ```
/// use gkrzkp::api::GkrApi;
/// use gkrzkp::hash::HashRegistry;
///
/// let mut gkr = GkrApi::new();
/// let x = gkr.import([1u64, 2, 3]).unwrap();
/// let y = gkr.import([4u64, 5, 6]).unwrap();
/// let z = gkr.mul(x, y).unwrap();
/// let solution = gkr.solve().unwrap();
/// assert_eq!(solution.export(z).unwrap()[2], gkrzkp::F::from(18u64));
///
/// let reg = HashRegistry::with_defaults();
/// gkrzkp::api::verify(&solution, &reg, "blake3", 1).unwrap();
/// ```
#[derive(Default)]
pub struct GkrApi {
    builder: Builder,
}

impl GkrApi {
    /// Fresh, empty sub-circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Import one column of lane values.
    pub fn import<I>(&mut self, values: I) -> Result<Wire, ConstructionError>
    where
        I: IntoIterator,
        I::Item: Into<F>,
    {
        self.builder.import(values)
    }

    /// `a + b`
    pub fn add(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.builder.add(a, b)
    }

    /// `a - b`
    pub fn sub(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.builder.sub(a, b)
    }

    /// `a · b`
    pub fn mul(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.builder.mul(a, b)
    }

    /// Copy of `a`.
    pub fn identity(&mut self, a: Wire) -> Result<Wire, ConstructionError> {
        self.builder.identity(a)
    }

    /// Any non-import gate.
    pub fn gate(&mut self, kind: GateKind, inputs: &[Wire]) -> Result<Wire, ConstructionError> {
        self.builder.gate(kind, inputs)
    }

    /// Keep an intermediate wire exportable.
    pub fn mark_output(&mut self, w: Wire) -> Result<(), ConstructionError> {
        self.builder.mark_output(w)
    }

    /// Freeze the circuit and solve it over the imported values.
    ///
    /// A second call fails with [`ConstructionError::CircuitFrozen`].
    pub fn solve(&mut self) -> Result<Solution, GkrError> {
        let circuit = self.builder.freeze()?;
        Ok(Solution::new(circuit, self.builder.assignment())?)
    }
}

// ===============================================================================================
/* One-shot helpers */
// ===============================================================================================

/// Prove `solution` under the hash registered as `hash_name`.
pub fn prove(solution: &Solution, registry: &HashRegistry, hash_name: &str, nonce: u64) -> anyhow::Result<Proof> {
    solution
        .prove(registry, hash_name, nonce)
        .map_err(|e| anyhow::anyhow!("prover failed: {e}"))
}

/// Prove and verify `solution` in one go.
pub fn verify(solution: &Solution, registry: &HashRegistry, hash_name: &str, nonce: u64) -> anyhow::Result<()> {
    solution
        .verify(registry, hash_name, nonce)
        .map_err(|e| anyhow::anyhow!("verification failed: {e}"))
}

// ===============================================================================================
/* Proof I/O (magic + version + ark-compressed) */
// ===============================================================================================

pub mod io {
    //! Versioned proof files:
    //!   magic: `b"GKRPRF1\0"` (8 bytes) + u16 BE version + ark-compressed [`Proof`].

    use std::{fs, path::Path};

    use crate::Proof;

    /// 8-byte magic used by the `prover`/`verifier` CLIs.
    pub const FILE_MAGIC: &[u8; 8] = b"GKRPRF1\0";
    /// File format version.
    pub const FILE_VERSION: u16 = 1;

    /// Encode `proof` as a proof file image.
    pub fn encode_proof(proof: &Proof) -> anyhow::Result<Vec<u8>> {
        let payload = proof.to_bytes().map_err(|e| anyhow::anyhow!("serialize proof: {e}"))?;
        let mut out = Vec::with_capacity(FILE_MAGIC.len() + 2 + payload.len());
        out.extend_from_slice(FILE_MAGIC);
        out.extend_from_slice(&FILE_VERSION.to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode a proof file image.
    pub fn decode_proof(bytes: &[u8]) -> anyhow::Result<Proof> {
        if bytes.len() < FILE_MAGIC.len() + 2 {
            return Err(anyhow::anyhow!("proof file truncated ({} bytes)", bytes.len()));
        }
        let (magic, rest) = bytes.split_at(FILE_MAGIC.len());
        if magic != FILE_MAGIC {
            return Err(anyhow::anyhow!("bad proof file magic (expected GKRPRF1)"));
        }
        let (ver, payload) = rest.split_at(2);
        let file_ver = u16::from_be_bytes([ver[0], ver[1]]);
        if file_ver != FILE_VERSION {
            return Err(anyhow::anyhow!("unsupported proof version: {file_ver}"));
        }
        Proof::from_bytes(payload).map_err(|e| anyhow::anyhow!("deserialize proof: {e}"))
    }

    /// Write a proof file at `path`; returns the number of bytes written.
    pub fn write_proof(path: &Path, proof: &Proof) -> anyhow::Result<usize> {
        let bytes = encode_proof(proof)?;
        fs::write(path, &bytes).map_err(|e| anyhow::anyhow!("write {}: {e}", path.display()))?;
        Ok(bytes.len())
    }

    /// Read a proof file from `path`.
    pub fn read_proof(path: &Path) -> anyhow::Result<Proof> {
        let bytes = fs::read(path).map_err(|e| anyhow::anyhow!("open {}: {e}", path.display()))?;
        decode_proof(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::BLAKE3;

    fn small_solution() -> (Solution, Wire) {
        let mut gkr = GkrApi::new();
        let x = gkr.import([1u64, 2, 3]).unwrap();
        let y = gkr.import([4u64, 5, 6]).unwrap();
        let s = gkr.sub(y, x).unwrap();
        let out = gkr.identity(s).unwrap();
        (gkr.solve().unwrap(), out)
    }

    #[test]
    fn facade_solves_and_refuses_second_solve() {
        let mut gkr = GkrApi::new();
        let x = gkr.import([2u64]).unwrap();
        let y = gkr.import([3u64]).unwrap();
        let z = gkr.add(x, y).unwrap();
        let sol = gkr.solve().unwrap();
        assert_eq!(sol.export(z).unwrap(), vec![F::from(5u64)]);
        assert!(matches!(gkr.solve(), Err(GkrError::Construction(ConstructionError::CircuitFrozen))));
    }

    #[test]
    fn facade_without_imports_fails_to_solve() {
        let mut gkr = GkrApi::new();
        assert!(matches!(gkr.solve(), Err(GkrError::Solve(_))));
    }

    #[test]
    fn proof_file_round_trip() {
        let (sol, out) = small_solution();
        assert_eq!(sol.export(out).unwrap(), vec![F::from(3u64); 3]);
        let reg = HashRegistry::with_defaults();
        let proof = prove(&sol, &reg, BLAKE3, 11).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof.gkr");
        let written = io::write_proof(&path, &proof).unwrap();
        assert_eq!(written as u64, std::fs::metadata(&path).unwrap().len());

        let back = io::read_proof(&path).unwrap();
        assert_eq!(back, proof);
        sol.verify_proof(&reg, BLAKE3, 11, &back).unwrap();
    }

    #[test]
    fn proof_file_header_is_checked() {
        let (sol, _) = small_solution();
        let reg = HashRegistry::with_defaults();
        let proof = prove(&sol, &reg, BLAKE3, 0).unwrap();
        let good = io::encode_proof(&proof).unwrap();
        assert_eq!(&good[..8], io::FILE_MAGIC);

        let mut bad_magic = good.clone();
        bad_magic[0] ^= 1;
        assert!(io::decode_proof(&bad_magic).is_err());

        let mut bad_version = good.clone();
        bad_version[9] = 2;
        assert!(io::decode_proof(&bad_version).unwrap_err().to_string().contains("unsupported"));

        assert!(io::decode_proof(&good[..5]).is_err());
        assert!(io::decode_proof(&good[..good.len() - 1]).is_err());
    }

    #[test]
    fn one_shot_verify_reports_unknown_hash() {
        let (sol, _) = small_solution();
        let reg = HashRegistry::with_defaults();
        let err = verify(&sol, &reg, "mimc", 1).unwrap_err();
        assert!(err.to_string().contains("mimc"));
    }
}
