//! Demo circuit shared by the `prover` and `verifier` binaries
//!
//! Two imported columns `x`, `y` of random lanes and one gate `z = x + y`.
//! Inputs come from a `StdRng` seeded with [`DemoConfig::seed`], so both
//! binaries rebuild the exact same statement from the same configuration.

#![forbid(unsafe_code)]

use ark_ff::UniformRand;
use rand::{rngs::StdRng, SeedableRng};

use crate::binding::{ConstraintApi, NativeEngine, Solution};
use crate::circuit::{Builder, Wire};
use crate::config::DemoConfig;
use crate::{GkrError, F};

/// Solved demo circuit plus the handles the binaries report on.
pub struct PairwiseAdd {
    /// The solved sub-circuit.
    pub solution: Solution,
    /// `x` column.
    pub x: Wire,
    /// `y` column.
    pub y: Wire,
    /// `z = x + y`.
    pub z: Wire,
}

/// Deterministic inputs for `cfg`.
pub fn inputs(cfg: &DemoConfig) -> (Vec<F>, Vec<F>) {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let xs = (0..cfg.lanes).map(|_| F::rand(&mut rng)).collect();
    let ys = (0..cfg.lanes).map(|_| F::rand(&mut rng)).collect();
    (xs, ys)
}

/// Build and solve the pairwise-add circuit for `cfg`.
pub fn pairwise_add(cfg: &DemoConfig) -> Result<PairwiseAdd, GkrError> {
    let (xs, ys) = inputs(cfg);
    let mut b = Builder::new();
    let x = b.import(xs)?;
    let y = b.import(ys)?;
    let z = b.add(x, y)?;
    let circuit = b.freeze()?;
    let solution = Solution::new(circuit, b.assignment())?;
    Ok(PairwiseAdd { solution, x, y, z })
}

impl PairwiseAdd {
    /// Assert, in the enclosing engine, that every exported `z` lane equals
    /// the natively computed `x + y`.
    pub fn check_exports(&self, engine: &mut impl ConstraintApi) -> Result<(), GkrError> {
        let w = self.solution.witness();
        let expected: Vec<F> =
            w.lanes_of(self.x.index()).iter().zip(w.lanes_of(self.y.index())).map(|(a, b)| *a + b).collect();
        let exported = self.solution.export(self.z)?;
        engine.assert_all_equal(&expected, &exported)?;
        Ok(())
    }

    /// Convenience: [`check_exports`](Self::check_exports) on a fresh [`NativeEngine`].
    pub fn check_exports_natively(&self) -> Result<NativeEngine, GkrError> {
        let mut engine = NativeEngine::default();
        self.check_exports(&mut engine)?;
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashRegistry;

    fn cfg(lanes: usize, seed: u64) -> DemoConfig {
        DemoConfig { lanes, seed, ..DemoConfig::default() }
    }

    #[test]
    fn same_seed_same_statement() {
        let a = pairwise_add(&cfg(7, 1)).unwrap();
        let b = pairwise_add(&cfg(7, 1)).unwrap();
        let c = pairwise_add(&cfg(7, 2)).unwrap();
        assert_eq!(a.solution.statement(), b.solution.statement());
        assert_ne!(a.solution.statement(), c.solution.statement());
    }

    #[test]
    fn demo_exports_match_native_sum_and_verify() {
        let c = cfg(12, 4);
        let demo = pairwise_add(&c).unwrap();
        let engine = demo.check_exports_natively().unwrap();
        assert_eq!(engine.assertions(), 12);

        let reg = HashRegistry::with_defaults();
        demo.solution.verify(&reg, &c.hash, c.nonce).unwrap();
    }
}
