//! Witness solver
//!
//! Evaluates a frozen [`Circuit`] over an [`Assignment`] **outside** any
//! enclosing constraint system: no constraint is emitted per gate, which is
//! the whole point of delegating the computation to GKR.
//!
//! Gates are visited in arena order (a topological order by construction).
//! Each gate's output vector is computed lane-wise from its already solved
//! inputs. The witness is padded to `2^v` lanes; padding lanes see zero
//! imports. With the `parallel` feature the lane loop of every gate runs on
//! rayon (see [`crate::lanes::set_parallelism`]).

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use ark_ff::Zero;

use crate::circuit::{Circuit, ConstructionError, GateKind, Wire};
use crate::lanes;
use crate::F;

/// Which import could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    /// The circuit has no import gate at all.
    NoImports,
    /// This import wire has no values in the assignment.
    Wire(usize),
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingInput::NoImports => f.write_str("circuit has no import wires"),
            MissingInput::Wire(i) => write!(f, "import wire {i} is unbound"),
        }
    }
}

/// Data-binding mistakes detected before any proof is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// An import has no values, or there is nothing to import.
    #[error("missing assignment: {0}")]
    MissingAssignment(MissingInput),
    /// Bound vectors disagree on the number of lanes.
    #[error("lane count mismatch on wire {wire}: expected {expected}, got {got}")]
    LaneCountMismatch {
        /// Arena index of the offending wire.
        wire: usize,
        /// Lane count fixed by the circuit.
        expected: usize,
        /// Lane count found in the assignment.
        got: usize,
    },
    /// The assignment references a wire of another circuit.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Per-lane values bound to import wires.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    values: BTreeMap<Wire, Vec<F>>,
}

impl Assignment {
    /// Empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `values` (one per lane) to `wire`, replacing any earlier binding.
    pub fn bind(&mut self, wire: Wire, values: Vec<F>) -> &mut Self {
        self.values.insert(wire, values);
        self
    }

    /// Values bound to `wire`.
    pub fn get(&self, wire: Wire) -> Option<&[F]> {
        self.values.get(&wire).map(Vec::as_slice)
    }

    /// Number of bound wires.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound wires and their values, ordered by wire.
    pub fn iter(&self) -> impl Iterator<Item = (Wire, &[F])> {
        self.values.iter().map(|(w, v)| (*w, v.as_slice()))
    }
}

/// Every wire's lane values, padded to `2^num_vars` lanes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    lanes: usize,
    num_vars: usize,
    values: Vec<Vec<F>>,
}

impl Witness {
    /// Unpadded lane count.
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Hypercube dimension.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Padded lane vector of wire `index`.
    pub fn padded(&self, index: usize) -> &[F] {
        &self.values[index]
    }

    /// Unpadded lane vector of wire `index`.
    pub fn lanes_of(&self, index: usize) -> &[F] {
        &self.values[index][..self.lanes]
    }

    /// Number of wires.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the witness holds no wire.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluate `circuit` over `assignment`.
pub fn solve(circuit: &Circuit, assignment: &Assignment) -> Result<Witness, SolveError> {
    for (w, _) in assignment.iter() {
        circuit.check_wire(w)?;
    }
    if circuit.imports().next().is_none() {
        return Err(SolveError::MissingAssignment(MissingInput::NoImports));
    }

    let lanes = circuit.lanes();
    let num_vars = circuit.num_vars();
    let padded = 1usize << num_vars;

    let mut values: Vec<Vec<F>> = Vec::with_capacity(circuit.len());
    for (i, gate) in circuit.gates().iter().enumerate() {
        let out = match gate.kind {
            GateKind::Import => {
                let w = circuit.wire(i).ok_or(SolveError::MissingAssignment(MissingInput::Wire(i)))?;
                let bound = assignment.get(w).ok_or(SolveError::MissingAssignment(MissingInput::Wire(i)))?;
                if bound.len() != lanes {
                    return Err(SolveError::LaneCountMismatch { wire: i, expected: lanes, got: bound.len() });
                }
                lanes::pad_lanes(bound, padded, F::zero())
            }
            kind => {
                let inputs: Vec<&[F]> = gate.inputs.iter().map(|&j| values[j].as_slice()).collect();
                eval_lanes(kind, &inputs, padded)
            }
        };
        values.push(out);
    }

    tracing::debug!(
        wires = values.len(),
        lanes,
        padded,
        depth = circuit.depth(),
        "gkr witness solved"
    );
    Ok(Witness { lanes, num_vars, values })
}

fn eval_lanes(kind: GateKind, inputs: &[&[F]], padded: usize) -> Vec<F> {
    #[cfg(feature = "parallel")]
    if lanes::parallelism_enabled() {
        use rayon::prelude::*;
        let chunk = lanes::preferred_chunk_size(padded);
        return (0..padded)
            .into_par_iter()
            .with_min_len(chunk)
            .map(|l| eval_lane(kind, inputs, l))
            .collect();
    }
    (0..padded).map(|l| eval_lane(kind, inputs, l)).collect()
}

#[inline]
fn eval_lane(kind: GateKind, inputs: &[&[F]], lane: usize) -> F {
    match inputs {
        [a] => kind.eval(&[a[lane]]),
        [a, b] => kind.eval(&[a[lane], b[lane]]),
        _ => {
            let row: Vec<F> = inputs.iter().map(|col| col[lane]).collect();
            kind.eval(&row)
        }
    }
}
