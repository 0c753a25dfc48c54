//! GKR circuit builder
//!
//! The circuit is an **append-only arena** of gates. A [`Wire`] is an index
//! into that arena tagged with the id of the builder that created it, so:
//!
//! - a gate can only reference wires created before it (the arena order is a
//!   topological order and the graph is acyclic by construction);
//! - handing a wire to the wrong builder is detected
//!   ([`ConstructionError::ForeignWire`]).
//!
//! Building performs no field arithmetic. Values handed to
//! [`Builder::import`] are only *staged* into an [`Assignment`]; evaluation
//! happens later, in [`crate::solver::solve`], over the frozen [`Circuit`].
//!
//! Every gate acts lane-wise: gate `g` with inputs `a, b` computes
//! `g(a[l], b[l])` independently for each lane `l`.

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ark_ff::Zero;

use crate::hash::FieldHasher;
use crate::lanes;
use crate::solver::Assignment;
use crate::F;

static NEXT_CIRCUIT_ID: AtomicU64 = AtomicU64::new(1);

/// Version tag mixed into the circuit configuration digest.
const DIGEST_VERSION: u64 = 1;

/// Identity of one builder / frozen circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CircuitId(u64);

/// Handle to a gate output. Holds no value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wire {
    circuit: CircuitId,
    index: usize,
}

impl Wire {
    /// Position of the producing gate in the arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Circuit this wire belongs to.
    #[inline]
    pub fn circuit(&self) -> CircuitId {
        self.circuit
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}@c{}", self.index, self.circuit.0)
    }
}

/// Gate operators.
///
/// All gates are pure and lane-wise. Extending the set means adding a variant
/// and filling in [`arity`](GateKind::arity), [`degree`](GateKind::degree),
/// [`eval`](GateKind::eval) and [`tag`](GateKind::tag).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// External input, bound at solve time.
    Import,
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a · b`
    Mul,
    /// `a`
    Identity,
}

impl GateKind {
    /// Number of input wires.
    pub fn arity(&self) -> usize {
        match self {
            GateKind::Import => 0,
            GateKind::Identity => 1,
            GateKind::Add | GateKind::Sub | GateKind::Mul => 2,
        }
    }

    /// Total degree of the gate polynomial in its inputs.
    pub fn degree(&self) -> usize {
        match self {
            GateKind::Mul => 2,
            GateKind::Import | GateKind::Add | GateKind::Sub | GateKind::Identity => 1,
        }
    }

    /// Evaluate on one lane's input values (`inputs.len() == arity`).
    ///
    /// Import gates have no algebraic definition and evaluate to zero; the
    /// solver reads their values from the assignment instead.
    #[inline]
    pub fn eval(&self, inputs: &[F]) -> F {
        match self {
            GateKind::Import => F::zero(),
            GateKind::Add => inputs[0] + inputs[1],
            GateKind::Sub => inputs[0] - inputs[1],
            GateKind::Mul => inputs[0] * inputs[1],
            GateKind::Identity => inputs[0],
        }
    }

    /// Stable numeric tag used by the configuration digest.
    pub fn tag(&self) -> u64 {
        match self {
            GateKind::Import => 0,
            GateKind::Add => 1,
            GateKind::Sub => 2,
            GateKind::Mul => 3,
            GateKind::Identity => 4,
        }
    }

    /// Short lowercase name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Import => "import",
            GateKind::Add => "add",
            GateKind::Sub => "sub",
            GateKind::Mul => "mul",
            GateKind::Identity => "identity",
        }
    }
}

/// One arena node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    /// Operator.
    pub kind: GateKind,
    /// Arena indices of the input wires, all smaller than this gate's index.
    pub inputs: Vec<usize>,
}

/// Caller misuse while building a circuit or addressing its wires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// Wrong number of lanes on import, or wrong number of gate inputs.
    #[error("arity mismatch: expected {expected}, got {got}")]
    ArityMismatch {
        /// Lanes (or inputs) required.
        expected: usize,
        /// Lanes (or inputs) supplied.
        got: usize,
    },
    /// The wire was created by a different builder.
    #[error("wire {0} belongs to a different circuit")]
    ForeignWire(Wire),
    /// The builder has been frozen.
    #[error("circuit is frozen; no further gates can be added")]
    CircuitFrozen,
    /// Import gates are created with `import`, not `gate`.
    #[error("import gates must be created with `import`")]
    ImportViaGate,
    /// Export was requested for a wire that is not an output.
    #[error("wire {0} is not an output of the circuit")]
    NotAnOutput(Wire),
}

/// Frozen gate graph.
#[derive(Clone, Debug)]
pub struct Circuit {
    id: CircuitId,
    gates: Vec<Gate>,
    lanes: usize,
    outputs: Vec<usize>,
    is_output: Vec<bool>,
    layer: Vec<usize>,
}

impl Circuit {
    /// Identity shared with every wire of this circuit.
    pub fn id(&self) -> CircuitId {
        self.id
    }

    /// Lane count fixed by the imports (zero if nothing was imported).
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Hypercube dimension `v` with `2^v ≥ lanes`.
    pub fn num_vars(&self) -> usize {
        lanes::num_vars_for(self.lanes)
    }

    /// Gates in arena (topological) order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of wires.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the circuit has no gates at all.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Output wire indices, ascending.
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Whether wire `index` is an output.
    pub fn is_output(&self, index: usize) -> bool {
        self.is_output.get(index).copied().unwrap_or(false)
    }

    /// Import wire indices, ascending.
    pub fn imports(&self) -> impl Iterator<Item = usize> + '_ {
        self.gates.iter().enumerate().filter(|(_, g)| g.kind == GateKind::Import).map(|(i, _)| i)
    }

    /// Longest path (in gates) from an import to wire `index`; imports are layer 0.
    pub fn layer_of(&self, index: usize) -> usize {
        self.layer[index]
    }

    /// Number of layers above the imports.
    pub fn depth(&self) -> usize {
        self.layer.iter().copied().max().unwrap_or(0)
    }

    /// Handle for arena index `index`.
    pub fn wire(&self, index: usize) -> Option<Wire> {
        (index < self.gates.len()).then_some(Wire { circuit: self.id, index })
    }

    /// Resolve a handle to its arena index, rejecting foreign wires.
    pub fn check_wire(&self, w: Wire) -> Result<usize, ConstructionError> {
        if w.circuit != self.id || w.index >= self.gates.len() {
            return Err(ConstructionError::ForeignWire(w));
        }
        Ok(w.index)
    }

    /// Per-wire values of a single lane whose imports are all zero.
    ///
    /// Padding lanes (beyond `lanes` up to `2^v`) carry exactly these values,
    /// which lets a verifier reconstruct padded output vectors on its own.
    pub fn padding_lane(&self) -> Vec<F> {
        let mut vals: Vec<F> = Vec::with_capacity(self.gates.len());
        let mut scratch = Vec::with_capacity(2);
        for g in &self.gates {
            scratch.clear();
            scratch.extend(g.inputs.iter().map(|&i| vals[i]));
            vals.push(g.kind.eval(&scratch));
        }
        vals
    }

    /// Configuration digest over lanes, gate kinds, gate inputs and outputs.
    pub fn digest(&self, hasher: &mut dyn FieldHasher) -> F {
        hasher.reset();
        hasher.write(&[
            F::from(DIGEST_VERSION),
            F::from(self.lanes as u64),
            F::from(self.gates.len() as u64),
        ]);
        let mut row = Vec::with_capacity(3);
        for g in &self.gates {
            row.clear();
            row.push(F::from(g.kind.tag()));
            row.extend(g.inputs.iter().map(|&i| F::from(i as u64)));
            hasher.write(&row);
        }
        hasher.write(&[F::from(self.outputs.len() as u64)]);
        let outs: Vec<F> = self.outputs.iter().map(|&i| F::from(i as u64)).collect();
        hasher.write(&outs);
        hasher.sum()
    }
}

/// Incremental circuit construction.
pub struct Builder {
    id: CircuitId,
    gates: Vec<Gate>,
    lanes: Option<usize>,
    marked: Vec<bool>,
    frozen: bool,
    assignment: Assignment,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Empty builder with a fresh circuit id.
    pub fn new() -> Self {
        let id = CircuitId(NEXT_CIRCUIT_ID.fetch_add(1, Ordering::Relaxed));
        Self { id, gates: Vec::new(), lanes: None, marked: Vec::new(), frozen: false, assignment: Assignment::new() }
    }

    /// Identity carried by every wire of this builder.
    pub fn id(&self) -> CircuitId {
        self.id
    }

    /// Number of wires created so far.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether no wire has been created yet.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Lane count fixed by the first import, if any.
    pub fn lanes(&self) -> Option<usize> {
        self.lanes
    }

    /// Values staged by [`import`](Self::import).
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Create an Import gate whose lanes are `values`.
    pub fn import<I>(&mut self, values: I) -> Result<Wire, ConstructionError>
    where
        I: IntoIterator,
        I::Item: Into<F>,
    {
        self.ensure_open()?;
        let values: Vec<F> = values.into_iter().map(Into::into).collect();
        let expected = self.lanes.unwrap_or(values.len().max(1));
        if values.is_empty() || values.len() != expected {
            return Err(ConstructionError::ArityMismatch { expected, got: values.len() });
        }
        self.lanes = Some(expected);
        let w = self.push(GateKind::Import, Vec::new());
        self.assignment.bind(w, values);
        Ok(w)
    }

    /// Import several columns; wires are returned in column order.
    pub fn import_many<C, I>(&mut self, columns: C) -> Result<Vec<Wire>, ConstructionError>
    where
        C: IntoIterator<Item = I>,
        I: IntoIterator,
        I::Item: Into<F>,
    {
        columns.into_iter().map(|c| self.import(c)).collect()
    }

    /// `a + b`
    pub fn add(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.gate(GateKind::Add, &[a, b])
    }

    /// `a - b`
    pub fn sub(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.gate(GateKind::Sub, &[a, b])
    }

    /// `a · b`
    pub fn mul(&mut self, a: Wire, b: Wire) -> Result<Wire, ConstructionError> {
        self.gate(GateKind::Mul, &[a, b])
    }

    /// Copy of `a`.
    pub fn identity(&mut self, a: Wire) -> Result<Wire, ConstructionError> {
        self.gate(GateKind::Identity, &[a])
    }

    /// Generic non-import gate.
    pub fn gate(&mut self, kind: GateKind, inputs: &[Wire]) -> Result<Wire, ConstructionError> {
        self.ensure_open()?;
        if kind == GateKind::Import {
            return Err(ConstructionError::ImportViaGate);
        }
        if inputs.len() != kind.arity() {
            return Err(ConstructionError::ArityMismatch { expected: kind.arity(), got: inputs.len() });
        }
        let idx = inputs.iter().map(|&w| self.check_wire(w)).collect::<Result<Vec<_>, _>>()?;
        Ok(self.push(kind, idx))
    }

    /// Declare `w` an output even if other gates consume it.
    pub fn mark_output(&mut self, w: Wire) -> Result<(), ConstructionError> {
        self.ensure_open()?;
        let i = self.check_wire(w)?;
        self.marked[i] = true;
        Ok(())
    }

    /// Finalize the graph. Later mutations (and a second freeze) fail with
    /// [`ConstructionError::CircuitFrozen`].
    pub fn freeze(&mut self) -> Result<Arc<Circuit>, ConstructionError> {
        self.ensure_open()?;
        self.frozen = true;

        let n = self.gates.len();
        let mut consumed = vec![false; n];
        let mut layer = vec![0usize; n];
        for (i, g) in self.gates.iter().enumerate() {
            for &j in &g.inputs {
                consumed[j] = true;
                layer[i] = layer[i].max(layer[j] + 1);
            }
        }
        let is_output: Vec<bool> = (0..n).map(|i| !consumed[i] || self.marked[i]).collect();
        let outputs: Vec<usize> = (0..n).filter(|&i| is_output[i]).collect();

        let circuit = Circuit {
            id: self.id,
            gates: self.gates.clone(),
            lanes: self.lanes.unwrap_or(0),
            outputs,
            is_output,
            layer,
        };
        tracing::debug!(
            gates = circuit.len(),
            lanes = circuit.lanes(),
            depth = circuit.depth(),
            outputs = circuit.outputs().len(),
            "gkr circuit frozen"
        );
        Ok(Arc::new(circuit))
    }

    fn ensure_open(&self) -> Result<(), ConstructionError> {
        if self.frozen {
            Err(ConstructionError::CircuitFrozen)
        } else {
            Ok(())
        }
    }

    fn check_wire(&self, w: Wire) -> Result<usize, ConstructionError> {
        if w.circuit != self.id || w.index >= self.gates.len() {
            return Err(ConstructionError::ForeignWire(w));
        }
        Ok(w.index)
    }

    fn push(&mut self, kind: GateKind, inputs: Vec<usize>) -> Wire {
        let index = self.gates.len();
        self.gates.push(Gate { kind, inputs });
        self.marked.push(false);
        Wire { circuit: self.id, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashRegistry, BLAKE3};

    #[test]
    fn gates_reference_earlier_wires_only() {
        let mut b = Builder::new();
        let x = b.import([1u64, 2]).unwrap();
        let y = b.import([3u64, 4]).unwrap();
        let z = b.add(x, y).unwrap();
        let w = b.mul(z, x).unwrap();
        assert_eq!((x.index(), y.index(), z.index(), w.index()), (0, 1, 2, 3));

        let c = b.freeze().unwrap();
        assert_eq!(c.gates()[3], Gate { kind: GateKind::Mul, inputs: vec![2, 0] });
        assert_eq!(c.outputs(), &[3]);
        assert_eq!(c.depth(), 2);
        assert_eq!(c.layer_of(z.index()), 1);
        assert_eq!(c.imports().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn import_lane_counts_must_agree() {
        let mut b = Builder::new();
        assert_eq!(
            b.import(Vec::<F>::new()).unwrap_err(),
            ConstructionError::ArityMismatch { expected: 1, got: 0 }
        );
        b.import([1u64, 2, 3]).unwrap();
        assert_eq!(b.import([1u64, 2]).unwrap_err(), ConstructionError::ArityMismatch { expected: 3, got: 2 });
        assert_eq!(b.lanes(), Some(3));
    }

    #[test]
    fn foreign_wires_are_rejected() {
        let mut a = Builder::new();
        let mut b = Builder::new();
        let xa = a.import([1u64]).unwrap();
        let xb = b.import([1u64]).unwrap();
        assert_eq!(b.add(xa, xb).unwrap_err(), ConstructionError::ForeignWire(xa));
        assert_eq!(b.mark_output(xa).unwrap_err(), ConstructionError::ForeignWire(xa));
    }

    #[test]
    fn frozen_builder_refuses_growth() {
        let mut b = Builder::new();
        let x = b.import([5u64]).unwrap();
        b.freeze().unwrap();
        assert_eq!(b.add(x, x).unwrap_err(), ConstructionError::CircuitFrozen);
        assert_eq!(b.import([1u64]).unwrap_err(), ConstructionError::CircuitFrozen);
        assert_eq!(b.freeze().unwrap_err(), ConstructionError::CircuitFrozen);
    }

    #[test]
    fn gate_arity_and_import_via_gate() {
        let mut b = Builder::new();
        let x = b.import([5u64]).unwrap();
        assert_eq!(
            b.gate(GateKind::Mul, &[x]).unwrap_err(),
            ConstructionError::ArityMismatch { expected: 2, got: 1 }
        );
        assert_eq!(b.gate(GateKind::Import, &[]).unwrap_err(), ConstructionError::ImportViaGate);
    }

    #[test]
    fn marked_and_sink_wires_are_outputs() {
        let mut b = Builder::new();
        let x = b.import([1u64, 2]).unwrap();
        let y = b.import([3u64, 4]).unwrap();
        let s = b.add(x, y).unwrap();
        let _p = b.mul(s, y).unwrap();
        let _q = b.identity(s).unwrap();
        b.mark_output(s).unwrap();
        let c = b.freeze().unwrap();
        assert_eq!(c.outputs(), &[2, 3, 4]);
        assert!(c.is_output(2));
        assert!(!c.is_output(0));
    }

    #[test]
    fn padding_lane_follows_gate_semantics() {
        let mut b = Builder::new();
        let x = b.import([1u64]).unwrap();
        let y = b.sub(x, x).unwrap();
        let _ = b.mul(y, x).unwrap();
        let c = b.freeze().unwrap();
        assert!(c.padding_lane().iter().all(|v| v.is_zero()));
    }

    #[test]
    fn digest_tracks_structure() {
        let reg = HashRegistry::with_defaults();
        let hb = reg.resolve(BLAKE3).unwrap();

        let build = |mul: bool| {
            let mut b = Builder::new();
            let x = b.import([1u64, 2]).unwrap();
            let y = b.import([3u64, 4]).unwrap();
            if mul { b.mul(x, y).unwrap() } else { b.add(x, y).unwrap() };
            b.freeze().unwrap()
        };
        let d_add = build(false).digest(hb.field_hasher().as_mut());
        let d_add2 = build(false).digest(hb.field_hasher().as_mut());
        let d_mul = build(true).digest(hb.field_hasher().as_mut());
        assert_eq!(d_add, d_add2);
        assert_ne!(d_add, d_mul);
    }
}
