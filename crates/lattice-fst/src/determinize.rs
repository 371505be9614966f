// Weighted subset construction over an arbitrary divisible semiring.

use std::collections::{BTreeMap, VecDeque};

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::fst::{Arc, VectorFst};
use crate::semiring::{DELTA, DivideType, Semiring, SemiringError};
use crate::{FstError, Label, StateId};

/// Options for [`determinize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminizeOptions {
    /// Quantization step applied to residual weights before two subsets are
    /// compared.
    pub delta: f32,
}

impl Default for DeterminizeOptions {
    fn default() -> Self {
        Self { delta: DELTA }
    }
}

/// A determinized state: source states paired with the residual weight not
/// yet emitted on the way to them, sorted by source state.
pub type Subset<W> = Vec<(StateId, W)>;

/// Interns subsets as output state ids.
///
/// Two subsets are the same output state iff they have the same members
/// with the same (quantized) residuals.
pub struct SubsetTable<W: Semiring> {
    map: HashMap<Subset<W>, StateId>,
    /// Subset of each output state, indexed by state id.
    pub subsets: Vec<Subset<W>>,
}

impl<W: Semiring> Default for SubsetTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> SubsetTable<W> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            subsets: Vec::new(),
        }
    }

    /// Intern a subset. Returns its id and whether it was newly created.
    pub fn intern(&mut self, subset: Subset<W>) -> (StateId, bool) {
        if let Some(&id) = self.map.get(&subset) {
            return (id, false);
        }
        let id = self.subsets.len() as StateId;
        self.subsets.push(subset.clone());
        self.map.insert(subset, id);
        (id, true)
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }
}

fn violation(state: StateId, label: Option<Label>) -> impl FnOnce(SemiringError) -> FstError {
    move |err| match err {
        SemiringError::Violation { left, right } => FstError::SemiringViolation {
            state,
            label,
            left,
            right,
        },
        other => FstError::Semiring(other),
    }
}

/// Determinize an epsilon-free weighted acceptor.
///
/// Only input labels are read; output arcs carry `ilabel == olabel`. The
/// result has at most one arc per (state, label). Termination requires the
/// input to have finitely many reachable subsets.
///
/// A restricted semiring that cannot merge two weights aborts the whole run
/// with [`FstError::SemiringViolation`].
pub fn determinize<W: Semiring>(
    fst: &VectorFst<W>,
    opts: &DeterminizeOptions,
) -> Result<VectorFst<W>, FstError> {
    fst.check_epsilon_free()?;

    let mut out = VectorFst::new();
    let Some(start) = fst.start() else {
        return Ok(out);
    };

    let mut table = SubsetTable::new();
    let mut queue = VecDeque::new();
    let (initial, _) = table.intern(vec![(start, W::one())]);
    out.add_state();
    out.set_start(initial);
    queue.push_back(initial);

    while let Some(q) = queue.pop_front() {
        let subset = table.subsets[q as usize].clone();

        let mut final_weight = W::zero();
        for (state, residual) in &subset {
            if fst.is_final(*state) {
                let w = residual.times(fst.final_weight(*state));
                final_weight = final_weight.plus(&w).map_err(violation(q, None))?;
            }
        }
        out.set_final(q, final_weight);

        // label -> destination -> merged residual ⊗ arc weight
        let mut by_label: BTreeMap<Label, BTreeMap<StateId, W>> = BTreeMap::new();
        for (state, residual) in &subset {
            for arc in fst.arcs(*state) {
                let w = residual.times(&arc.weight);
                let targets = by_label.entry(arc.ilabel).or_default();
                match targets.get_mut(&arc.nextstate) {
                    Some(existing) => {
                        *existing = existing.plus(&w).map_err(violation(q, Some(arc.ilabel)))?;
                    }
                    None => {
                        targets.insert(arc.nextstate, w);
                    }
                }
            }
        }

        for (label, targets) in by_label {
            let mut total = W::zero();
            for w in targets.values() {
                total = total.plus(w).map_err(violation(q, Some(label)))?;
            }
            if total.is_zero() {
                continue;
            }

            let mut next: Subset<W> = Vec::with_capacity(targets.len());
            for (target, w) in targets {
                let residual = w.divide(&total, DivideType::Left)?;
                if residual.is_zero() {
                    continue;
                }
                next.push((target, residual.quantize(opts.delta)));
            }

            let (dest, created) = table.intern(next);
            if created {
                out.add_state();
                queue.push_back(dest);
                trace!(state = dest, size = table.subsets[dest as usize].len(), "new subset");
            }
            out.add_arc(q, Arc::new(label, label, total, dest));
        }
    }

    debug!(
        input_states = fst.num_states(),
        output_states = out.num_states(),
        output_arcs = out.total_arcs(),
        "determinized"
    );
    Ok(out)
}
