// Mutable weighted automaton with per-state arc lists.

use std::ops::Range;

use crate::semiring::{Semiring, TropicalWeight};
use crate::{EPSILON, FstError, Label, StateId};

/// A transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Self {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }
}

#[derive(Debug, Clone)]
struct State<W> {
    final_weight: W,
    arcs: Vec<Arc<W>>,
}

/// Which label an arc sort orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSortKey {
    Input,
    Output,
}

/// A weighted transducer stored as a vector of states.
///
/// States are dense ids starting at 0. A state is final iff its final
/// weight is not `W::zero()`.
#[derive(Debug, Clone)]
pub struct VectorFst<W: Semiring> {
    states: Vec<State<W>>,
    start: Option<StateId>,
}

/// Automaton over the tropical semiring, the exchange type of the pipeline.
pub type StdFst = VectorFst<TropicalWeight>;

/// One complete path through an acyclic automaton.
#[derive(Debug, Clone, PartialEq)]
pub struct Path<W> {
    /// Non-epsilon input labels along the path.
    pub ilabels: Vec<Label>,
    /// Non-epsilon output labels along the path.
    pub olabels: Vec<Label>,
    /// Product of the arc weights and the final weight.
    pub weight: W,
}

impl<W: Semiring> Default for VectorFst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> VectorFst<W> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            start: None,
        }
    }

    /// Add a non-final state without arcs and return its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(State {
            final_weight: W::zero(),
            arcs: Vec::new(),
        });
        id
    }

    /// Grow the state vector so that `state` is a valid id.
    pub fn reserve_state(&mut self, state: StateId) {
        while self.states.len() <= state as usize {
            self.add_state();
        }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> Range<StateId> {
        0..self.states.len() as StateId
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn set_start(&mut self, state: StateId) {
        debug_assert!((state as usize) < self.states.len());
        self.start = Some(state);
    }

    pub fn final_weight(&self, state: StateId) -> &W {
        &self.states[state as usize].final_weight
    }

    pub fn set_final(&mut self, state: StateId, weight: W) {
        self.states[state as usize].final_weight = weight;
    }

    pub fn is_final(&self, state: StateId) -> bool {
        !self.states[state as usize].final_weight.is_zero()
    }

    pub fn add_arc(&mut self, state: StateId, arc: Arc<W>) {
        debug_assert!((arc.nextstate as usize) < self.states.len());
        self.states[state as usize].arcs.push(arc);
    }

    pub fn arcs(&self, state: StateId) -> &[Arc<W>] {
        &self.states[state as usize].arcs
    }

    pub fn num_arcs(&self, state: StateId) -> usize {
        self.states[state as usize].arcs.len()
    }

    pub fn total_arcs(&self) -> usize {
        self.states.iter().map(|s| s.arcs.len()).sum()
    }

    /// Fails on the first state carrying an input-epsilon arc.
    pub fn check_epsilon_free(&self) -> Result<(), FstError> {
        for state in self.states() {
            if self.arcs(state).iter().any(|a| a.ilabel == EPSILON) {
                return Err(FstError::NotEpsilonFree { state });
            }
        }
        Ok(())
    }

    /// Whether every state's arcs are sorted by the given label.
    pub fn is_arc_sorted(&self, key: ArcSortKey) -> bool {
        self.states.iter().all(|s| match key {
            ArcSortKey::Input => s.arcs.is_sorted_by_key(|a| a.ilabel),
            ArcSortKey::Output => s.arcs.is_sorted_by_key(|a| a.olabel),
        })
    }

    /// Stable sort of every state's arcs by the given label.
    pub fn arc_sort(&mut self, key: ArcSortKey) {
        for state in &mut self.states {
            match key {
                ArcSortKey::Input => state.arcs.sort_by_key(|a| a.ilabel),
                ArcSortKey::Output => state.arcs.sort_by_key(|a| a.olabel),
            }
        }
    }

    /// Remove states that are not on some path from the start state to a
    /// final state, renumbering the survivors in their original order.
    pub fn connect(&mut self) {
        let Some(start) = self.start else {
            self.states.clear();
            return;
        };
        let n = self.states.len();

        let mut accessible = vec![false; n];
        let mut stack = vec![start];
        accessible[start as usize] = true;
        while let Some(s) = stack.pop() {
            for arc in &self.states[s as usize].arcs {
                if !accessible[arc.nextstate as usize] {
                    accessible[arc.nextstate as usize] = true;
                    stack.push(arc.nextstate);
                }
            }
        }

        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (s, state) in self.states.iter().enumerate() {
            for arc in &state.arcs {
                reverse[arc.nextstate as usize].push(s as StateId);
            }
        }
        let mut coaccessible = vec![false; n];
        let mut stack: Vec<StateId> = self
            .states()
            .filter(|&s| self.is_final(s))
            .collect();
        for &s in &stack {
            coaccessible[s as usize] = true;
        }
        while let Some(s) = stack.pop() {
            for &p in &reverse[s as usize] {
                if !coaccessible[p as usize] {
                    coaccessible[p as usize] = true;
                    stack.push(p);
                }
            }
        }

        let mut new_id: Vec<Option<StateId>> = vec![None; n];
        let mut next: StateId = 0;
        for s in 0..n {
            if accessible[s] && coaccessible[s] {
                new_id[s] = Some(next);
                next += 1;
            }
        }
        if new_id[start as usize].is_none() {
            self.states.clear();
            self.start = None;
            return;
        }

        let old = std::mem::take(&mut self.states);
        for (s, mut state) in old.into_iter().enumerate() {
            if new_id[s].is_none() {
                continue;
            }
            state.arcs.retain_mut(|arc| match new_id[arc.nextstate as usize] {
                Some(id) => {
                    arc.nextstate = id;
                    true
                }
                None => false,
            });
            self.states.push(state);
        }
        self.start = new_id[start as usize];
    }

    /// Enumerate every successful path. Fails on cyclic automata.
    pub fn paths(&self) -> Result<Vec<Path<W>>, FstError> {
        let mut out = Vec::new();
        let Some(start) = self.start else {
            return Ok(out);
        };
        let mut on_stack = vec![false; self.states.len()];
        let mut prefix = Path {
            ilabels: Vec::new(),
            olabels: Vec::new(),
            weight: W::one(),
        };
        self.collect_paths(start, &mut prefix, &mut on_stack, &mut out)?;
        Ok(out)
    }

    fn collect_paths(
        &self,
        state: StateId,
        prefix: &mut Path<W>,
        on_stack: &mut [bool],
        out: &mut Vec<Path<W>>,
    ) -> Result<(), FstError> {
        if on_stack[state as usize] {
            return Err(FstError::Cyclic { state });
        }
        on_stack[state as usize] = true;

        if self.is_final(state) {
            out.push(Path {
                ilabels: prefix.ilabels.clone(),
                olabels: prefix.olabels.clone(),
                weight: prefix.weight.times(self.final_weight(state)),
            });
        }
        for arc in self.arcs(state) {
            let saved = prefix.weight.clone();
            if arc.ilabel != EPSILON {
                prefix.ilabels.push(arc.ilabel);
            }
            if arc.olabel != EPSILON {
                prefix.olabels.push(arc.olabel);
            }
            prefix.weight = saved.times(&arc.weight);
            self.collect_paths(arc.nextstate, prefix, on_stack, out)?;
            if arc.olabel != EPSILON {
                prefix.olabels.pop();
            }
            if arc.ilabel != EPSILON {
                prefix.ilabels.pop();
            }
            prefix.weight = saved;
        }

        on_stack[state as usize] = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: f32) -> TropicalWeight {
        TropicalWeight::new(v)
    }

    /// 0 -a/1-> 1 -b/2-> 2(final), plus a dead end 0 -c-> 3 and an
    /// unreachable state 4 -> 2.
    fn build_with_dead_states() -> StdFst {
        let mut fst = StdFst::new();
        for _ in 0..5 {
            fst.add_state();
        }
        fst.set_start(0);
        fst.add_arc(0, Arc::new(1, 1, w(1.0), 1));
        fst.add_arc(0, Arc::new(3, 3, w(0.0), 3));
        fst.add_arc(1, Arc::new(2, 2, w(2.0), 2));
        fst.add_arc(4, Arc::new(5, 5, w(0.0), 2));
        fst.set_final(2, w(0.5));
        fst
    }

    #[test]
    fn new_states_are_not_final() {
        let mut fst = StdFst::new();
        let s = fst.add_state();
        assert!(!fst.is_final(s));
        fst.set_final(s, TropicalWeight::one());
        assert!(fst.is_final(s));
    }

    #[test]
    fn epsilon_check_reports_state() {
        let mut fst = StdFst::new();
        fst.add_state();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(4, 4, w(0.0), 1));
        assert!(fst.check_epsilon_free().is_ok());
        fst.add_arc(1, Arc::new(EPSILON, 7, w(0.0), 0));
        let err = fst.check_epsilon_free().unwrap_err();
        assert!(matches!(err, FstError::NotEpsilonFree { state: 1 }));
    }

    #[test]
    fn output_epsilons_are_allowed() {
        let mut fst = StdFst::new();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(4, EPSILON, w(0.0), 0));
        assert!(fst.check_epsilon_free().is_ok());
    }

    #[test]
    fn arc_sort_by_input_and_output() {
        let mut fst = StdFst::new();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(3, 1, w(0.0), 0));
        fst.add_arc(0, Arc::new(1, 3, w(0.0), 0));
        fst.add_arc(0, Arc::new(2, 2, w(0.0), 0));
        assert!(!fst.is_arc_sorted(ArcSortKey::Input));

        fst.arc_sort(ArcSortKey::Input);
        let ilabels: Vec<Label> = fst.arcs(0).iter().map(|a| a.ilabel).collect();
        assert_eq!(ilabels, vec![1, 2, 3]);
        assert!(fst.is_arc_sorted(ArcSortKey::Input));

        fst.arc_sort(ArcSortKey::Output);
        let olabels: Vec<Label> = fst.arcs(0).iter().map(|a| a.olabel).collect();
        assert_eq!(olabels, vec![1, 2, 3]);
    }

    #[test]
    fn connect_removes_dead_and_unreachable_states() {
        let mut fst = build_with_dead_states();
        fst.connect();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(fst.num_arcs(0), 1);
        assert_eq!(fst.arcs(0)[0].nextstate, 1);
        assert_eq!(fst.arcs(1)[0].nextstate, 2);
        assert_eq!(*fst.final_weight(2), w(0.5));
    }

    #[test]
    fn connect_without_final_states_empties() {
        let mut fst = StdFst::new();
        fst.add_state();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(1, 1, w(0.0), 1));
        fst.connect();
        assert_eq!(fst.num_states(), 0);
        assert_eq!(fst.start(), None);
    }

    #[test]
    fn paths_of_acyclic_automaton() {
        let fst = build_with_dead_states();
        let paths = fst.paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].ilabels, vec![1, 2]);
        assert_eq!(paths[0].olabels, vec![1, 2]);
        assert_eq!(paths[0].weight, w(3.5));
    }

    #[test]
    fn paths_reject_cycles() {
        let mut fst = StdFst::new();
        fst.add_state();
        fst.set_start(0);
        fst.set_final(0, TropicalWeight::one());
        fst.add_arc(0, Arc::new(1, 1, w(1.0), 0));
        assert!(matches!(fst.paths(), Err(FstError::Cyclic { state: 0 })));
    }
}
