// Composition of tropical transducers with epsilons on either side.

use std::collections::VecDeque;

use hashbrown::HashMap;
use tracing::debug;

use crate::fst::{Arc, ArcSortKey, StdFst};
use crate::semiring::{Semiring, TropicalWeight};
use crate::{EPSILON, FstError, Label, StateId};

/// Epsilon filter state.
///
/// After the right operand has moved alone on an input epsilon, the left
/// operand may not move alone on an output epsilon until both have matched
/// a real label. This keeps exactly one interleaving of epsilon moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Filter {
    Open,
    RightMoved,
}

type Triple = (StateId, StateId, Filter);

/// Arcs of an input-sorted state carrying `label` on the input side.
fn arcs_with_input(fst: &StdFst, state: StateId, label: Label) -> &[Arc<TropicalWeight>] {
    let arcs = fst.arcs(state);
    let lo = arcs.partition_point(|arc| arc.ilabel < label);
    let hi = arcs.partition_point(|arc| arc.ilabel <= label);
    &arcs[lo..hi]
}

struct Builder<'a> {
    left: &'a StdFst,
    right: &'a StdFst,
    out: StdFst,
    ids: HashMap<Triple, StateId>,
    queue: VecDeque<Triple>,
}

impl Builder<'_> {
    fn state(&mut self, triple: Triple) -> StateId {
        if let Some(&id) = self.ids.get(&triple) {
            return id;
        }
        let id = self.out.add_state();
        let (a, b, _) = triple;
        if self.left.is_final(a) && self.right.is_final(b) {
            let weight = self.left.final_weight(a).times(self.right.final_weight(b));
            self.out.set_final(id, weight);
        }
        self.ids.insert(triple, id);
        self.queue.push_back(triple);
        id
    }

    fn expand(&mut self, triple: Triple) {
        let (a, b, filter) = triple;
        let from = self.ids[&triple];
        let (left, right) = (self.left, self.right);

        for la in left.arcs(a) {
            if la.olabel == EPSILON {
                if filter == Filter::Open {
                    let to = self.state((la.nextstate, b, Filter::Open));
                    self.out
                        .add_arc(from, Arc::new(la.ilabel, EPSILON, la.weight, to));
                }
                continue;
            }
            for rb in arcs_with_input(right, b, la.olabel) {
                let to = self.state((la.nextstate, rb.nextstate, Filter::Open));
                let weight = la.weight.times(&rb.weight);
                self.out
                    .add_arc(from, Arc::new(la.ilabel, rb.olabel, weight, to));
            }
        }

        for rb in arcs_with_input(right, b, EPSILON) {
            let to = self.state((a, rb.nextstate, Filter::RightMoved));
            self.out
                .add_arc(from, Arc::new(EPSILON, rb.olabel, rb.weight, to));
        }
    }
}

/// Compose `left` with `right`, matching `left` output labels against
/// `right` input labels.
///
/// `right` must be sorted by input label. The result keeps only states on
/// a successful path.
pub fn compose(left: &StdFst, right: &StdFst) -> Result<StdFst, FstError> {
    if !right.is_arc_sorted(ArcSortKey::Input) {
        return Err(FstError::NotArcSorted);
    }
    let (Some(sa), Some(sb)) = (left.start(), right.start()) else {
        return Ok(StdFst::new());
    };

    let mut builder = Builder {
        left,
        right,
        out: StdFst::new(),
        ids: HashMap::new(),
        queue: VecDeque::new(),
    };
    let start = builder.state((sa, sb, Filter::Open));
    builder.out.set_start(start);
    while let Some(triple) = builder.queue.pop_front() {
        builder.expand(triple);
    }

    let mut out = builder.out;
    let explored = out.num_states();
    out.connect();
    debug!(explored, states = out.num_states(), "composed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: f32) -> TropicalWeight {
        TropicalWeight::new(v)
    }

    fn chain(arcs: &[(Label, Label, f32)], final_weight: f32) -> StdFst {
        let mut fst = StdFst::new();
        let mut prev = fst.add_state();
        fst.set_start(prev);
        for &(i, o, w) in arcs {
            let next = fst.add_state();
            fst.add_arc(prev, Arc::new(i, o, t(w), next));
            prev = next;
        }
        fst.set_final(prev, t(final_weight));
        fst
    }

    #[test]
    fn matches_labels_and_multiplies_weights() {
        let a = chain(&[(1, 2, 1.0)], 0.0);
        let b = chain(&[(2, 3, 2.0)], 0.5);
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.num_states(), 2);
        assert_eq!(c.arcs(0), &[Arc::new(1, 3, t(3.0), 1)]);
        assert_eq!(*c.final_weight(1), t(0.5));
    }

    #[test]
    fn epsilons_on_both_sides_yield_one_path() {
        let a = chain(&[(1, EPSILON, 1.0), (2, 5, 0.0)], 0.0);
        let b = chain(&[(EPSILON, 7, 0.0), (5, 8, 0.0)], 0.0);
        let c = compose(&a, &b).unwrap();
        let paths = c.paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].ilabels, vec![1, 2]);
        assert_eq!(paths[0].olabels, vec![7, 8]);
        assert_eq!(paths[0].weight, t(1.0));
    }

    #[test]
    fn trailing_right_epsilon_reaches_final() {
        let a = chain(&[(1, 4, 0.0)], 0.0);
        let b = chain(&[(4, 6, 0.0), (EPSILON, 9, 2.0)], 0.0);
        let c = compose(&a, &b).unwrap();
        let paths = c.paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].olabels, vec![6, 9]);
        assert_eq!(paths[0].weight, t(2.0));
    }

    #[test]
    fn unsorted_right_operand_is_rejected() {
        let a = chain(&[(1, 2, 0.0)], 0.0);
        let mut b = StdFst::new();
        b.add_state();
        b.set_start(0);
        b.set_final(0, t(0.0));
        b.add_arc(0, Arc::new(3, 3, t(0.0), 0));
        b.add_arc(0, Arc::new(2, 2, t(0.0), 0));
        assert!(matches!(compose(&a, &b), Err(FstError::NotArcSorted)));
        b.arc_sort(ArcSortKey::Input);
        assert!(compose(&a, &b).is_ok());
    }

    #[test]
    fn no_common_path_gives_empty_result() {
        let a = chain(&[(1, 2, 0.0)], 0.0);
        let b = chain(&[(3, 3, 0.0)], 0.0);
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.num_states(), 0);
        assert_eq!(c.start(), None);
    }
}
