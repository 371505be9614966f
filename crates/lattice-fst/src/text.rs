// AT&T text format for automata.
//
// Arc lines are `src dst ilabel olabel [weight]` (or `src dst label [weight]`
// for acceptors), final lines are `state [weight]`. Labels are numeric. The
// source state of the first line is the start state.

use std::io::{self, Write};

use crate::fst::{Arc, VectorFst};
use crate::semiring::Semiring;
use crate::{FstError, Label, StateId};

/// Whether lines carry one label (acceptor) or an input/output pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Acceptor,
    Transducer,
}

impl TextKind {
    fn label_fields(self) -> usize {
        match self {
            TextKind::Acceptor => 1,
            TextKind::Transducer => 2,
        }
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str, line: usize) -> Result<T, FstError> {
    field.parse().map_err(|_| FstError::Parse {
        line,
        message: format!("invalid {what} `{field}`"),
    })
}

fn parse_weight<W: Semiring>(field: Option<&str>, line: usize) -> Result<W, FstError> {
    match field {
        None => Ok(W::one()),
        Some(text) => text.parse().map_err(|e| FstError::Parse {
            line,
            message: format!("{e}"),
        }),
    }
}

/// State ids allowed beyond what the line count can name densely.
const STATE_SLACK: usize = 1024;

/// Parse an automaton from its text form.
///
/// State ids are allocated densely up to the largest id seen, so an id far
/// beyond the number of lines is rejected before anything is allocated.
pub fn parse_fst<W: Semiring>(text: &str, kind: TextKind) -> Result<VectorFst<W>, FstError> {
    let mut fst = VectorFst::new();
    let arc_fields = 2 + kind.label_fields();
    // Each line names at most two states.
    let max_states = 2 * text.lines().count() + STATE_SLACK;
    let state_field = |field: &str, line: usize| -> Result<StateId, FstError> {
        let state: StateId = parse_field(field, "state", line)?;
        if state as usize >= max_states {
            return Err(FstError::Parse {
                line,
                message: format!("state {state} out of range (at most {max_states} states)"),
            });
        }
        Ok(state)
    };

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or_default();
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        let src = state_field(fields[0], line)?;
        fst.reserve_state(src);
        if fst.start().is_none() {
            fst.set_start(src);
        }

        if fields.len() <= 2 {
            let weight = parse_weight::<W>(fields.get(1).copied(), line)?;
            fst.set_final(src, weight);
        } else if fields.len() == arc_fields || fields.len() == arc_fields + 1 {
            let dst = state_field(fields[1], line)?;
            let ilabel: Label = parse_field(fields[2], "label", line)?;
            let olabel: Label = match kind {
                TextKind::Acceptor => ilabel,
                TextKind::Transducer => parse_field(fields[3], "label", line)?,
            };
            let weight = parse_weight::<W>(fields.get(arc_fields).copied(), line)?;
            fst.reserve_state(dst);
            fst.add_arc(src, Arc::new(ilabel, olabel, weight, dst));
        } else {
            return Err(FstError::Parse {
                line,
                message: format!("unexpected number of fields ({})", fields.len()),
            });
        }
    }

    Ok(fst)
}

/// Write an automaton in text form, start state first.
///
/// Weights equal to `W::one()` are omitted.
pub fn write_fst<W: Semiring, O: Write + ?Sized>(
    fst: &VectorFst<W>,
    kind: TextKind,
    out: &mut O,
) -> io::Result<()> {
    let Some(start) = fst.start() else {
        return Ok(());
    };
    let order = std::iter::once(start).chain(fst.states().filter(|&s| s != start));
    for state in order {
        for arc in fst.arcs(state) {
            write!(out, "{state}\t{}\t{}", arc.nextstate, arc.ilabel)?;
            if kind == TextKind::Transducer {
                write!(out, "\t{}", arc.olabel)?;
            }
            if !arc.weight.is_one() {
                write!(out, "\t{}", arc.weight)?;
            }
            writeln!(out)?;
        }
        if fst.is_final(state) {
            let weight = fst.final_weight(state);
            if weight.is_one() {
                writeln!(out, "{state}")?;
            } else {
                writeln!(out, "{state}\t{weight}")?;
            }
        }
    }
    Ok(())
}

/// Convenience wrapper around [`write_fst`] producing a `String`.
pub fn fst_to_string<W: Semiring>(fst: &VectorFst<W>, kind: TextKind) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_fst(fst, kind, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorial::Left;
    use crate::fst::StdFst;
    use crate::lexicographic::LexicographicWeight;
    use crate::semiring::TropicalWeight;

    const LATTICE: &str = "\
# two tags for word 1
0\t1\t1\t10\t1
0\t1\t1\t11\t2.5
1\t2\t2\t12
2\t0.5
";

    #[test]
    fn parse_transducer() {
        let fst: StdFst = parse_fst(LATTICE, TextKind::Transducer).unwrap();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(fst.num_arcs(0), 2);
        assert_eq!(fst.arcs(0)[1].olabel, 11);
        assert_eq!(fst.arcs(0)[1].weight, TropicalWeight::new(2.5));
        assert_eq!(fst.arcs(1)[0].weight, TropicalWeight::new(0.0));
        assert_eq!(*fst.final_weight(2), TropicalWeight::new(0.5));
        assert!(!fst.is_final(0));
    }

    #[test]
    fn huge_state_id_is_rejected() {
        let err = parse_fst::<TropicalWeight>("0 4000000000 1 1\n", TextKind::Transducer)
            .unwrap_err();
        assert!(matches!(err, FstError::Parse { line: 1, .. }));
        let err = parse_fst::<TropicalWeight>("0 1 1 1\n4000000000\n", TextKind::Transducer)
            .unwrap_err();
        assert!(matches!(err, FstError::Parse { line: 2, .. }));
        // Sparse ids within reach still parse.
        let fst: StdFst = parse_fst("0 500 1 1\n500\n", TextKind::Transducer).unwrap();
        assert_eq!(fst.num_states(), 501);
    }

    #[test]
    fn start_is_first_source_state() {
        let fst: StdFst = parse_fst("3 1 5 5\n1\n", TextKind::Transducer).unwrap();
        assert_eq!(fst.start(), Some(3));
        assert_eq!(fst.num_states(), 4);
    }

    #[test]
    fn transducer_round_trip() {
        let fst: StdFst = parse_fst(LATTICE, TextKind::Transducer).unwrap();
        let text = fst_to_string(&fst, TextKind::Transducer);
        assert_eq!(text, "0\t1\t1\t10\t1\n0\t1\t1\t11\t2.5\n1\t2\t2\t12\n2\t0.5\n");
        let again: StdFst = parse_fst(&text, TextKind::Transducer).unwrap();
        assert_eq!(fst_to_string(&again, TextKind::Transducer), text);
    }

    #[test]
    fn acceptor_with_composite_weights() {
        let text = "0\t1\t4\t1,1\\2\n1\t0,Epsilon\n";
        let fst: VectorFst<LexicographicWeight<Left>> =
            parse_fst(text, TextKind::Acceptor).unwrap();
        assert_eq!(fst.arcs(0)[0].ilabel, 4);
        assert_eq!(fst.arcs(0)[0].olabel, 4);
        assert_eq!(fst.arcs(0)[0].weight.categorial().to_string(), "1\\2");
        assert_eq!(fst_to_string(&fst, TextKind::Acceptor), "0\t1\t4\t1,1\\2\n1\n");
    }

    #[test]
    fn reject_bad_lines() {
        for text in ["0 1 2\n", "0 x 1 1\n", "0 1 1 1 1 1\n", "0 1 1 1 abc\n"] {
            let err = parse_fst::<TropicalWeight>(text, TextKind::Transducer).unwrap_err();
            assert!(matches!(err, FstError::Parse { line: 1, .. }), "accepted {text:?}");
        }
    }

    #[test]
    fn empty_text_has_no_start() {
        let fst: StdFst = parse_fst("\n# nothing\n", TextKind::Transducer).unwrap();
        assert_eq!(fst.start(), None);
        assert_eq!(fst_to_string(&fst, TextKind::Transducer), "");
    }
}
