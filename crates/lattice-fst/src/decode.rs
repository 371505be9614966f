// Conversions between tagged lattices and composite-weight acceptors, and the
// decoder transducer that maps interned composite labels back to tags.

use tracing::debug;

use crate::categorial::{CategorialKind, CategorialWeight, SEPARATOR};
use crate::fst::{Arc, StdFst, VectorFst};
use crate::lexicographic::LexicographicWeight;
use crate::semiring::{Semiring, TropicalWeight};
use crate::symbols::SymbolTable;
use crate::{EPSILON, FstError, Label, StateId};

/// Name given to the symbol table built by [`encode_labels`].
pub const SYMBOL_TABLE_NAME: &str = "categorial";

const DIVIDER: char = '\\';
const LEFT_BRACKET: char = '<';
const RIGHT_BRACKET: char = '>';
const EPSILON_TEXT: &str = "Epsilon";

/// Fold every output label into the weight.
///
/// The result is an acceptor over the input labels. Arc weights become
/// `(cost, [olabel])` and final weights `(cost, One)`.
pub fn lift<K: CategorialKind>(fst: &StdFst) -> VectorFst<LexicographicWeight<K>> {
    let mut out = VectorFst::new();
    for _ in fst.states() {
        out.add_state();
    }
    if let Some(start) = fst.start() {
        out.set_start(start);
    }
    for state in fst.states() {
        if fst.is_final(state) {
            out.set_final(
                state,
                LexicographicWeight::new(*fst.final_weight(state), CategorialWeight::one()),
            );
        }
        for arc in fst.arcs(state) {
            out.add_arc(
                state,
                Arc::new(
                    arc.ilabel,
                    arc.ilabel,
                    LexicographicWeight::from_arc(arc.weight, arc.olabel),
                    arc.nextstate,
                ),
            );
        }
    }
    out
}

fn intern<K: CategorialKind>(
    symbols: &mut SymbolTable,
    categorial: &CategorialWeight<K>,
) -> Label {
    if categorial.is_one() {
        EPSILON
    } else {
        symbols.add_symbol(&categorial.to_string())
    }
}

fn check_member<K: CategorialKind>(
    state: StateId,
    weight: &LexicographicWeight<K>,
) -> Result<(), FstError> {
    if weight.is_member() {
        Ok(())
    } else {
        Err(FstError::DivisionUndefined {
            state,
            weight: weight.to_string(),
        })
    }
}

/// Replace each composite weight by its cost and an output label naming its
/// categorial part.
///
/// Categorial parts are rendered and interned in a fresh symbol table; `One`
/// becomes epsilon. A final weight with a categorial residual is emitted as
/// an epsilon-input arc into a shared super-final state so the residual
/// reaches the output.
pub fn encode_labels<K: CategorialKind>(
    fst: &VectorFst<LexicographicWeight<K>>,
) -> Result<(StdFst, SymbolTable), FstError> {
    let mut symbols = SymbolTable::new(SYMBOL_TABLE_NAME);
    let mut out = StdFst::new();
    for _ in fst.states() {
        out.add_state();
    }
    if let Some(start) = fst.start() {
        out.set_start(start);
    }

    let mut super_final: Option<StateId> = None;
    for state in fst.states() {
        for arc in fst.arcs(state) {
            check_member(state, &arc.weight)?;
            let olabel = intern(&mut symbols, arc.weight.categorial());
            out.add_arc(
                state,
                Arc::new(arc.ilabel, olabel, arc.weight.cost(), arc.nextstate),
            );
        }

        if !fst.is_final(state) {
            continue;
        }
        let weight = fst.final_weight(state);
        check_member(state, weight)?;
        if weight.categorial().is_one() {
            out.set_final(state, weight.cost());
            continue;
        }
        let target = match super_final {
            Some(s) => s,
            None => {
                let s = out.add_state();
                out.set_final(s, TropicalWeight::one());
                super_final = Some(s);
                s
            }
        };
        let olabel = intern(&mut symbols, weight.categorial());
        out.add_arc(state, Arc::new(EPSILON, olabel, weight.cost(), target));
    }

    debug!(
        symbols = symbols.len(),
        residual_finals = super_final.is_some(),
        "encoded composite labels"
    );
    Ok((out, symbols))
}

/// Whether a rendered categorial weight is a plain label sequence.
pub fn is_simple(symbol: &str) -> bool {
    !symbol.contains([DIVIDER, LEFT_BRACKET, RIGHT_BRACKET])
}

/// Split a rendered quotient at its top-level dividers.
///
/// Dividers inside `<...>` do not split, and a component wrapped in one
/// bracket pair is returned without it. A trailing divider yields an empty
/// last component.
pub fn split_on_dividers(symbol: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in symbol.char_indices() {
        match ch {
            LEFT_BRACKET => depth += 1,
            RIGHT_BRACKET => depth = depth.saturating_sub(1),
            DIVIDER if depth == 0 => {
                parts.push(strip_brackets(&symbol[start..i]));
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(strip_brackets(&symbol[start..]));
    parts
}

fn strip_brackets(part: &str) -> &str {
    part.strip_prefix(LEFT_BRACKET)
        .and_then(|p| p.strip_suffix(RIGHT_BRACKET))
        .unwrap_or(part)
}

/// Split a plain label sequence on `_`.
pub fn split_on_separators(symbol: &str) -> Vec<&str> {
    symbol.split(SEPARATOR).collect()
}

fn input_label(symbols: &SymbolTable, component: &str) -> Result<Label, FstError> {
    if component.is_empty() || component == EPSILON_TEXT {
        return Ok(EPSILON);
    }
    symbols
        .find_label(component)
        .ok_or_else(|| FstError::UnknownSymbol(component.to_string()))
}

fn output_label(component: &str) -> Result<Label, FstError> {
    if component.is_empty() || component == EPSILON_TEXT {
        return Ok(EPSILON);
    }
    component
        .parse()
        .map_err(|_| FstError::UnknownSymbol(component.to_string()))
}

/// Build the transducer mapping composite labels back to tag labels.
///
/// State 0 is the start and only final state. A plain sequence `a_b` is read
/// as one input label and writes `a b`. A quotient `d1\d2\...\t` writes the
/// labels of `t` after reading the interned labels of its divisors in
/// reverse order followed by its own label, which replaces the divisor
/// labels emitted earlier on the same path.
pub fn build_decoder(symbols: &SymbolTable) -> Result<StdFst, FstError> {
    let mut fst = StdFst::new();
    let root = fst.add_state();
    fst.set_start(root);
    fst.set_final(root, TropicalWeight::one());

    for (label, symbol) in symbols.iter() {
        if label == EPSILON {
            continue;
        }

        let mut inputs: Vec<Label> = Vec::new();
        let outputs: Vec<Label>;
        if is_simple(symbol) {
            outputs = split_on_separators(symbol)
                .into_iter()
                .map(output_label)
                .collect::<Result<_, _>>()?;
        } else {
            let mut parts = split_on_dividers(symbol);
            let tail = parts.pop().unwrap_or_default();
            outputs = split_on_separators(tail)
                .into_iter()
                .map(output_label)
                .collect::<Result<_, _>>()?;
            for part in parts.iter().rev() {
                inputs.push(input_label(symbols, part)?);
            }
        }
        inputs.push(label);

        let steps = inputs.len().max(outputs.len());
        let mut from = root;
        for i in 0..steps {
            let ilabel = inputs.get(i).copied().unwrap_or(EPSILON);
            let olabel = outputs.get(i).copied().unwrap_or(EPSILON);
            let to = if i + 1 == steps { root } else { fst.add_state() };
            fst.add_arc(from, Arc::new(ilabel, olabel, TropicalWeight::one(), to));
            from = to;
        }
    }

    debug!(
        symbols = symbols.len(),
        states = fst.num_states(),
        arcs = fst.total_arcs(),
        "built decoder"
    );
    Ok(fst)
}
