//! Categorial-weight determinization engine for tagged word lattices.
//!
//! A tagging pipeline produces lattices whose arcs carry a word (input
//! label), a tag (output label) and a cost. Several tag sequences usually
//! compete for the same word sequence. This crate collapses every distinct
//! word path to its single cheapest tag sequence by folding tags into a
//! sequence-valued semiring, determinizing over the product of that semiring
//! with the tropical cost semiring, and decoding the resulting composite
//! weights back into ordinary output labels.
//!
//! # Architecture
//!
//! - [`label`] -- Plain labels and the structural sentinels of the categorial semiring
//! - [`semiring`] -- The `Semiring` capability trait and the tropical weight
//! - [`categorial`] -- Categorial (label sequence) weights, left/right, restricted/unrestricted
//! - [`lexicographic`] -- Lexicographic product of tropical and categorial weights
//! - [`fst`] -- Weighted automaton model (`VectorFst`), arc sorting, trimming
//! - [`symbols`] -- Bidirectional symbol table
//! - [`text`] -- AT&T text format for automata
//! - [`determinize`] -- Generic weighted subset construction
//! - [`compose`] -- Epsilon-aware composition over the tropical semiring
//! - [`decode`] -- Lift, label encoding and decoder transducer construction
//! - [`disambiguate`] -- The complete lift/determinize/decode/compose pipeline

pub mod categorial;
pub mod compose;
pub mod decode;
pub mod determinize;
pub mod disambiguate;
pub mod fst;
pub mod label;
pub mod lexicographic;
pub mod semiring;
pub mod symbols;
pub mod text;

/// Arc label. `0` is reserved for epsilon.
pub type Label = u32;

/// Dense state identifier.
pub type StateId = u32;

/// The empty label.
pub const EPSILON: Label = 0;

/// Error type for automaton-level operations.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("input automaton is not epsilon-free: state {state} has an epsilon arc")]
    NotEpsilonFree { state: StateId },
    #[error(
        "non-functional lattice at output state {state}, {}: `{left}` conflicts with `{right}`",
        violation_site(.label)
    )]
    SemiringViolation {
        state: StateId,
        label: Option<Label>,
        left: String,
        right: String,
    },
    #[error("undefined division reached the output at state {state}: {weight}")]
    DivisionUndefined { state: StateId, weight: String },
    #[error("symbol `{0}` is not in the symbol table")]
    UnknownSymbol(String),
    #[error("right-hand automaton must be sorted by input label")]
    NotArcSorted,
    #[error("automaton has a cycle through state {state}")]
    Cyclic { state: StateId },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Semiring(#[from] semiring::SemiringError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn violation_site(label: &Option<Label>) -> String {
    match label {
        Some(l) => format!("input label {l}"),
        None => "final weight".to_string(),
    }
}
