// The complete pipeline: lift, determinize, encode, decode, compose.

use tracing::{debug, info};

use crate::FstError;
use crate::categorial::{CategorialKind, Left, LeftRestricted};
use crate::compose::compose;
use crate::decode::{build_decoder, encode_labels, lift};
use crate::determinize::{DeterminizeOptions, determinize};
use crate::fst::{ArcSortKey, StdFst, VectorFst};
use crate::lexicographic::LexicographicWeight;
use crate::symbols::SymbolTable;

/// Options for [`disambiguate`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisambiguateOptions {
    pub determinize: DeterminizeOptions,
    /// Fail on lattices that pair one word sequence with two equally cheap
    /// tag sequences instead of picking one.
    pub restricted: bool,
}

/// Everything the pipeline produced.
#[derive(Debug, Clone)]
pub struct Disambiguation {
    /// One path per distinct input sequence, carrying its best tags.
    pub result: StdFst,
    /// The determinized lattice with composite weights replaced by labels.
    pub encoded: StdFst,
    /// Maps labels of `encoded` back to tag labels, sorted by input.
    pub decoder: StdFst,
    /// Rendered composite weights by label.
    pub symbols: SymbolTable,
}

/// Lift `fst` into the lexicographic semiring of kind `K` and determinize it.
pub fn determinize_lexicographic<K: CategorialKind>(
    fst: &StdFst,
    opts: &DeterminizeOptions,
) -> Result<VectorFst<LexicographicWeight<K>>, FstError> {
    fst.check_epsilon_free()?;
    let lifted = lift::<K>(fst);
    determinize(&lifted, opts)
}

/// Run the pipeline with a fixed categorial kind.
pub fn disambiguate_with<K: CategorialKind>(
    fst: &StdFst,
    opts: &DeterminizeOptions,
) -> Result<Disambiguation, FstError> {
    let determinized = determinize_lexicographic::<K>(fst, opts)?;
    debug!(
        semiring = K::NAME,
        states = determinized.num_states(),
        "determinized lifted lattice"
    );

    let (encoded, symbols) = encode_labels(&determinized)?;
    let mut decoder = build_decoder(&symbols)?;
    decoder.arc_sort(ArcSortKey::Input);
    let result = compose(&encoded, &decoder)?;

    info!(
        input_states = fst.num_states(),
        output_states = result.num_states(),
        symbols = symbols.len(),
        "disambiguated lattice"
    );
    Ok(Disambiguation {
        result,
        encoded,
        decoder,
        symbols,
    })
}

/// Keep only the cheapest tag sequence for every word sequence of an
/// epsilon-free tagged lattice.
pub fn disambiguate(fst: &StdFst, opts: &DisambiguateOptions) -> Result<Disambiguation, FstError> {
    if opts.restricted {
        disambiguate_with::<LeftRestricted>(fst, &opts.determinize)
    } else {
        disambiguate_with::<Left>(fst, &opts.determinize)
    }
}
