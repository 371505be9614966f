// Categorial weights: label sequences under longest-common-prefix (or suffix)
// and concatenation, with a symbolic left quotient used by determinization.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::Label;
use crate::label::{Special, Symbol};
use crate::semiring::{DivideType, Semiring, SemiringError};

/// Separator between two adjacent plain labels in the text form.
pub const SEPARATOR: char = '_';

const ZERO_TEXT: &str = "Infinity";
const ONE_TEXT: &str = "Epsilon";
const BAD_TEXT: &str = "BadCategorial";

/// Side from which plus compares and division strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

/// Compile-time selection of a categorial semiring variant.
///
/// Restricted variants refuse to merge two different sequences in `plus`,
/// which is how determinization detects non-functional input.
pub trait CategorialKind: Copy + Debug + Default + Eq + Hash + 'static {
    const HANDEDNESS: Handedness;
    const RESTRICTED: bool;
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Left;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Right;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LeftRestricted;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RightRestricted;

impl CategorialKind for Left {
    const HANDEDNESS: Handedness = Handedness::Left;
    const RESTRICTED: bool = false;
    const NAME: &'static str = "categorial";
}

impl CategorialKind for Right {
    const HANDEDNESS: Handedness = Handedness::Right;
    const RESTRICTED: bool = false;
    const NAME: &'static str = "right_categorial";
}

impl CategorialKind for LeftRestricted {
    const HANDEDNESS: Handedness = Handedness::Left;
    const RESTRICTED: bool = true;
    const NAME: &'static str = "restricted_categorial";
}

impl CategorialKind for RightRestricted {
    const HANDEDNESS: Handedness = Handedness::Right;
    const RESTRICTED: bool = true;
    const NAME: &'static str = "right_restricted_categorial";
}

pub type LeftCategorial = CategorialWeight<Left>;
pub type RightCategorial = CategorialWeight<Right>;
pub type LeftRestrictedCategorial = CategorialWeight<LeftRestricted>;
pub type RightRestrictedCategorial = CategorialWeight<RightRestricted>;

/// A sequence of [`Symbol`]s.
///
/// The empty sequence is `one()`; a lone `Infinity` marker is `zero()`; a
/// lone `Bad` marker is the poison value produced by dividing by zero.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CategorialWeight<K: CategorialKind> {
    symbols: Vec<Symbol>,
    kind: PhantomData<K>,
}

impl<K: CategorialKind> CategorialWeight<K> {
    fn from_symbols(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            kind: PhantomData,
        }
    }

    /// A single-label sequence. Epsilon yields `one()`.
    pub fn from_label(label: Label) -> Self {
        Self::from_labels([label])
    }

    /// Sequence of plain labels; epsilons are dropped.
    pub fn from_labels<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        Self::from_symbols(
            labels
                .into_iter()
                .filter(|&l| l != crate::EPSILON)
                .map(Symbol::Plain)
                .collect(),
        )
    }

    pub fn bad() -> Self {
        Self::from_symbols(vec![Symbol::Special(Special::Bad)])
    }

    pub fn is_bad(&self) -> bool {
        self.symbols == [Symbol::Special(Special::Bad)]
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Plain labels in order, skipping structural markers.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.symbols.iter().filter_map(|s| s.plain())
    }

    /// Whether this weight is a quotient expression.
    pub fn contains_divider(&self) -> bool {
        self.symbols.contains(&Symbol::DIVIDER)
    }

    /// Element-wise order; a proper prefix sorts first.
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.symbols.cmp(&other.symbols)
    }

    /// Order of the label sequences two residuals stand for when both follow
    /// the same emitted prefix.
    ///
    /// A residual `d\t` takes back what `d` emitted and appends `t`, so it
    /// reduces to `s⁻¹ v`: drop the suffix `s` of the prefix, then write `v`.
    /// Both sequences agree up to the longer take-back; the order is decided
    /// by what each writes after it. Zero, bad and any weight without that
    /// shape fall back to [`lexicographic_cmp`](Self::lexicographic_cmp).
    pub fn resolved_cmp(&self, other: &Self) -> Ordering {
        let (Some((s1, v1)), Some((s2, v2))) = (self.continuation(), other.continuation())
        else {
            return self.lexicographic_cmp(other);
        };
        if s1.len() >= s2.len() {
            let rewritten = &s1[..s1.len() - s2.len()];
            v1.iter().cmp(rewritten.iter().chain(&v2))
        } else {
            let rewritten = &s2[..s2.len() - s1.len()];
            rewritten.iter().chain(&v1).cmp(v2.iter())
        }
    }

    /// Split the reduced word into the taken-back suffix (in forward order)
    /// and the labels written after it.
    fn continuation(&self) -> Option<(Vec<Label>, Vec<Label>)> {
        let word = reduce(&self.symbols)?;
        let taken = word.iter().take_while(|g| g.inverse).count();
        if word[taken..].iter().any(|g| g.inverse) {
            return None;
        }
        let suffix = word[..taken].iter().rev().map(|g| g.label).collect();
        let written = word[taken..].iter().map(|g| g.label).collect();
        Some((suffix, written))
    }

    fn common_prefix(&self, other: &Self) -> Self {
        let n = self
            .symbols
            .iter()
            .zip(&other.symbols)
            .take_while(|(a, b)| a == b)
            .count();
        Self::from_symbols(self.symbols[..n].to_vec())
    }

    fn common_suffix(&self, other: &Self) -> Self {
        let n = self
            .symbols
            .iter()
            .rev()
            .zip(other.symbols.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        Self::from_symbols(self.symbols[self.symbols.len() - n..].to_vec())
    }

    /// Left quotient `w2 \ w1`, kept symbolic so the decoder can replay it.
    fn left_quotient(dividend: &Self, divisor: &Self) -> Self {
        let bracket = divisor.contains_divider();
        let mut symbols = Vec::with_capacity(divisor.len() + dividend.len() + 3);
        if bracket {
            symbols.push(Symbol::LEFT_BRACKET);
        }
        symbols.extend_from_slice(&divisor.symbols);
        if bracket {
            symbols.push(Symbol::RIGHT_BRACKET);
        }
        symbols.push(Symbol::DIVIDER);
        symbols.extend_from_slice(&dividend.symbols);
        Self::from_symbols(symbols)
    }

    fn unsupported(requested: DivideType) -> SemiringError {
        SemiringError::UnsupportedDivision {
            semiring: K::NAME,
            allowed: match K::HANDEDNESS {
                Handedness::Left => DivideType::Left,
                Handedness::Right => DivideType::Right,
            },
            requested,
        }
    }
}

/// A label or its inverse in the reduced reading of a quotient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generator {
    label: Label,
    inverse: bool,
}

fn push_reduced(word: &mut Vec<Generator>, g: Generator) {
    let cancels = word
        .last()
        .is_some_and(|top| top.label == g.label && top.inverse != g.inverse);
    if cancels {
        word.pop();
    } else {
        word.push(g);
    }
}

/// Read `d1\d2\...\t` as `d1⁻¹ d2⁻¹ ... t` and cancel adjacent inverses.
///
/// `None` on unbalanced brackets or a zero/bad marker.
fn reduce(symbols: &[Symbol]) -> Option<Vec<Generator>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, symbol) in symbols.iter().enumerate() {
        match *symbol {
            Symbol::LEFT_BRACKET => depth += 1,
            Symbol::RIGHT_BRACKET => depth = depth.checked_sub(1)?,
            Symbol::DIVIDER if depth == 0 => {
                parts.push(&symbols[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&symbols[start..]);

    let (written, divisors) = parts.split_last()?;
    let mut word = Vec::new();
    for divisor in divisors {
        for g in reduce_part(divisor)?.into_iter().rev() {
            push_reduced(
                &mut word,
                Generator {
                    inverse: !g.inverse,
                    ..g
                },
            );
        }
    }
    for g in reduce_part(written)? {
        push_reduced(&mut word, g);
    }
    Some(word)
}

/// A run of plain labels and bracketed quotients, read left to right.
fn reduce_part(part: &[Symbol]) -> Option<Vec<Generator>> {
    let mut word = Vec::new();
    let mut i = 0;
    while i < part.len() {
        match part[i] {
            Symbol::Plain(label) => {
                push_reduced(&mut word, Generator { label, inverse: false });
                i += 1;
            }
            Symbol::LEFT_BRACKET => {
                let mut depth = 0usize;
                let close = (i..part.len()).find(|&j| {
                    match part[j] {
                        Symbol::LEFT_BRACKET => depth += 1,
                        Symbol::RIGHT_BRACKET => depth -= 1,
                        _ => {}
                    }
                    depth == 0
                })?;
                for g in reduce(&part[i + 1..close])? {
                    push_reduced(&mut word, g);
                }
                i = close + 1;
            }
            Symbol::Special(_) => return None,
        }
    }
    Some(word)
}

impl<K: CategorialKind> Semiring for CategorialWeight<K> {
    const NAME: &'static str = K::NAME;

    fn zero() -> Self {
        Self::from_symbols(vec![Symbol::Special(Special::Infinity)])
    }

    fn one() -> Self {
        Self::from_symbols(Vec::new())
    }

    /// Unrestricted kinds return the longest common prefix (left) or suffix
    /// (right) of the two sequences, not the smaller whole operand. Picking a
    /// whole operand on a cost tie is [`LexicographicWeight`]'s job.
    ///
    /// [`LexicographicWeight`]: crate::lexicographic::LexicographicWeight
    fn plus(&self, rhs: &Self) -> Result<Self, SemiringError> {
        if self.is_bad() {
            return Ok(self.clone());
        }
        if rhs.is_bad() {
            return Ok(rhs.clone());
        }
        if self.is_zero() {
            return Ok(rhs.clone());
        }
        if rhs.is_zero() {
            return Ok(self.clone());
        }
        if K::RESTRICTED {
            if self != rhs {
                return Err(SemiringError::Violation {
                    left: self.to_string(),
                    right: rhs.to_string(),
                });
            }
            return Ok(self.clone());
        }
        Ok(match K::HANDEDNESS {
            Handedness::Left => self.common_prefix(rhs),
            Handedness::Right => self.common_suffix(rhs),
        })
    }

    fn times(&self, rhs: &Self) -> Self {
        if self.is_bad() || rhs.is_bad() {
            return Self::bad();
        }
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        let mut symbols = Vec::with_capacity(self.len() + rhs.len());
        symbols.extend_from_slice(&self.symbols);
        symbols.extend_from_slice(&rhs.symbols);
        Self::from_symbols(symbols)
    }

    fn divide(&self, rhs: &Self, kind: DivideType) -> Result<Self, SemiringError> {
        match K::HANDEDNESS {
            Handedness::Left if kind != DivideType::Left => return Err(Self::unsupported(kind)),
            Handedness::Right if kind != DivideType::Right => return Err(Self::unsupported(kind)),
            _ => {}
        }
        if self.is_bad() || rhs.is_bad() || rhs.is_zero() {
            return Ok(Self::bad());
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        match K::HANDEDNESS {
            Handedness::Left => {
                if self == rhs {
                    return Ok(Self::one());
                }
                Ok(Self::left_quotient(self, rhs))
            }
            Handedness::Right => {
                // The divisor is a suffix of the dividend at every call site.
                let keep = self.len().saturating_sub(rhs.len());
                Ok(Self::from_symbols(self.symbols[..keep].to_vec()))
            }
        }
    }

    fn is_member(&self) -> bool {
        !self.is_bad()
    }
}

impl<K: CategorialKind> Debug for CategorialWeight<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self)
    }
}

impl<K: CategorialKind> Display for CategorialWeight<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            return f.write_str(ONE_TEXT);
        }
        if self.is_zero() {
            return f.write_str(ZERO_TEXT);
        }
        if self.is_bad() {
            return f.write_str(BAD_TEXT);
        }
        let mut need_separator = false;
        for symbol in &self.symbols {
            match symbol {
                Symbol::Plain(l) => {
                    if need_separator {
                        write!(f, "{SEPARATOR}")?;
                    }
                    write!(f, "{l}")?;
                    need_separator = true;
                }
                Symbol::Special(s) => {
                    write!(f, "{}", s.marker().unwrap_or('?'))?;
                    need_separator = false;
                }
            }
        }
        Ok(())
    }
}

impl<K: CategorialKind> FromStr for CategorialWeight<K> {
    type Err = SemiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ZERO_TEXT => return Ok(Self::zero()),
            ONE_TEXT => return Ok(Self::one()),
            BAD_TEXT => return Ok(Self::bad()),
            _ => {}
        }
        let invalid = || SemiringError::Parse {
            semiring: K::NAME,
            text: s.to_string(),
        };

        let bytes = s.as_bytes();
        let mut symbols = Vec::new();
        // Last symbol was a plain label, and a `_` has been consumed after it.
        let mut after_label = false;
        let mut pending_separator = false;
        let mut i = 0;
        while i < bytes.len() {
            let ch = bytes[i] as char;
            if let Some(special) = Special::from_marker(ch) {
                if pending_separator {
                    return Err(invalid());
                }
                symbols.push(Symbol::Special(special));
                after_label = false;
                i += 1;
            } else if ch == SEPARATOR {
                if !after_label {
                    return Err(invalid());
                }
                pending_separator = true;
                after_label = false;
                i += 1;
            } else if ch.is_ascii_digit() {
                if after_label {
                    return Err(invalid());
                }
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let label: Label = s[start..i].parse().map_err(|_| invalid())?;
                symbols.push(Symbol::Plain(label));
                after_label = true;
                pending_separator = false;
            } else {
                return Err(invalid());
            }
        }
        if symbols.is_empty() || pending_separator {
            return Err(invalid());
        }
        Ok(Self::from_symbols(symbols))
    }
}
