// Symbols stored inside categorial weights.

use std::fmt;

use crate::Label;

/// Structural markers used by the categorial semiring.
///
/// These never collide with ordinary labels: a categorial sequence stores
/// [`Symbol`] values, and a sentinel is a distinct enum variant rather than a
/// reserved integer.
///
/// The declaration order is the sort order used by the lexicographic
/// tie-break: `Divider < RightBracket < LeftBracket < Bad < Infinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Special {
    /// Separates a divisor from the dividend in a left quotient.
    Divider,
    /// Closes a bracketed divisor.
    RightBracket,
    /// Opens a bracketed divisor.
    LeftBracket,
    /// Result of dividing by zero.
    Bad,
    /// The semiring zero.
    Infinity,
}

impl Special {
    /// Character used for this marker in the weight text form, if any.
    ///
    /// `Bad` and `Infinity` only ever appear alone and are rendered as
    /// whole-weight tokens instead.
    pub fn marker(self) -> Option<char> {
        match self {
            Special::Divider => Some('\\'),
            Special::RightBracket => Some('>'),
            Special::LeftBracket => Some('<'),
            Special::Bad | Special::Infinity => None,
        }
    }

    /// Inverse of [`marker`](Self::marker).
    pub fn from_marker(ch: char) -> Option<Self> {
        match ch {
            '\\' => Some(Special::Divider),
            '>' => Some(Special::RightBracket),
            '<' => Some(Special::LeftBracket),
            _ => None,
        }
    }
}

/// One element of a categorial sequence.
///
/// Every special sorts before every plain label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Special(Special),
    Plain(Label),
}

impl Symbol {
    pub const DIVIDER: Symbol = Symbol::Special(Special::Divider);
    pub const LEFT_BRACKET: Symbol = Symbol::Special(Special::LeftBracket);
    pub const RIGHT_BRACKET: Symbol = Symbol::Special(Special::RightBracket);

    #[inline]
    pub fn is_plain(self) -> bool {
        matches!(self, Symbol::Plain(_))
    }

    #[inline]
    pub fn plain(self) -> Option<Label> {
        match self {
            Symbol::Plain(l) => Some(l),
            Symbol::Special(_) => None,
        }
    }
}

impl From<Label> for Symbol {
    fn from(l: Label) -> Self {
        Symbol::Plain(l)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Plain(l) => write!(f, "{l}"),
            Symbol::Special(s) => match s.marker() {
                Some(ch) => write!(f, "{ch}"),
                None => write!(f, "{s:?}"),
            },
        }
    }
}
