// Semiring capability trait and the tropical cost semiring.

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Which side a division factors out.
///
/// Left division computes `x` such that `w2 ⊗ x = w1`; right division
/// computes `x` such that `x ⊗ w2 = w1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivideType {
    Left,
    Right,
    Any,
}

/// Default quantization step for hashing float weights.
pub const DELTA: f32 = 1.0 / 1024.0;

/// Error type for semiring operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemiringError {
    /// A restricted plus received two unequal non-zero operands.
    #[error("unequal arguments `{left}` and `{right}` (non-functional input?)")]
    Violation { left: String, right: String },
    #[error("only {allowed:?} division is defined for the {semiring} semiring, got {requested:?}")]
    UnsupportedDivision {
        semiring: &'static str,
        allowed: DivideType,
        requested: DivideType,
    },
    #[error("invalid {semiring} weight `{text}`")]
    Parse { semiring: &'static str, text: String },
}

/// Capabilities a weight type must provide to be used by the automaton
/// algorithms in this crate.
///
/// Rendering is `Display` and parsing is `FromStr`; the two must be exact
/// inverses.
pub trait Semiring:
    Clone + Debug + Eq + Hash + Display + FromStr<Err = SemiringError>
{
    /// Name used in diagnostics and text headers.
    const NAME: &'static str;

    /// The ⊕-identity, annihilator for ⊗.
    fn zero() -> Self;

    /// The ⊗-identity.
    fn one() -> Self;

    /// ⊕. Fails only for restricted semirings given conflicting operands.
    fn plus(&self, rhs: &Self) -> Result<Self, SemiringError>;

    /// ⊗.
    fn times(&self, rhs: &Self) -> Self;

    /// Division. Not every semiring defines every [`DivideType`].
    fn divide(&self, rhs: &Self, kind: DivideType) -> Result<Self, SemiringError>;

    /// `false` for poison values produced by undefined divisions.
    fn is_member(&self) -> bool;

    /// Canonical representative used when weights are compared for
    /// subset memoization.
    fn quantize(&self, _delta: f32) -> Self {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn is_one(&self) -> bool {
        *self == Self::one()
    }
}

/// Tropical weight: `(min, +, +∞, 0)` over `f32`.
#[derive(Debug, Clone, Copy)]
pub struct TropicalWeight(f32);

impl TropicalWeight {
    pub fn new(value: f32) -> Self {
        // -0.0 and 0.0 must hash alike.
        if value == 0.0 {
            return Self(0.0);
        }
        Self(value)
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Strict natural order: `a < b` iff `a ⊕ b == a` and `a != b`.
    #[inline]
    pub fn natural_less(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl PartialEq for TropicalWeight {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || (self.0.is_nan() && other.0.is_nan())
    }
}

impl Eq for TropicalWeight {}

impl Hash for TropicalWeight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            f32::NAN.to_bits().hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl From<f32> for TropicalWeight {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl Display for TropicalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == f32::INFINITY {
            f.write_str("Infinity")
        } else if self.0.is_nan() {
            f.write_str("BadNumber")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for TropicalWeight {
    type Err = SemiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Infinity" | "inf" => Ok(Self::zero()),
            "BadNumber" => Ok(Self(f32::NAN)),
            _ => s.parse::<f32>().map(Self::new).map_err(|_| SemiringError::Parse {
                semiring: Self::NAME,
                text: s.to_string(),
            }),
        }
    }
}

impl Semiring for TropicalWeight {
    const NAME: &'static str = "tropical";

    fn zero() -> Self {
        Self(f32::INFINITY)
    }

    fn one() -> Self {
        Self(0.0)
    }

    fn plus(&self, rhs: &Self) -> Result<Self, SemiringError> {
        if !self.is_member() {
            return Ok(*self);
        }
        if !rhs.is_member() {
            return Ok(*rhs);
        }
        Ok(if rhs.0 < self.0 { *rhs } else { *self })
    }

    fn times(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            return Self(f32::NAN);
        }
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        Self::new(self.0 + rhs.0)
    }

    /// Tropical division is subtraction on either side.
    fn divide(&self, rhs: &Self, _kind: DivideType) -> Result<Self, SemiringError> {
        if !self.is_member() || !rhs.is_member() || rhs.is_zero() {
            return Ok(Self(f32::NAN));
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        Ok(Self::new(self.0 - rhs.0))
    }

    fn is_member(&self) -> bool {
        !self.0.is_nan() && self.0 != f32::NEG_INFINITY
    }

    fn quantize(&self, delta: f32) -> Self {
        if !self.is_member() || self.is_zero() {
            return *self;
        }
        Self::new((self.0 / delta + 0.5).floor() * delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tropical_identities() {
        let w = TropicalWeight::new(2.5);
        assert_eq!(w.plus(&TropicalWeight::zero()).unwrap(), w);
        assert_eq!(w.times(&TropicalWeight::one()), w);
        assert_eq!(TropicalWeight::zero().times(&w), TropicalWeight::zero());
    }

    #[test]
    fn tropical_plus_is_min() {
        let a = TropicalWeight::new(1.0);
        let b = TropicalWeight::new(3.0);
        assert_eq!(a.plus(&b).unwrap(), a);
        assert_eq!(b.plus(&a).unwrap(), a);
    }

    #[test]
    fn tropical_divide_subtracts() {
        let a = TropicalWeight::new(5.0);
        let b = TropicalWeight::new(2.0);
        assert_eq!(a.divide(&b, DivideType::Left).unwrap(), TropicalWeight::new(3.0));
        assert_eq!(
            TropicalWeight::zero().divide(&b, DivideType::Left).unwrap(),
            TropicalWeight::zero()
        );
    }

    #[test]
    fn tropical_divide_by_zero_is_not_a_member() {
        let a = TropicalWeight::new(5.0);
        let bad = a.divide(&TropicalWeight::zero(), DivideType::Left).unwrap();
        assert!(!bad.is_member());
        assert!(!bad.times(&a).is_member());
    }

    #[test]
    fn tropical_text_round_trip() {
        for text in ["0", "1.5", "-2", "Infinity"] {
            let w: TropicalWeight = text.parse().unwrap();
            assert_eq!(w.to_string(), text);
        }
        assert!("abc".parse::<TropicalWeight>().is_err());
    }

    #[test]
    fn negative_zero_equals_zero() {
        let a = TropicalWeight::new(-0.0);
        assert_eq!(a, TropicalWeight::one());
        assert_eq!(a.to_string(), "0");
    }

    #[test]
    fn quantize_snaps_to_grid() {
        let a = TropicalWeight::new(1.0 + DELTA / 4.0);
        assert_eq!(a.quantize(DELTA), TropicalWeight::new(1.0));
        assert_eq!(TropicalWeight::zero().quantize(DELTA), TropicalWeight::zero());
    }
}
