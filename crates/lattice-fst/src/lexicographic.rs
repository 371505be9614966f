// Lexicographic product of the tropical and categorial semirings.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::Label;
use crate::categorial::{CategorialKind, CategorialWeight};
use crate::semiring::{DivideType, Semiring, SemiringError, TropicalWeight};

/// Separator between the two components in the text form.
const PAIR_SEPARATOR: char = ',';

/// A (cost, tag sequence) pair.
///
/// Plus keeps the cheaper operand whole. On a cost tie, unrestricted kinds
/// keep the operand whose resolved label sequence is lexicographically
/// smaller (see [`CategorialWeight::resolved_cmp`]), while restricted kinds
/// require both sequences to be equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexicographicWeight<K: CategorialKind> {
    cost: TropicalWeight,
    categorial: CategorialWeight<K>,
}

impl<K: CategorialKind> LexicographicWeight<K> {
    pub fn new(cost: TropicalWeight, categorial: CategorialWeight<K>) -> Self {
        Self { cost, categorial }
    }

    /// Weight of a lattice arc with the given cost and output label.
    pub fn from_arc(cost: TropicalWeight, olabel: Label) -> Self {
        if cost.is_zero() {
            return Self::zero();
        }
        Self::new(cost, CategorialWeight::from_label(olabel))
    }

    pub fn cost(&self) -> TropicalWeight {
        self.cost
    }

    pub fn categorial(&self) -> &CategorialWeight<K> {
        &self.categorial
    }

    pub fn into_parts(self) -> (TropicalWeight, CategorialWeight<K>) {
        (self.cost, self.categorial)
    }
}

impl<K: CategorialKind> Semiring for LexicographicWeight<K> {
    const NAME: &'static str = "lexicographic";

    fn zero() -> Self {
        Self::new(TropicalWeight::zero(), CategorialWeight::zero())
    }

    fn one() -> Self {
        Self::new(TropicalWeight::one(), CategorialWeight::one())
    }

    fn plus(&self, rhs: &Self) -> Result<Self, SemiringError> {
        if !self.is_member() {
            return Ok(self.clone());
        }
        if !rhs.is_member() {
            return Ok(rhs.clone());
        }
        if self.cost.natural_less(rhs.cost) {
            return Ok(self.clone());
        }
        if rhs.cost.natural_less(self.cost) {
            return Ok(rhs.clone());
        }
        if K::RESTRICTED {
            let categorial = self.categorial.plus(&rhs.categorial)?;
            return Ok(Self::new(self.cost, categorial));
        }
        Ok(match self.categorial.resolved_cmp(&rhs.categorial) {
            Ordering::Greater => rhs.clone(),
            Ordering::Less | Ordering::Equal => self.clone(),
        })
    }

    fn times(&self, rhs: &Self) -> Self {
        Self::new(
            self.cost.times(&rhs.cost),
            self.categorial.times(&rhs.categorial),
        )
    }

    fn divide(&self, rhs: &Self, kind: DivideType) -> Result<Self, SemiringError> {
        Ok(Self::new(
            self.cost.divide(&rhs.cost, kind)?,
            self.categorial.divide(&rhs.categorial, kind)?,
        ))
    }

    fn is_member(&self) -> bool {
        self.cost.is_member() && self.categorial.is_member()
    }

    fn quantize(&self, delta: f32) -> Self {
        Self::new(self.cost.quantize(delta), self.categorial.quantize(delta))
    }
}

impl<K: CategorialKind> Display for LexicographicWeight<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{PAIR_SEPARATOR}{}", self.cost, self.categorial)
    }
}

impl<K: CategorialKind> FromStr for LexicographicWeight<K> {
    type Err = SemiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cost, categorial) =
            s.split_once(PAIR_SEPARATOR)
                .ok_or_else(|| SemiringError::Parse {
                    semiring: Self::NAME,
                    text: s.to_string(),
                })?;
        Ok(Self::new(cost.parse()?, categorial.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorial::{Left, LeftRestricted};

    type Lex = LexicographicWeight<Left>;
    type RestrictedLex = LexicographicWeight<LeftRestricted>;

    fn lex(cost: f32, labels: &[Label]) -> Lex {
        Lex::new(cost.into(), CategorialWeight::from_labels(labels.iter().copied()))
    }

    #[test]
    fn cheaper_operand_wins_whole() {
        let a = lex(1.0, &[10]);
        let b = lex(2.0, &[11]);
        assert_eq!(a.plus(&b).unwrap(), a);
        assert_eq!(b.plus(&a).unwrap(), a);
    }

    #[test]
    fn cost_tie_breaks_on_sequence() {
        let a = lex(1.0, &[3, 9]);
        let b = lex(1.0, &[3, 4, 100]);
        assert_eq!(a.plus(&b).unwrap(), b);
        assert_eq!(b.plus(&a).unwrap(), b);
    }

    #[test]
    fn cost_tie_reads_residual_quotients() {
        // Both residuals follow an emitted [11]; the quotient stands for
        // [10, 10] and beats the plain continuation [11, 11].
        let stay = lex(2.0, &[11]);
        let switch = Lex::new(TropicalWeight::new(2.0), "11\\10_10".parse().unwrap());
        assert_eq!(stay.plus(&switch).unwrap(), switch);
        assert_eq!(switch.plus(&stay).unwrap(), switch);
    }

    #[test]
    fn identity_laws() {
        let w = lex(0.5, &[7]);
        assert_eq!(w.plus(&Lex::zero()).unwrap(), w);
        assert_eq!(Lex::zero().plus(&w).unwrap(), w);
        assert_eq!(w.times(&Lex::one()), w);
        assert_eq!(Lex::zero().times(&w), Lex::zero());
    }

    #[test]
    fn restricted_tie_with_different_sequences_fails() {
        let a = RestrictedLex::new(TropicalWeight::new(1.0), CategorialWeight::from_label(10));
        let b = RestrictedLex::new(TropicalWeight::new(1.0), CategorialWeight::from_label(11));
        assert!(matches!(a.plus(&b), Err(SemiringError::Violation { .. })));

        // A strictly cheaper operand never reaches the categorial plus.
        let c = RestrictedLex::new(TropicalWeight::new(0.5), CategorialWeight::from_label(11));
        assert_eq!(a.plus(&c).unwrap(), c);
    }

    #[test]
    fn divide_is_componentwise() {
        let w = lex(3.0, &[2]);
        let total = lex(1.0, &[1]);
        let r = w.divide(&total, DivideType::Left).unwrap();
        assert_eq!(r.cost(), TropicalWeight::new(2.0));
        assert_eq!(r.categorial().to_string(), "1\\2");
        assert_eq!(w.divide(&w, DivideType::Left).unwrap(), Lex::one());
    }

    #[test]
    fn divide_by_zero_is_not_a_member() {
        let r = lex(1.0, &[1]).divide(&Lex::zero(), DivideType::Left).unwrap();
        assert!(!r.is_member());
        assert!(r.categorial().is_bad());
    }

    #[test]
    fn text_round_trip() {
        for w in [Lex::zero(), Lex::one(), lex(1.5, &[4, 5])] {
            let text = w.to_string();
            assert_eq!(text.parse::<Lex>().unwrap(), w);
        }
        assert_eq!(lex(2.0, &[4, 5]).to_string(), "2,4_5");
        assert!("2".parse::<Lex>().is_err());
    }

    #[test]
    fn lifted_epsilon_output_is_one() {
        let w = Lex::from_arc(TropicalWeight::new(2.0), 0);
        assert!(w.categorial().is_one());
    }
}
