//! Default quantifier inferred for every filter node.

use super::{BoolOp, FilterOp};
use std::fmt;
use std::sync::Arc;

/// How a filter result is turned into a single truth value when no explicit
/// quantifier is given: ALL treats an unmatched bundle as a failure, ANY is
/// satisfied by one matching bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    All,
    Any,
}

impl Quantifier {
    pub fn negate(self) -> Self {
        match self {
            Quantifier::All => Quantifier::Any,
            Quantifier::Any => Quantifier::All,
        }
    }

    /// ALL iff every operand is ALL (vacuously ALL when empty).
    pub fn conjunction<I: IntoIterator<Item = Quantifier>>(operands: I) -> Self {
        if operands.into_iter().all(|q| q == Quantifier::All) {
            Quantifier::All
        } else {
            Quantifier::Any
        }
    }

    /// ALL iff at least one operand is ALL.
    pub fn disjunction<I: IntoIterator<Item = Quantifier>>(operands: I) -> Self {
        if operands.into_iter().any(|q| q == Quantifier::All) {
            Quantifier::All
        } else {
            Quantifier::Any
        }
    }

    /// Wrap a filter into the boolean node this quantifier stands for.
    pub fn wrap(self, filter: FilterOp) -> BoolOp {
        match self {
            Quantifier::All => BoolOp::All(Arc::new(filter)),
            Quantifier::Any => BoolOp::Any(Arc::new(filter)),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::All => write!(f, "ALL"),
            Quantifier::Any => write!(f, "ANY"),
        }
    }
}
