//! Operator trees.
//!
//! Filter operators select a subset of a tag bundle set; boolean operators
//! reduce a set to a single truth value. Every filter node carries a default
//! [`Quantifier`] used when it has to be turned into a boolean node.

mod boolean;
mod filter;
mod quantifier;

pub use boolean::{BoolOp, as_bool_op};
pub use filter::{
    AtomicFilter, FilterAnd, FilterConst, FilterImpl, FilterNot, FilterOp, FilterOr, FilterRef,
};
pub use quantifier::Quantifier;

use std::fmt;

/// Either kind of operator, as stored and returned by the reference registry.
#[derive(Debug, Clone)]
pub enum Operator {
    Filter(FilterOp),
    Bool(BoolOp),
}

impl From<FilterOp> for Operator {
    fn from(op: FilterOp) -> Self {
        Operator::Filter(op)
    }
}

impl From<BoolOp> for Operator {
    fn from(op: BoolOp) -> Self {
        Operator::Bool(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Filter(op) => fmt::Display::fmt(op, f),
            Operator::Bool(op) => fmt::Display::fmt(op, f),
        }
    }
}
