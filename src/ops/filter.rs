//! Filter operators: set-to-subset selection over tag bundles.
//!
//! Every node is immutable once built and carries the [`Quantifier`] inferred
//! from its children at construction time.

use super::{BoolOp, Quantifier};
use crate::error::{FilterError, Result};
use crate::tags::{TagBundle, TagBundleSet};
use crate::utils::{BASE_INDENT, indent, indent_joined};
use crate::values::{NormalizedValues, ValueSpec, normalize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A node of the filter operator tree.
#[derive(Debug, Clone)]
pub enum FilterOp {
    And(FilterAnd),
    Or(FilterOr),
    Not(FilterNot),
    Implies(FilterImpl),
    Ref(FilterRef),
    Atomic(AtomicFilter),
    Const(FilterConst),
}

impl FilterOp {
    pub fn and(operators: Vec<FilterOp>) -> Self {
        FilterOp::And(FilterAnd::new(operators))
    }

    pub fn or(operators: Vec<FilterOp>) -> Self {
        FilterOp::Or(FilterOr::new(operators))
    }

    pub fn not(operator: FilterOp) -> Self {
        FilterOp::Not(FilterNot::new(operator))
    }

    pub fn implies(operators: Vec<FilterOp>) -> Result<Self> {
        FilterImpl::new(operators).map(FilterOp::Implies)
    }

    pub fn reference(name: impl Into<String>, operator: FilterOp) -> Self {
        FilterOp::Ref(FilterRef::new(name, operator))
    }

    pub fn atomic(key: impl Into<String>, value: impl Into<ValueSpec>) -> Result<Self> {
        AtomicFilter::new(key, value).map(FilterOp::Atomic)
    }

    pub fn constant(value: bool) -> Self {
        FilterOp::Const(FilterConst::new(value))
    }

    /// Build a constant from an untyped value; anything but a bool is rejected.
    pub fn constant_from(value: &ValueSpec) -> Result<Self> {
        match value {
            ValueSpec::Bool(b) => Ok(FilterOp::constant(*b)),
            other => Err(FilterError::InvalidConstant(other.to_string())),
        }
    }

    /// Select the bundles of `set` this node matches.
    pub fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        match self {
            FilterOp::And(op) => op.apply(set),
            FilterOp::Or(op) => op.apply(set),
            FilterOp::Not(op) => op.apply(set),
            FilterOp::Implies(op) => op.apply(set),
            FilterOp::Ref(op) => op.apply(set),
            FilterOp::Atomic(op) => op.apply(set),
            FilterOp::Const(op) => op.apply(set),
        }
    }

    pub fn quantifier(&self) -> Quantifier {
        match self {
            FilterOp::And(op) => op.quantifier,
            FilterOp::Or(op) => op.quantifier,
            FilterOp::Not(op) => op.quantifier,
            FilterOp::Implies(op) => op.quantifier(),
            FilterOp::Ref(op) => op.quantifier(),
            FilterOp::Atomic(_) => Quantifier::Any,
            FilterOp::Const(op) => op.quantifier(),
        }
    }

    /// Direct conversion into an equivalent boolean node, where one exists.
    ///
    /// Only constants (and references wrapping a constant) convert; every
    /// other kind returns `None` and is left to the boolean layer.
    pub fn try_as_bool_op(&self) -> Option<BoolOp> {
        match self {
            FilterOp::Const(op) => Some(op.as_bool_op()),
            FilterOp::Ref(op) => op.try_as_bool_op(),
            FilterOp::And(_)
            | FilterOp::Or(_)
            | FilterOp::Not(_)
            | FilterOp::Implies(_)
            | FilterOp::Atomic(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FilterOp::And(_) => "and",
            FilterOp::Or(_) => "or",
            FilterOp::Not(_) => "not",
            FilterOp::Implies(_) => "impl",
            FilterOp::Ref(_) => "ref",
            FilterOp::Atomic(_) => "atomic",
            FilterOp::Const(_) => "const",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::And(op) => fmt::Display::fmt(op, f),
            FilterOp::Or(op) => fmt::Display::fmt(op, f),
            FilterOp::Not(op) => fmt::Display::fmt(op, f),
            FilterOp::Implies(op) => fmt::Display::fmt(op, f),
            FilterOp::Ref(op) => fmt::Display::fmt(op, f),
            FilterOp::Atomic(op) => fmt::Display::fmt(op, f),
            FilterOp::Const(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// Conjunction. Narrows the candidate set child by child.
#[derive(Debug, Clone)]
pub struct FilterAnd {
    operators: Vec<FilterOp>,
    quantifier: Quantifier,
}

impl FilterAnd {
    pub fn new(operators: Vec<FilterOp>) -> Self {
        let quantifier = Quantifier::conjunction(operators.iter().map(FilterOp::quantifier));
        Self {
            operators,
            quantifier,
        }
    }

    pub fn operators(&self) -> &[FilterOp] {
        &self.operators
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        let mut candidates = set.clone();
        for (i, op) in self.operators.iter().enumerate() {
            candidates = op.apply(&candidates);
            if candidates.is_empty() {
                tracing::trace!("and: no candidates left after operand {}", i + 1);
                return candidates;
            }
        }
        candidates
    }
}

impl fmt::Display for FilterAnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "and(\n{}\n)", indent_joined(&self.operators, "\n"))
    }
}

/// Disjunction. Bundles already matched are not offered to later operands.
#[derive(Debug, Clone)]
pub struct FilterOr {
    operators: Vec<FilterOp>,
    quantifier: Quantifier,
}

impl FilterOr {
    pub fn new(operators: Vec<FilterOp>) -> Self {
        let quantifier = Quantifier::disjunction(operators.iter().map(FilterOp::quantifier));
        Self {
            operators,
            quantifier,
        }
    }

    pub fn operators(&self) -> &[FilterOp] {
        &self.operators
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        let mut result = TagBundleSet::new();
        let mut candidates = set.clone();
        for (i, op) in self.operators.iter().enumerate() {
            let matched = op.apply(&candidates);
            candidates.retain(|bundle| !matched.contains(bundle));
            result.extend(matched);
            if result.len() == set.len() {
                tracing::trace!("or: every bundle matched after operand {}", i + 1);
                return result;
            }
        }
        result
    }
}

impl fmt::Display for FilterOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "or[\n{}\n]", indent_joined(&self.operators, "\n"))
    }
}

/// Complement relative to the given set.
#[derive(Debug, Clone)]
pub struct FilterNot {
    operator: Box<FilterOp>,
    quantifier: Quantifier,
}

impl FilterNot {
    pub fn new(operator: FilterOp) -> Self {
        let quantifier = operator.quantifier().negate();
        Self {
            operator: Box::new(operator),
            quantifier,
        }
    }

    pub fn operator(&self) -> &FilterOp {
        &self.operator
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        let matched = self.operator.apply(set);
        set.difference(&matched).cloned().collect()
    }
}

impl fmt::Display for FilterNot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not(\n{}\n)", indent(&self.operator.to_string(), BASE_INDENT))
    }
}

/// Material implication `p1 & ... & p(n-1) => pn`, kept as the operands for
/// rendering and evaluated through `or[not(p1), ..., not(p(n-1)), pn]`.
#[derive(Debug, Clone)]
pub struct FilterImpl {
    operators: Vec<FilterOp>,
    desugared: Box<FilterOp>,
}

impl FilterImpl {
    pub fn new(operators: Vec<FilterOp>) -> Result<Self> {
        let Some((conclusion, premises)) = operators.split_last() else {
            return Err(FilterError::malformed_expression(
                "implication must contain at least 2 elements, got 0",
            ));
        };
        if premises.is_empty() {
            return Err(FilterError::malformed_expression(format!(
                "implication must contain at least 2 elements, got 1: {conclusion}"
            )));
        }

        let disjuncts = premises
            .iter()
            .cloned()
            .map(FilterOp::not)
            .chain(std::iter::once(conclusion.clone()))
            .collect();

        Ok(Self {
            desugared: Box::new(FilterOp::or(disjuncts)),
            operators,
        })
    }

    pub fn operators(&self) -> &[FilterOp] {
        &self.operators
    }

    pub fn desugared(&self) -> &FilterOp {
        &self.desugared
    }

    fn quantifier(&self) -> Quantifier {
        self.desugared.quantifier()
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        self.desugared.apply(set)
    }
}

impl fmt::Display for FilterImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "impl(\n{}\n)", indent_joined(&self.operators, "\n=>\n"))
    }
}

/// Named reference to a shared subexpression.
#[derive(Debug, Clone)]
pub struct FilterRef {
    name: String,
    operator: Arc<FilterOp>,
}

impl FilterRef {
    pub fn new(name: impl Into<String>, operator: FilterOp) -> Self {
        Self {
            name: name.into(),
            operator: Arc::new(operator),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &FilterOp {
        &self.operator
    }

    fn quantifier(&self) -> Quantifier {
        self.operator.quantifier()
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        self.operator.apply(set)
    }

    fn try_as_bool_op(&self) -> Option<BoolOp> {
        match self.operator.as_ref() {
            FilterOp::Const(op) => Some(BoolOp::reference(self.name.clone(), op.as_bool_op())),
            _ => None,
        }
    }
}

impl fmt::Display for FilterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ref {}(\n{}\n)",
            self.name,
            indent(&self.operator.to_string(), BASE_INDENT)
        )
    }
}

/// Match of a single tag key against a normalized value set.
#[derive(Debug, Clone)]
pub struct AtomicFilter {
    key: String,
    raw_value: ValueSpec,
    values: BTreeSet<String>,
    is_any_value: bool,
    is_optional_key: bool,
}

impl AtomicFilter {
    pub fn new(key: impl Into<String>, value: impl Into<ValueSpec>) -> Result<Self> {
        let raw_value = value.into();
        let (values, is_any_value, is_optional_key) = match normalize(&raw_value)? {
            NormalizedValues::AnyValue => (BTreeSet::new(), true, false),
            NormalizedValues::Values(mut values) => {
                let is_optional_key = values.remove(&None);
                (values.into_iter().flatten().collect(), false, is_optional_key)
            }
        };

        Ok(Self {
            key: key.into(),
            raw_value,
            values,
            is_any_value,
            is_optional_key,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn raw_value(&self) -> &ValueSpec {
        &self.raw_value
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn is_any_value(&self) -> bool {
        self.is_any_value
    }

    pub fn is_optional_key(&self) -> bool {
        self.is_optional_key
    }

    pub fn matches(&self, bundle: &TagBundle) -> bool {
        match bundle.get(&self.key) {
            None => self.is_optional_key,
            Some(value) => self.is_any_value || self.values.contains(value),
        }
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        set.iter()
            .filter(|bundle| self.matches(bundle))
            .cloned()
            .collect()
    }
}

impl fmt::Display for AtomicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any_value {
            return write!(f, "{{{} : *}}", self.key);
        }
        let values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        write!(
            f,
            "{{{} : [{}]}}, is_optional_key = {}",
            self.key,
            values.join(", "),
            self.is_optional_key
        )
    }
}

/// Constant true (everything) or false (nothing).
#[derive(Debug, Clone, Copy)]
pub struct FilterConst {
    value: bool,
}

impl FilterConst {
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    // true is neutral under AND, false is neutral under OR
    fn quantifier(&self) -> Quantifier {
        if self.value {
            Quantifier::All
        } else {
            Quantifier::Any
        }
    }

    fn apply(&self, set: &TagBundleSet) -> TagBundleSet {
        if self.value {
            set.clone()
        } else {
            TagBundleSet::new()
        }
    }

    pub fn as_bool_op(&self) -> BoolOp {
        BoolOp::Const(self.value)
    }
}

impl fmt::Display for FilterConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "const({})", self.value)
    }
}
