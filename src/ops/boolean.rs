//! Boolean operators: reduce a whole tag bundle set to a single truth value.
//!
//! Only the pieces the filter algebra converts into are modelled here.

use super::FilterOp;
use crate::tags::TagBundleSet;
use crate::utils::{BASE_INDENT, indent};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum BoolOp {
    Const(bool),
    /// Named boolean reference.
    Ref { name: String, op: Arc<BoolOp> },
    /// True if at least one bundle passes the filter.
    Any(Arc<FilterOp>),
    /// True if every bundle passes the filter (vacuously true for no bundles).
    All(Arc<FilterOp>),
}

impl BoolOp {
    pub fn reference(name: impl Into<String>, op: BoolOp) -> Self {
        BoolOp::Ref {
            name: name.into(),
            op: Arc::new(op),
        }
    }

    pub fn apply(&self, set: &TagBundleSet) -> bool {
        match self {
            BoolOp::Const(value) => *value,
            BoolOp::Ref { op, .. } => op.apply(set),
            BoolOp::Any(filter) => !filter.apply(set).is_empty(),
            BoolOp::All(filter) => filter.apply(set).len() == set.len(),
        }
    }
}

/// Convert a filter into a boolean node.
///
/// Filters that know their own boolean form (constants and references to
/// constants) use it; everything else is wrapped with its inferred quantifier.
pub fn as_bool_op(filter: &FilterOp) -> BoolOp {
    filter
        .try_as_bool_op()
        .unwrap_or_else(|| filter.quantifier().wrap(filter.clone()))
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::Const(value) => write!(f, "const({value})"),
            BoolOp::Ref { name, op } => {
                write!(f, "ref {name}(\n{}\n)", indent(&op.to_string(), BASE_INDENT))
            }
            BoolOp::Any(filter) => {
                write!(f, "ANY(\n{}\n)", indent(&filter.to_string(), BASE_INDENT))
            }
            BoolOp::All(filter) => {
                write!(f, "ALL(\n{}\n)", indent(&filter.to_string(), BASE_INDENT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::to_tag_bundle_set;

    fn residential() -> FilterOp {
        FilterOp::atomic("landuse", "residential").unwrap()
    }

    #[test]
    fn quantified_filters() {
        let mixed = to_tag_bundle_set(&[&[("landuse", "residential")], &[("landuse", "forest")]]);
        let only = to_tag_bundle_set(&[&[("landuse", "residential")]]);

        let any = BoolOp::Any(Arc::new(residential()));
        let all = BoolOp::All(Arc::new(residential()));
        assert!(any.apply(&mixed));
        assert!(!all.apply(&mixed));
        assert!(all.apply(&only));
        assert!(!any.apply(&TagBundleSet::new()));
        assert!(all.apply(&TagBundleSet::new()));
    }

    #[test]
    fn constants_convert_directly() {
        let op = as_bool_op(&FilterOp::constant(false));
        assert!(matches!(op, BoolOp::Const(false)));
    }

    #[test]
    fn other_filters_wrap_with_quantifier() {
        assert!(matches!(as_bool_op(&residential()), BoolOp::Any(_)));
        assert!(matches!(
            as_bool_op(&FilterOp::not(residential())),
            BoolOp::All(_)
        ));
        assert!(matches!(
            as_bool_op(&FilterOp::reference("#r", residential())),
            BoolOp::Any(_)
        ));
    }

    #[test]
    fn reference_to_constant_keeps_name() {
        let set = to_tag_bundle_set(&[&[("foo", "void")]]);
        let op = as_bool_op(&FilterOp::reference("#t", FilterOp::constant(true)));
        assert!(op.apply(&set));
        assert_eq!(op.to_string(), "ref #t(\n  const(true)\n)");
    }
}
