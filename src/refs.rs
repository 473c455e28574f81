//! Named references to shared subexpressions.
//!
//! Names start with `#`. Names starting with `##` live in the boolean
//! namespace, every other `#` name in the filter namespace.

use crate::error::{FilterError, Result};
use crate::ops::{BoolOp, FilterOp, Operator, as_bool_op};
use std::collections::HashMap;

/// Reference tables for one filter build. Each registry owns fresh tables.
#[derive(Debug, Default)]
pub struct RefRegistry {
    filter_refs: HashMap<String, FilterOp>,
    bool_refs: HashMap<String, BoolOp>,
}

pub fn is_ref(name: &str) -> bool {
    name.starts_with('#')
}

pub fn is_bool_ref(name: &str) -> bool {
    name.starts_with("##")
}

impl RefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_ref(&self, name: &str) -> Result<Operator> {
        if !is_ref(name) {
            return Err(FilterError::SyntaxError(name.to_string()));
        }
        let found = if is_bool_ref(name) {
            self.bool_refs.get(name).cloned().map(Operator::Bool)
        } else {
            self.filter_refs.get(name).cloned().map(Operator::Filter)
        };
        found.ok_or_else(|| FilterError::UnknownReference(name.to_string()))
    }

    /// Resolve a name that must refer to a filter.
    pub fn get_filter_ref(&self, name: &str) -> Result<FilterOp> {
        match self.get_ref(name)? {
            Operator::Filter(op) => Ok(op),
            Operator::Bool(_) => Err(FilterError::NamespaceMismatch {
                name: name.to_string(),
                reason: "a bool reference is given but a filter expression is expected",
            }),
        }
    }

    /// Bind `name` to `operator`. Rebinding an existing name overwrites it.
    pub fn set_ref(&mut self, name: &str, operator: impl Into<Operator>) -> Result<()> {
        if !is_ref(name) {
            return Err(FilterError::SyntaxError(name.to_string()));
        }
        let operator = operator.into();

        if is_bool_ref(name) {
            let bool_op = match operator {
                Operator::Filter(filter) => as_bool_op(&filter),
                Operator::Bool(op) => op,
            };
            tracing::debug!("Refs: registered bool reference {}", name);
            self.bool_refs
                .insert(name.to_string(), BoolOp::reference(name, bool_op));
        } else {
            let Operator::Filter(filter) = operator else {
                return Err(FilterError::NamespaceMismatch {
                    name: name.to_string(),
                    reason: "a bool expression is given but a filter expression is expected",
                });
            };
            tracing::debug!(
                "Refs: registered filter reference {} ({})",
                name,
                filter.kind()
            );
            self.filter_refs
                .insert(name.to_string(), FilterOp::reference(name, filter));
        }
        Ok(())
    }

    pub fn filter_refs(&self) -> impl Iterator<Item = (&str, &FilterOp)> {
        self.filter_refs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn bool_refs(&self) -> impl Iterator<Item = (&str, &BoolOp)> {
        self.bool_refs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Quantifier;
    use crate::tags::to_tag_bundle_set;

    #[test]
    fn filter_ref_round_trip() {
        let mut refs = RefRegistry::new();
        refs.set_ref("#true_ref", FilterOp::constant(true)).unwrap();

        let set = to_tag_bundle_set(&[&[("foo", "void")]]);
        let op = refs.get_filter_ref("#true_ref").unwrap();
        assert!(matches!(&op, FilterOp::Ref(r) if r.name() == "#true_ref"));
        assert_eq!(op.apply(&set), set);
        assert_eq!(op.quantifier(), Quantifier::All);
    }

    #[test]
    fn names_must_start_with_hash() {
        let mut refs = RefRegistry::new();
        assert_eq!(
            refs.set_ref("road", FilterOp::constant(true)),
            Err(FilterError::SyntaxError("road".into()))
        );
        assert!(matches!(refs.get_ref("road"), Err(FilterError::SyntaxError(_))));
    }

    #[test]
    fn unknown_reference() {
        let refs = RefRegistry::new();
        assert!(matches!(
            refs.get_ref("#missing"),
            Err(FilterError::UnknownReference(name)) if name == "#missing"
        ));
        assert!(matches!(
            refs.get_ref("##missing"),
            Err(FilterError::UnknownReference(_))
        ));
    }

    #[test]
    fn namespaces_are_disjoint() {
        let mut refs = RefRegistry::new();
        refs.set_ref("##flag", FilterOp::constant(true)).unwrap();
        assert!(matches!(refs.get_ref("#flag"), Err(FilterError::UnknownReference(_))));
        assert!(matches!(refs.get_ref("##flag"), Ok(Operator::Bool(BoolOp::Ref { .. }))));
        assert!(matches!(
            refs.get_filter_ref("##flag"),
            Err(FilterError::NamespaceMismatch { .. })
        ));
    }

    #[test]
    fn bool_op_under_filter_name_is_rejected() {
        let mut refs = RefRegistry::new();
        let err = refs.set_ref("#flag", BoolOp::Const(true)).unwrap_err();
        assert!(matches!(err, FilterError::NamespaceMismatch { name, .. } if name == "#flag"));
    }

    #[test]
    fn bool_refs_convert_filters() {
        let mut refs = RefRegistry::new();
        let residential = FilterOp::atomic("landuse", "residential").unwrap();
        refs.set_ref("##residential", residential).unwrap();

        let Ok(Operator::Bool(BoolOp::Ref { name, op })) = refs.get_ref("##residential") else {
            panic!("expected a bool reference");
        };
        assert_eq!(name, "##residential");
        assert!(matches!(op.as_ref(), BoolOp::Any(_)));

        let set = to_tag_bundle_set(&[&[("landuse", "residential")], &[("landuse", "forest")]]);
        assert!(refs.get_ref("##residential").is_ok_and(|r| match r {
            Operator::Bool(b) => b.apply(&set),
            Operator::Filter(_) => false,
        }));
    }

    #[test]
    fn bool_op_under_bool_name_is_stored_unconverted() {
        let mut refs = RefRegistry::new();
        refs.set_ref("##c", BoolOp::Const(false)).unwrap();

        let Ok(Operator::Bool(BoolOp::Ref { name, op })) = refs.get_ref("##c") else {
            panic!("expected a bool reference");
        };
        assert_eq!(name, "##c");
        assert!(matches!(op.as_ref(), BoolOp::Const(false)));
        assert_eq!(
            refs.get_ref("##c").unwrap().to_string(),
            "ref ##c(\n  const(false)\n)"
        );
    }

    #[test]
    fn registries_do_not_share_tables() {
        let mut first = RefRegistry::new();
        first.set_ref("#a", FilterOp::constant(true)).unwrap();
        let second = RefRegistry::new();
        assert!(second.get_ref("#a").is_err());
        assert!(RefRegistry::default().get_ref("#a").is_err());
    }

    #[test]
    fn rebinding_overwrites() {
        let mut refs = RefRegistry::new();
        refs.set_ref("#a", FilterOp::constant(true)).unwrap();
        refs.set_ref("#a", FilterOp::constant(false)).unwrap();
        assert_eq!(
            refs.get_filter_ref("#a").unwrap().quantifier(),
            Quantifier::Any
        );
    }
}
