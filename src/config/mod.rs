//! Filter documents: named references plus a root filter, read from YAML or JSON.
//!
//! ```yaml
//! refs:
//!   - name: "#major_road"
//!     filter: { highway: [motorway, trunk, primary] }
//!   - name: "##has_major_road"
//!     filter: "#major_road"
//! filter:
//!   implies:
//!     - "#major_road"
//!     - { surface: [paved, asphalt, concrete] }
//! ```
//!
//! Reference names must be quoted in YAML, since `#` starts a comment.

use crate::error::{FilterError, Result};
use crate::ops::FilterOp;
use crate::refs::RefRegistry;
use crate::utils::{BASE_INDENT, indent};
use crate::values::ValueSpec;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct FilterDocument {
    #[serde(default)]
    pub refs: Vec<RefDefinition>,
    #[serde(default)]
    pub filter: FilterExpr,
}

#[derive(Debug, Deserialize)]
pub struct RefDefinition {
    pub name: String,
    pub filter: FilterExpr,
}

/// One filter expression as written in a document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FilterExpr {
    Const(bool),
    Ref(String),
    And(AndExpr),
    Or(OrExpr),
    Not(NotExpr),
    Implies(ImpliesExpr),
    Constant(ConstExpr),
    /// `{key: value, ...}`: one atomic match per entry, all of which must hold.
    Tags(BTreeMap<String, ValueSpec>),
}

/// Keys that name operators and so cannot be matched as tags.
pub const OPERATOR_KEYS: [&str; 5] = ["and", "or", "not", "implies", "const"];

// Operator mappings take exactly one key; anything else is read as `Tags`.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AndExpr {
    pub and: Vec<FilterExpr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrExpr {
    pub or: Vec<FilterExpr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotExpr {
    pub not: Box<FilterExpr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImpliesExpr {
    pub implies: Vec<FilterExpr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstExpr {
    #[serde(rename = "const")]
    pub constant: ValueSpec,
}

impl Default for FilterExpr {
    fn default() -> Self {
        FilterExpr::Tags(BTreeMap::new())
    }
}

impl FilterExpr {
    /// Build the operator tree, resolving references against `refs`.
    pub fn build(&self, refs: &RefRegistry) -> Result<FilterOp> {
        match self {
            FilterExpr::Const(value) => Ok(FilterOp::constant(*value)),
            FilterExpr::Ref(name) => refs.get_filter_ref(name),
            FilterExpr::And(expr) => Ok(FilterOp::and(build_all(&expr.and, refs)?)),
            FilterExpr::Or(expr) => Ok(FilterOp::or(build_all(&expr.or, refs)?)),
            FilterExpr::Not(expr) => Ok(FilterOp::not(expr.not.build(refs)?)),
            FilterExpr::Implies(expr) => FilterOp::implies(build_all(&expr.implies, refs)?),
            FilterExpr::Constant(expr) => FilterOp::constant_from(&expr.constant),
            FilterExpr::Tags(tags) => {
                if let Some(key) = tags.keys().find(|key| OPERATOR_KEYS.contains(&key.as_str())) {
                    return Err(FilterError::malformed_expression(format!(
                        "invalid `{key}` expression: {}",
                        tags[key]
                    )));
                }
                let mut ops = tags
                    .iter()
                    .map(|(key, value)| FilterOp::atomic(key.clone(), value.clone()))
                    .collect::<Result<Vec<_>>>()?;
                if ops.len() == 1 {
                    Ok(ops.swap_remove(0))
                } else {
                    Ok(FilterOp::and(ops))
                }
            }
        }
    }
}

fn build_all(exprs: &[FilterExpr], refs: &RefRegistry) -> Result<Vec<FilterOp>> {
    exprs.iter().map(|expr| expr.build(refs)).collect()
}

impl FilterDocument {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Filters: Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Filters: Failed to parse {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Register every reference in document order, then build the root filter.
    pub fn compile(&self) -> Result<CompiledFilter> {
        let mut refs = RefRegistry::new();
        for definition in &self.refs {
            let op = definition.filter.build(&refs).inspect_err(|_| {
                tracing::warn!("Filters: reference {} is invalid", definition.name);
            })?;
            refs.set_ref(&definition.name, op)?;
        }
        let root = self.filter.build(&refs)?;
        tracing::info!(
            "Filters: compiled root {} filter ({} default) with {} reference(s)",
            root.kind(),
            root.quantifier(),
            self.refs.len()
        );
        Ok(CompiledFilter { root, refs })
    }
}

/// A built root filter together with the references it was built from.
#[derive(Debug)]
pub struct CompiledFilter {
    pub root: FilterOp,
    pub refs: RefRegistry,
}

impl CompiledFilter {
    /// Render references (sorted by name) and the root tree.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        let mut filter_refs: Vec<_> = self.refs.filter_refs().collect();
        filter_refs.sort_by_key(|(name, _)| *name);
        for (name, op) in filter_refs {
            sections.push(format!("{name}:\n{}", indent(&op.to_string(), BASE_INDENT)));
        }

        let mut bool_refs: Vec<_> = self.refs.bool_refs().collect();
        bool_refs.sort_by_key(|(name, _)| *name);
        for (name, op) in bool_refs {
            sections.push(format!("{name}:\n{}", indent(&op.to_string(), BASE_INDENT)));
        }

        sections.push(format!("filter:\n{}", indent(&self.root.to_string(), BASE_INDENT)));
        sections.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BoolOp, Operator, Quantifier};
    use crate::tags::to_tag_bundle_set;

    const ROADS: &str = r###"
refs:
  - name: "#major_road"
    filter: { highway: [motorway, trunk, primary] }
  - name: "##has_major_road"
    filter: "#major_road"
filter:
  implies:
    - "#major_road"
    - { surface: [paved, asphalt, concrete] }
"###;

    fn compile(text: &str) -> Result<CompiledFilter> {
        FilterDocument::parse(text).unwrap().compile()
    }

    #[test]
    fn compiles_references_and_root() {
        let compiled = compile(ROADS).unwrap();
        assert!(matches!(compiled.root, FilterOp::Implies(_)));
        assert!(matches!(
            compiled.refs.get_ref("##has_major_road"),
            Ok(Operator::Bool(BoolOp::Ref { .. }))
        ));

        let set = to_tag_bundle_set(&[
            &[("highway", "motorway"), ("surface", "asphalt")],
            &[("highway", "trunk"), ("surface", "gravel")],
            &[("highway", "track"), ("surface", "gravel")],
        ]);
        let expected = to_tag_bundle_set(&[
            &[("highway", "motorway"), ("surface", "asphalt")],
            &[("highway", "track"), ("surface", "gravel")],
        ]);
        assert_eq!(compiled.root.apply(&set), expected);
    }

    #[test]
    fn operator_forms() {
        let compiled = compile(
            r#"
filter:
  and:
    - or: [{ amenity: cafe }, { shop: {} }]
    - not: { access: private }
    - { wheelchair: [yes, ~] }
"#,
        )
        .unwrap();
        let set = to_tag_bundle_set(&[
            &[("amenity", "cafe")],
            &[("shop", "bakery"), ("wheelchair", "yes")],
            &[("shop", "bakery"), ("access", "private")],
            &[("shop", "kiosk"), ("wheelchair", "no")],
            &[("amenity", "bench")],
        ]);
        let expected = to_tag_bundle_set(&[
            &[("amenity", "cafe")],
            &[("shop", "bakery"), ("wheelchair", "yes")],
        ]);
        assert_eq!(compiled.root.apply(&set), expected);
        assert_eq!(compiled.root.quantifier(), Quantifier::Any);
    }

    #[test]
    fn multi_key_mapping_is_a_conjunction() {
        let compiled = compile("filter: { highway: residential, oneway: true }").unwrap();
        let FilterOp::And(and) = &compiled.root else {
            panic!("expected and, got {}", compiled.root);
        };
        assert_eq!(and.operators().len(), 2);
    }

    #[test]
    fn empty_document_matches_everything() {
        let compiled = compile("{}").unwrap();
        let set = to_tag_bundle_set(&[&[("a", "b")], &[]]);
        assert_eq!(compiled.root.apply(&set), set);
    }

    #[test]
    fn constants() {
        assert!(matches!(compile("filter: false").unwrap().root, FilterOp::Const(_)));
        assert!(matches!(
            compile("filter: { const: true }").unwrap().root,
            FilterOp::Const(_)
        ));
        assert!(matches!(
            compile("filter: { const: 1 }"),
            Err(FilterError::InvalidConstant(_))
        ));
    }

    #[test]
    fn reports_domain_errors() {
        assert!(matches!(
            compile("filter: { implies: [{ a: b }] }"),
            Err(FilterError::MalformedExpression(_))
        ));
        assert!(matches!(
            compile("filter: { highway: [[motorway]] }"),
            Err(FilterError::MalformedValue { .. })
        ));
        assert!(matches!(
            compile("filter: road"),
            Err(FilterError::SyntaxError(name)) if name == "road"
        ));
        assert!(matches!(
            compile("filter: \"#road\""),
            Err(FilterError::UnknownReference(_))
        ));
        assert!(matches!(
            compile("refs: [{ name: \"##b\", filter: true }]\nfilter: \"##b\""),
            Err(FilterError::NamespaceMismatch { .. })
        ));
    }

    #[test]
    fn operator_keys_are_reserved() {
        assert!(matches!(
            compile("filter: { and: [{ a: b }], highway: primary }"),
            Err(FilterError::MalformedExpression(_))
        ));
        assert!(matches!(
            compile("filter: { not: 5 }"),
            Err(FilterError::MalformedExpression(msg)) if msg == "invalid `not` expression: 5"
        ));
    }

    #[test]
    fn references_must_be_defined_first() {
        let text = r##"
refs:
  - name: "#b"
    filter: "#a"
  - name: "#a"
    filter: true
"##;
        assert!(matches!(compile(text), Err(FilterError::UnknownReference(_))));
    }

    #[test]
    fn render_lists_references_then_root() {
        let compiled = compile(
            r###"
refs:
  - name: "#t"
    filter: true
  - name: "##t"
    filter: "#t"
filter: "#t"
"###,
        )
        .unwrap();
        let expected = "\
#t:
  ref #t(
    const(true)
  )
##t:
  ref ##t(
    ref #t(
      const(true)
    )
  )
filter:
  ref #t(
    const(true)
  )";
        assert_eq!(compiled.render(), expected);
    }
}
