//! Tag bundles: the flat key/value records that filters select from.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// An immutable tag map. Cloning is cheap; equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TagBundle {
    tags: Arc<BTreeMap<String, String>>,
}

/// Unordered collection of unique tag bundles.
pub type TagBundleSet = HashSet<TagBundle>;

impl TagBundle {
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self {
            tags: Arc::new(tags),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for TagBundle
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for TagBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

/// Build a bundle set from borrowed key/value pairs, collapsing duplicates.
pub fn to_tag_bundle_set(bundles: &[&[(&str, &str)]]) -> TagBundleSet {
    bundles
        .iter()
        .map(|pairs| pairs.iter().copied().collect())
        .collect()
}
