//! Set-based tag filters for OSM-style tag bundles.
//!
//! A filter tree is built from atomic tag matches combined with and/or/not/
//! implication, constants and named references, then applied to a set of tag
//! bundles to select the matching subset.

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod ops;
pub mod refs;
pub mod sinks;
pub mod tags;
pub mod utils;
pub mod values;

pub use error::{FilterError, Result};
pub use ops::{BoolOp, FilterOp, Operator, Quantifier};
pub use refs::RefRegistry;
pub use tags::{TagBundle, TagBundleSet};
pub use values::ValueSpec;
