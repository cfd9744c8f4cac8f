//! Static analysis of parsed cells.
//!
//! All passes work on the tree produced by [`crate::parse`] and report
//! byte offsets into the cell source:
//!
//! - [`find_references`]: free identifiers, which become cell inputs
//! - [`find_declarations`]: top-level bindings, which become cell outputs
//! - [`check_assignments`]: rejects writes to bindings the cell does not own
//! - [`find_awaits`]: suspension points that make the cell asynchronous

mod assignments;
mod awaits;
mod bindings;
mod declarations;
mod globals;
mod references;

use std::ops::Range;

use serde::Serialize;

pub use assignments::check_assignments;
pub use awaits::find_awaits;
pub use declarations::find_declarations;
pub use globals::is_default_global;
pub use references::find_references;

/// An identifier occurrence in the cell source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub name: String,
    /// Byte range of the identifier.
    pub range: Range<usize>,
}

/// Names of `references` without duplicates, in first-occurrence order.
pub fn unique_names(references: &[Reference]) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    references
        .iter()
        .filter(|r| seen.insert(r.name.as_str()))
        .map(|r| r.name.clone())
        .collect()
}
