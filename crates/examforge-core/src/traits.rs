//! Seams between the engine and its collaborators.

use std::collections::{BTreeMap, BTreeSet};

/// Answers whether a blueprint's `source_files` entry refers to a loaded pool.
///
/// Implemented by [`PoolCatalog`](crate::catalog::PoolCatalog); the validator
/// only needs this much of it.
pub trait SourceResolver {
    fn resolves(&self, source_id: &str) -> bool;
}

impl SourceResolver for BTreeSet<String> {
    fn resolves(&self, source_id: &str) -> bool {
        self.contains(source_id)
    }
}

impl<V> SourceResolver for BTreeMap<String, V> {
    fn resolves(&self, source_id: &str) -> bool {
        self.contains_key(source_id)
    }
}
