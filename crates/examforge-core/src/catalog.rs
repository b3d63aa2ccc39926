//! Loaded pools and per-section candidate views.
//!
//! A [`PoolCatalog`] is built once, before any selection, and is never
//! mutated by a run. Runs read it through a [`SectionPool`], a canonicalized
//! merge of the pools named by one section.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AssemblyError;
use crate::model::{CompositeSet, Question, QuestionPool};
use crate::traits::SourceResolver;

/// Every normalized pool, keyed by source identifier.
#[derive(Debug, Clone, Default)]
pub struct PoolCatalog {
    pools: BTreeMap<String, QuestionPool>,
}

impl PoolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool under its own source id, replacing any previous pool.
    pub fn insert(&mut self, pool: QuestionPool) {
        self.pools.insert(pool.source.clone(), pool);
    }

    pub fn get(&self, source_id: &str) -> Option<&QuestionPool> {
        self.pools.get(source_id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &QuestionPool> {
        self.pools.values()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Merge the named sources into one canonical candidate view.
    ///
    /// Standalone questions are sorted by id within each topic and composite
    /// sets by set id, so the view does not depend on file or source order.
    /// A question id or set id seen in an earlier source is dropped.
    pub fn section_view<'a>(&'a self, source_files: &[String]) -> Result<SectionPool<'a>, AssemblyError> {
        let mut standalone: BTreeMap<&'a str, Vec<&'a Question>> = BTreeMap::new();
        let mut composite: Vec<&'a CompositeSet> = Vec::new();
        let mut seen_questions = BTreeSet::new();
        let mut seen_sets = BTreeSet::new();

        for source in source_files {
            let pool = self.get(source).ok_or_else(|| {
                AssemblyError::blueprint(None, "unresolvable source file", "loaded pool", source)
            })?;

            for (topic, questions) in &pool.standalone {
                for question in questions {
                    if seen_questions.insert(question.id.as_str()) {
                        standalone.entry(topic.as_str()).or_default().push(question);
                    } else {
                        tracing::warn!(
                            question_id = %question.id,
                            source = %source,
                            "duplicate question id, keeping first occurrence"
                        );
                    }
                }
            }

            for set in pool.composite_sets() {
                if seen_sets.insert(set.set_id.as_str()) {
                    composite.push(set);
                } else {
                    tracing::warn!(
                        set_id = %set.set_id,
                        source = %source,
                        "duplicate composite set id, keeping first occurrence"
                    );
                }
            }
        }

        for questions in standalone.values_mut() {
            questions.sort_by(|a, b| a.id.cmp(&b.id));
        }
        composite.sort_by(|a, b| a.set_id.cmp(&b.set_id));

        Ok(SectionPool {
            standalone,
            composite,
        })
    }
}

impl SourceResolver for PoolCatalog {
    fn resolves(&self, source_id: &str) -> bool {
        self.pools.contains_key(source_id)
    }
}

impl FromIterator<QuestionPool> for PoolCatalog {
    fn from_iter<I: IntoIterator<Item = QuestionPool>>(iter: I) -> Self {
        let mut catalog = PoolCatalog::new();
        for pool in iter {
            catalog.insert(pool);
        }
        catalog
    }
}

/// Canonical, borrowed candidates for one section.
#[derive(Debug, Clone)]
pub struct SectionPool<'a> {
    standalone: BTreeMap<&'a str, Vec<&'a Question>>,
    composite: Vec<&'a CompositeSet>,
}

impl<'a> SectionPool<'a> {
    /// Standalone candidates for `topic`, sorted by id. Empty if unknown.
    pub fn topic(&self, topic: &str) -> &[&'a Question] {
        self.standalone.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Composite candidates, sorted by set id.
    pub fn composite(&self) -> &[&'a CompositeSet] {
        &self.composite
    }
}
