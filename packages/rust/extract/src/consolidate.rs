//! Set-union merge of extracted fragments into one result per domain.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use sitescout_shared::{Category, ExtractionResult, Fragment};

/// Merge fragments into `target`, returning how many new strings were added.
///
/// Plain text is inserted as-is. For records, every string-valued field is
/// inserted; numbers, booleans, nulls, arrays and nested objects are dropped.
pub fn merge(target: &mut BTreeSet<String>, fragments: &[Fragment]) -> usize {
    let before = target.len();

    for fragment in fragments {
        match fragment {
            Fragment::Text(s) => {
                target.insert(s.clone());
            }
            Fragment::Record(fields) => {
                for value in fields.values() {
                    if let Value::String(s) = value {
                        target.insert(s.clone());
                    }
                }
            }
        }
    }

    target.len() - before
}

/// Everything gathered for one domain, across all of its pages.
///
/// Grows monotonically; nothing is ever removed. Sets are ordered so that
/// rendering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidatedResult {
    pub products: BTreeSet<String>,
    pub services: BTreeSet<String>,
    pub founders: BTreeSet<String>,
    /// Set once any page contributed founder fragments or founder sentences.
    pub founders_found: bool,
}

impl ConsolidatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set for one category.
    pub fn get(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Products => &self.products,
            Category::Services => &self.services,
            Category::Founders => &self.founders,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Products => &mut self.products,
            Category::Services => &mut self.services,
            Category::Founders => &mut self.founders,
        }
    }

    /// Merge one page's extractor output into every category.
    pub fn absorb(&mut self, result: &ExtractionResult) {
        for category in Category::ALL {
            merge(self.get_mut(category), result.bucket(category));
        }
        if !result.founders.is_empty() {
            self.founders_found = true;
        }
    }

    /// Merge founder sentences produced by the keyword fallback.
    pub fn absorb_founder_sentences(&mut self, sentences: BTreeSet<String>) {
        if !sentences.is_empty() {
            self.founders_found = true;
        }
        self.founders.extend(sentences);
    }

    /// True when no category holds anything.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.services.is_empty() && self.founders.is_empty()
    }
}
