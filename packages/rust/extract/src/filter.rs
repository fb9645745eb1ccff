//! Noise filter applied to a consolidated result before it is reported.

use serde::Serialize;

use sitescout_shared::FilterRules;

use crate::consolidate::ConsolidatedResult;

/// The reported view of a [`ConsolidatedResult`]. Entries are in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredResult {
    pub products: Vec<String>,
    pub services: Vec<String>,
    pub founders: Vec<String>,
}

/// Drop noise from every category without touching the source result.
///
/// Products and services need at least `min_item_chars` characters and at most
/// `max_item_words` words. Founders need at least `min_founder_words` words,
/// which weeds out bare first names and stray tokens.
pub fn filter(consolidated: &ConsolidatedResult, rules: &FilterRules) -> FilteredResult {
    let keep_item = |s: &&String| {
        s.chars().count() >= rules.min_item_chars && word_count(s) <= rules.max_item_words
    };

    FilteredResult {
        products: consolidated.products.iter().filter(keep_item).cloned().collect(),
        services: consolidated.services.iter().filter(keep_item).cloned().collect(),
        founders: consolidated
            .founders
            .iter()
            .filter(|s| word_count(s) >= rules.min_founder_words)
            .cloned()
            .collect(),
    }
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}
