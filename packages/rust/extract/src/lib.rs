//! Fragment extraction, consolidation, and noise filtering.
//!
//! This crate provides:
//! - [`SemanticExtractor`]: the pluggable page → fragments oracle, with
//!   [`OpenRouterExtractor`] as the bundled implementation
//! - [`extract_founder_sentences`]: keyword fallback for founder mentions
//! - [`ConsolidatedResult`]: per-domain set-union of fragments
//! - [`filter`]: length/word-count thresholds applied before reporting

pub mod consolidate;
pub mod filter;
pub mod heuristic;
pub mod oracle;

pub use consolidate::{ConsolidatedResult, merge};
pub use filter::{FilteredResult, filter};
pub use heuristic::extract_founder_sentences;
pub use oracle::{
    ExtractionOutcome, NoopExtractor, OpenRouterExtractor, OpenRouterOptions, SemanticExtractor,
};
