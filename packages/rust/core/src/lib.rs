//! Crawl-and-consolidate orchestration for SiteScout.
//!
//! This crate ties together page fetching, link discovery, semantic
//! extraction, the founder fallback, and filtering into one report per
//! seed domain (see [`orchestrator::Orchestrator`]).

pub mod orchestrator;
pub mod report;

pub use orchestrator::{Orchestrator, ProgressReporter, SilentProgress};
pub use report::{DomainReport, RunReport, SkipStage, SkippedUnit};
