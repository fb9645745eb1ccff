//! Page fetching and single-hop link discovery.
//!
//! This crate provides:
//! - [`PageFetcher`]: bounded, non-retrying HTTP retrieval that turns every
//!   transport problem into a [`FetchError`] value
//! - [`discover_links`]: same-site hyperlink collection from a seed page

pub mod fetcher;
pub mod links;

pub use fetcher::{FetchError, FetchFailure, Page, PageFetcher};
pub use links::{LinkSet, discover_links};
