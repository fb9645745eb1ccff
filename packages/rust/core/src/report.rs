//! Per-domain and per-run reports, with text and JSON rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use sitescout_extract::{ConsolidatedResult, FilteredResult};

/// Notice printed when no page of a domain yielded founder evidence.
pub const NO_FOUNDERS_NOTICE: &str = "No founders found across pages for this domain.";

/// Where in the per-page flow a unit of work was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    /// The page could not be retrieved.
    Fetch,
    /// The semantic extractor failed; the founder fallback still ran.
    Extract,
    /// The page task itself died.
    Task,
}

/// One skipped page (or skipped extraction) and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedUnit {
    pub url: String,
    pub stage: SkipStage,
    pub reason: String,
}

/// Everything reported for one seed domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    /// Seed URL as processed.
    pub seed: String,
    /// Meta description of the seed page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set when the seed page itself could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_error: Option<String>,
    /// Same-site links found on the seed page.
    pub links_discovered: usize,
    /// Pages (seed included) that were fetched and run through extraction.
    pub pages_processed: usize,
    pub founders_found: bool,
    /// Filtered, sorted output.
    pub result: FilteredResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedUnit>,
    /// Unfiltered sets the report was derived from.
    #[serde(skip)]
    pub consolidated: ConsolidatedResult,
}

impl DomainReport {
    /// Report for a domain whose seed could not be processed at all.
    pub fn unreachable(seed: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            description: None,
            seed_error: Some(error.into()),
            links_discovered: 0,
            pages_processed: 0,
            founders_found: false,
            result: FilteredResult::default(),
            skipped: Vec::new(),
            consolidated: ConsolidatedResult::default(),
        }
    }

    /// Human-readable report block.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if let Some(error) = &self.seed_error {
            let _ = writeln!(out, "Failed to retrieve {}: {error}", self.seed);
        }
        if let Some(description) = &self.description {
            let _ = writeln!(out, "Basic description (from meta): {description}");
        }
        if !self.founders_found {
            let _ = writeln!(out, "{NO_FOUNDERS_NOTICE}");
        }

        let _ = writeln!(out, "\nFinal consolidated data for {}:", self.seed);
        let _ = writeln!(out, "Products: {}", self.result.products.join(", "));
        let _ = writeln!(out, "Services: {}", self.result.services.join(", "));
        let _ = writeln!(out, "Founders: {}", self.result.founders.join(" | "));

        if !self.skipped.is_empty() {
            let _ = writeln!(out, "Skipped ({}):", self.skipped.len());
            for unit in &self.skipped {
                let stage = match unit.stage {
                    SkipStage::Fetch => "fetch",
                    SkipStage::Extract => "extract",
                    SkipStage::Task => "task",
                };
                let _ = writeln!(out, "  - [{stage}] {}: {}", unit.url, unit.reason);
            }
        }

        out
    }
}

/// Reports for a whole run, in seed order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub domains: Vec<DomainReport>,
}

impl RunReport {
    /// All domain blocks, separated by blank lines.
    pub fn render_text(&self) -> String {
        self.domains
            .iter()
            .map(DomainReport::render_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DomainReport {
        DomainReport {
            seed: "https://tonestro.com/".into(),
            description: Some("Learn an instrument.".into()),
            seed_error: None,
            links_discovered: 3,
            pages_processed: 3,
            founders_found: true,
            result: FilteredResult {
                products: vec!["Tonestro App".into(), "Tuner".into()],
                services: vec!["Music lessons".into()],
                founders: vec!["Jane Doe".into(), "John Roe".into()],
            },
            skipped: vec![SkippedUnit {
                url: "https://tonestro.com/blog".into(),
                stage: SkipStage::Fetch,
                reason: "HTTP 503".into(),
            }],
            consolidated: ConsolidatedResult::default(),
        }
    }

    #[test]
    fn text_uses_category_separators() {
        let text = sample().render_text();
        assert!(text.contains("Products: Tonestro App, Tuner"));
        assert!(text.contains("Services: Music lessons"));
        assert!(text.contains("Founders: Jane Doe | John Roe"));
        assert!(text.contains("[fetch] https://tonestro.com/blog: HTTP 503"));
        assert!(!text.contains(NO_FOUNDERS_NOTICE));
    }

    #[test]
    fn text_notes_missing_founders_and_seed_failure() {
        let report = DomainReport::unreachable("https://down.example/", "HTTP 500");
        let text = report.render_text();
        assert!(text.contains("Failed to retrieve https://down.example/: HTTP 500"));
        assert!(text.contains(NO_FOUNDERS_NOTICE));
        assert!(text.contains("Products: \n"));
    }

    #[test]
    fn json_omits_internal_sets() {
        let run = RunReport {
            generated_at: Utc::now(),
            domains: vec![sample()],
        };
        let json = run.to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");

        let domain = &value["domains"][0];
        assert_eq!(domain["seed"], "https://tonestro.com/");
        assert_eq!(domain["result"]["founders"][1], "John Roe");
        assert_eq!(domain["skipped"][0]["stage"], "fetch");
        assert!(domain.get("consolidated").is_none());
        assert!(domain.get("seed_error").is_none());
    }
}
