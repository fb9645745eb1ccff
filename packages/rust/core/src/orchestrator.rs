//! Per-domain crawl-and-consolidate pipeline.
//!
//! For each seed: fetch the seed page, collect its same-site links, run the
//! semantic extractor on the seed and on every link, fall back to the founder
//! keyword heuristic for any page without extracted founders, merge it all,
//! and filter the result. A failing page is recorded and skipped; only an
//! unreachable seed empties a domain's result.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use sitescout_crawler::{FetchError, Page, PageFetcher, discover_links};
use sitescout_extract::{
    ConsolidatedResult, ExtractionOutcome, SemanticExtractor, extract_founder_sentences, filter,
};
use sitescout_shared::{PipelineConfig, Result};

use crate::report::{DomainReport, RunReport, SkipStage, SkippedUnit};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a domain starts processing.
    fn domain_started(&self, seed: &str);
    /// Called after each page of a domain (seed first) is done, successful or not.
    fn page_done(&self, seed: &str, url: &str, current: usize, total: usize);
    /// Called when a domain's report is ready.
    fn domain_finished(&self, report: &DomainReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn domain_started(&self, _seed: &str) {}
    fn page_done(&self, _seed: &str, _url: &str, _current: usize, _total: usize) {}
    fn domain_finished(&self, _report: &DomainReport) {}
}

// ---------------------------------------------------------------------------
// Page-level work
// ---------------------------------------------------------------------------

/// What one fetched page contributed.
#[derive(Debug)]
struct PageOutcome {
    url: String,
    extraction: ExtractionOutcome,
    /// Founder sentences from the keyword fallback; `None` when it did not run.
    fallback: Option<BTreeSet<String>>,
}

enum LinkOutcome {
    Fetched(PageOutcome),
    FetchFailed(FetchError),
}

/// Run the extractor on a page, falling back to the keyword heuristic when it
/// yields no founders. The extractor call is bounded by `timeout`.
async fn extract_page(
    page: Page,
    extractor: &dyn SemanticExtractor,
    timeout: Duration,
) -> PageOutcome {
    let extraction =
        match tokio::time::timeout(timeout, extractor.extract(&page.url, &page.text)).await {
            Ok(outcome) => outcome,
            Err(_) => ExtractionOutcome::Failure(format!(
                "timed out after {}s",
                timeout.as_secs_f64()
            )),
        };

    match &extraction {
        ExtractionOutcome::Success(result) => debug!(
            url = %page.url,
            products = result.products.len(),
            services = result.services.len(),
            founders = result.founders.len(),
            "extraction succeeded"
        ),
        ExtractionOutcome::Empty => {
            info!(url = %page.url, extractor = extractor.name(), "no data returned by extractor")
        }
        ExtractionOutcome::Failure(cause) => {
            warn!(url = %page.url, extractor = extractor.name(), %cause, "extraction failed")
        }
    }

    let fallback = (extraction.founder_count() == 0).then(|| {
        let sentences = extract_founder_sentences(&page.text);
        debug!(url = %page.url, found = sentences.len(), "founder keyword fallback ran");
        sentences
    });

    PageOutcome {
        url: page.url,
        extraction,
        fallback,
    }
}

async fn process_link(
    fetcher: &PageFetcher,
    extractor: &dyn SemanticExtractor,
    url: &str,
    timeout: Duration,
) -> LinkOutcome {
    match fetcher.fetch(url).await {
        Ok(page) => LinkOutcome::Fetched(extract_page(page, extractor, timeout).await),
        Err(e) => LinkOutcome::FetchFailed(e),
    }
}

// ---------------------------------------------------------------------------
// Domain accumulator
// ---------------------------------------------------------------------------

/// Single-writer state for one domain. Only the domain's own task touches it.
#[derive(Debug, Default)]
struct DomainState {
    consolidated: ConsolidatedResult,
    pages_processed: usize,
    skipped: Vec<SkippedUnit>,
}

impl DomainState {
    fn absorb(&mut self, page: PageOutcome) {
        self.pages_processed += 1;

        match page.extraction {
            ExtractionOutcome::Success(result) => self.consolidated.absorb(&result),
            ExtractionOutcome::Empty => {}
            ExtractionOutcome::Failure(reason) => self.skipped.push(SkippedUnit {
                url: page.url.clone(),
                stage: SkipStage::Extract,
                reason,
            }),
        }

        if let Some(sentences) = page.fallback {
            self.consolidated.absorb_founder_sentences(sentences);
        }
    }

    fn skip(&mut self, url: impl Into<String>, stage: SkipStage, reason: impl Into<String>) {
        self.skipped.push(SkippedUnit {
            url: url.into(),
            stage,
            reason: reason.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives the pipeline for one or many seed domains.
///
/// Cheap to clone: the HTTP client and the extractor are shared.
#[derive(Clone)]
pub struct Orchestrator {
    config: PipelineConfig,
    fetcher: PageFetcher,
    extractor: Arc<dyn SemanticExtractor>,
}

impl Orchestrator {
    /// Create an orchestrator. Fails only if the HTTP client cannot be built.
    pub fn new(config: PipelineConfig, extractor: Arc<dyn SemanticExtractor>) -> Result<Self> {
        let fetcher = PageFetcher::new(config.fetch_timeout)?;
        Ok(Self {
            config,
            fetcher,
            extractor,
        })
    }

    /// Process every seed, up to `domain_concurrency` at a time.
    /// Reports come back in seed order.
    #[instrument(skip_all, fields(domains = seeds.len()))]
    pub async fn run(&self, seeds: &[Url], progress: Arc<dyn ProgressReporter>) -> RunReport {
        let semaphore = Arc::new(Semaphore::new(self.config.domain_concurrency));
        let mut handles = Vec::with_capacity(seeds.len());

        for seed in seeds {
            let this = self.clone();
            let seed = seed.clone();
            let sem = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);

            handles.push((
                seed.to_string(),
                tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await;
                    this.process_domain(&seed, progress.as_ref()).await
                }),
            ));
        }

        let mut domains = Vec::with_capacity(handles.len());
        for (seed, handle) in handles {
            match handle.await {
                Ok(report) => domains.push(report),
                Err(e) => {
                    error!(%seed, error = %e, "domain task failed");
                    domains.push(DomainReport::unreachable(seed, format!("task failed: {e}")));
                }
            }
        }

        RunReport {
            generated_at: Utc::now(),
            domains,
        }
    }

    /// Process one seed domain end to end.
    #[instrument(skip_all, fields(seed = %seed))]
    pub async fn process_domain(
        &self,
        seed: &Url,
        progress: &dyn ProgressReporter,
    ) -> DomainReport {
        let base_url = seed.to_string();
        progress.domain_started(&base_url);
        info!("processing domain");

        let seed_page = match self.fetcher.fetch(&base_url).await {
            Ok(page) => page,
            Err(e) => {
                let report = DomainReport::unreachable(&base_url, e.cause.to_string());
                info!("no founders found across pages for this domain");
                progress.domain_finished(&report);
                return report;
            }
        };

        let description = seed_page.description.clone();
        let links = discover_links(&seed_page.html, &base_url);
        let links_discovered = links.len();
        let total = links_discovered + 1;

        let mut state = DomainState::default();

        let seed_outcome =
            extract_page(seed_page, self.extractor.as_ref(), self.config.extract_timeout).await;
        state.absorb(seed_outcome);
        progress.page_done(&base_url, &base_url, 1, total);

        // Linked pages run concurrently; results are merged here, one at a time.
        let semaphore = Arc::new(Semaphore::new(self.config.link_concurrency));
        let mut handles = Vec::with_capacity(links_discovered);

        for link in links {
            let fetcher = self.fetcher.clone();
            let extractor = Arc::clone(&self.extractor);
            let sem = Arc::clone(&semaphore);
            let timeout = self.config.extract_timeout;
            let url = link.clone();

            handles.push((
                link,
                tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await;
                    debug!(%url, "processing linked page");
                    process_link(&fetcher, extractor.as_ref(), &url, timeout).await
                }),
            ));
        }

        for (i, (link, handle)) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(LinkOutcome::Fetched(page)) => state.absorb(page),
                Ok(LinkOutcome::FetchFailed(e)) => {
                    state.skip(e.url, SkipStage::Fetch, e.cause.to_string());
                }
                Err(e) => {
                    warn!(url = %link, error = %e, "page task failed");
                    state.skip(link.clone(), SkipStage::Task, e.to_string());
                }
            }
            progress.page_done(&base_url, &link, i + 2, total);
        }

        let report = DomainReport {
            seed: base_url,
            description,
            seed_error: None,
            links_discovered,
            pages_processed: state.pages_processed,
            founders_found: state.consolidated.founders_found,
            result: filter(&state.consolidated, &self.config.filter),
            skipped: state.skipped,
            consolidated: state.consolidated,
        };

        if !report.founders_found {
            info!("no founders found across pages for this domain");
        }
        info!(
            pages_processed = report.pages_processed,
            skipped = report.skipped.len(),
            products = report.result.products.len(),
            services = report.result.services.len(),
            founders = report.result.founders.len(),
            "domain complete"
        );

        progress.domain_finished(&report);
        report
    }
}
