//! Per-URL fetch pipeline.
//!
//! For each URL: policy check (optional) → conditional GET → response
//! classification → Link-header canonical → markup extraction → full-row
//! persist. A 304 leaves the previous fetch record untouched; any failure
//! writes nothing. URLs are isolated from each other: one failure never
//! aborts the batch, and results are independent of processing order.

use crate::extract::{canonical_from_link_header, extract_metadata};
use crate::fetch::{HttpFetcher, canonicalize};
use crate::policy::ComplianceEngine;
use cuppy_core::{AppConfig, Error, FetchRecord, Store};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Caller-supplied switches for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Check robots.txt before fetching; a disallowed URL is not fetched.
    pub enforce_policy: bool,
    /// Skip the cached entity tag and fetch unconditionally.
    pub force_refresh: bool,
    /// Maximum number of URLs processed concurrently.
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { enforce_policy: false, force_refresh: false, max_concurrency: 4 }
    }
}

impl PipelineOptions {
    /// Options derived from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enforce_policy: config.respect_robots,
            force_refresh: false,
            max_concurrency: config.max_concurrency,
        }
    }
}

/// Terminal state of one URL's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    /// Fetched, extracted, and persisted.
    Fetched,
    /// Server answered 304; the prior record stands.
    Unmodified,
    /// Policy disallowed the fetch; nothing was fetched or written.
    Blocked,
    /// Fetch or persistence failed; nothing was written.
    Failed,
}

/// Per-URL result, reported without aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub url: String,
    pub outcome: PageOutcome,
    /// HTTP status observed, when a response was received.
    pub status: Option<u16>,
    /// Failure or block reason, for operators.
    pub reason: Option<String>,
}

/// Batch statistics across one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: u32,
    pub fetched: u32,
    pub unmodified: u32,
    pub blocked: u32,
    pub failed: u32,
}

impl RunSummary {
    fn tally(reports: &[PageReport]) -> Self {
        let mut summary = Self { total: reports.len() as u32, ..Default::default() };
        for report in reports {
            match report.outcome {
                PageOutcome::Fetched => summary.fetched += 1,
                PageOutcome::Unmodified => summary.unmodified += 1,
                PageOutcome::Blocked => summary.blocked += 1,
                PageOutcome::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Orchestrates policy checks, conditional fetches, extraction, and
/// persistence for a batch of URLs.
#[derive(Clone)]
pub struct FetchPipeline {
    store: Store,
    fetcher: Arc<dyn HttpFetcher>,
    engine: Arc<ComplianceEngine>,
    user_agent: String,
    options: PipelineOptions,
}

impl FetchPipeline {
    /// Create a pipeline over the given store and network collaborator.
    pub fn new(store: Store, fetcher: Arc<dyn HttpFetcher>, config: &AppConfig, options: PipelineOptions) -> Self {
        let engine = Arc::new(ComplianceEngine::new(store.clone(), fetcher.clone(), config));
        Self { store, fetcher, engine, user_agent: config.user_agent.clone(), options }
    }

    /// The compliance engine backing this pipeline's policy checks.
    pub fn engine(&self) -> &ComplianceEngine {
        &self.engine
    }

    /// Process a batch with bounded concurrency, preserving input order in
    /// the returned reports.
    pub async fn run(&self, urls: Vec<String>) -> (Vec<PageReport>, RunSummary) {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore closed");
            let pipeline = self.clone();
            join_set.spawn(async move {
                // NOTE: hold permit for task duration to enforce the limit
                let _permit = permit;
                (index, pipeline.process_url(&url).await)
            });
        }

        let mut indexed: Vec<(usize, PageReport)> = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(item) => indexed.push(item),
                Err(e) => tracing::error!(error = %e, "pipeline task panicked"),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);

        let reports: Vec<PageReport> = indexed.into_iter().map(|(_, report)| report).collect();
        let summary = RunSummary::tally(&reports);
        (reports, summary)
    }

    /// Run one URL through the pipeline to a terminal state.
    pub async fn process_url(&self, raw_url: &str) -> PageReport {
        let url = match canonicalize(raw_url).map_err(Error::from) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = raw_url, error = %e, "skipping invalid URL");
                return PageReport {
                    url: raw_url.to_string(),
                    outcome: PageOutcome::Failed,
                    status: None,
                    reason: Some(e.to_string()),
                };
            }
        };
        let report = |outcome, status, reason: Option<String>| PageReport {
            url: url.to_string(),
            outcome,
            status,
            reason,
        };

        if self.options.enforce_policy {
            match self.engine.can_fetch(&url).await {
                Ok(true) => tracing::debug!(url = %url, "robots.txt allows"),
                Ok(false) => {
                    tracing::info!(url = %url, "blocked by robots.txt");
                    return report(PageOutcome::Blocked, None, Some("robots.txt disallows".into()));
                }
                Err(e) => return report(PageOutcome::Failed, None, Some(e.to_string())),
            }
        }

        let mut headers = vec![
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Accept".to_string(), "text/html".to_string()),
        ];

        if self.options.force_refresh {
            tracing::debug!(url = %url, "forcing refetch, ignoring any cached etag");
        } else {
            match self.store.etag_for(url.as_str()).await {
                Ok(Some(etag)) => {
                    tracing::debug!(url = %url, etag = %etag, "sending conditional request");
                    headers.push(("If-None-Match".to_string(), etag));
                }
                Ok(None) => {}
                Err(e) => return report(PageOutcome::Failed, None, Some(e.to_string())),
            }
        }

        let response = match self.fetcher.get(&url, &headers).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "page fetch failed");
                return report(PageOutcome::Failed, None, Some(e.to_string()));
            }
        };

        match response.status {
            200 => {}
            304 => {
                tracing::info!(url = %url, "not modified, prior record stands");
                return report(PageOutcome::Unmodified, Some(304), None);
            }
            status => {
                tracing::warn!(url = %url, status, "unexpected status");
                return report(PageOutcome::Failed, Some(status), Some(format!("status {}", status)));
            }
        }

        let canonical_url_header = response.header_values("link").find_map(canonical_from_link_header);

        let body = String::from_utf8_lossy(&response.body);
        let extracted = extract_metadata(&body);

        let record = FetchRecord {
            url: url.to_string(),
            etag: response.header("etag").map(str::to_string),
            status_code: i32::from(response.status),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            title: extracted.title,
            canonical_url_header,
            canonical_url_html: extracted.canonical_url,
            og_url: extracted.og_url,
            og_title: extracted.og_title,
            description: extracted.description,
        };

        if let Err(e) = self.store.upsert_record(&record).await {
            tracing::error!(url = %url, error = %e, "failed to persist fetch record");
            return report(PageOutcome::Failed, Some(200), Some(e.to_string()));
        }

        tracing::info!(url = %url, title = record.title.as_deref().unwrap_or(""), "fetched and persisted");
        report(PageOutcome::Fetched, Some(200), None)
    }
}
