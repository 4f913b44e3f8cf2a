//! Client code for cuppy.
//!
//! This crate provides the robots.txt compliance engine, the conditional
//! fetch client, the streaming metadata extractor, and the per-URL fetch
//! pipeline that ties them together.

pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod policy;

pub use extract::{ExtractionResult, extract_metadata};
pub use fetch::{FetchConfig, HttpFetcher, HttpResponse, ReqwestFetcher};
pub use pipeline::{FetchPipeline, PageOutcome, PageReport, PipelineOptions, RunSummary};
pub use policy::{ComplianceEngine, RuleSet};
