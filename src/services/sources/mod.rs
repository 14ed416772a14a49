//! Bibliographic source fetchers.
//!
//! One adapter per provider, each mapping that provider's response schema
//! into `CandidateReference`. Adapters keep the untyped-JSON handling inside
//! their own module; the rest of the pipeline only ever sees the normalized
//! shape. Internally a failed search is a typed `SourceError`; at the public
//! `fetch_or_empty` boundary it collapses to an empty batch so one broken
//! provider never takes down a gather run.

pub mod crossref;
pub mod openalex;
pub mod scholar;
pub mod semantic_scholar;

pub use crossref::CrossrefFetcher;
pub use openalex::OpenAlexFetcher;
pub use scholar::ScholarFetcher;
pub use semantic_scholar::SemanticScholarFetcher;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::HttpSettings;
use crate::models::reference::{CandidateReference, ReferenceType, SourceKind};

/// Provider-side narrowing hints. Best effort only: the filtering stage
/// remains the source of truth for language and validity.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub language: Option<String>,
    pub year_range: Option<(i32, i32)>,
    pub document_types: Vec<ReferenceType>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    Parse(String),
}

/// One bibliographic search backend.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError>;
}

/// Public fetch boundary: any failure becomes an empty batch.
pub async fn fetch_or_empty(
    fetcher: &dyn SourceFetcher,
    query: &str,
    limit: usize,
    filters: &SearchFilters,
) -> Vec<CandidateReference> {
    match fetcher.search(query, limit, filters).await {
        Ok(batch) => {
            debug!(
                source = fetcher.kind().as_str(),
                query,
                count = batch.len(),
                "provider batch"
            );
            batch
        }
        Err(err) => {
            warn!(
                source = fetcher.kind().as_str(),
                query,
                error = %err,
                "provider search failed, dropping batch"
            );
            Vec::new()
        }
    }
}

/// Raw rows requested from a provider: a little above the caller's need so
/// filtering has slack.
pub(crate) fn raw_limit(limit: usize) -> usize {
    limit.max(3)
}

pub(crate) fn build_client(http: &HttpSettings) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(http.timeout_ms))
        .user_agent(http.user_agent.clone())
        .build()?;
    Ok(client)
}

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("markup regex"));

/// Strip HTML/JATS tags from abstract text and collapse whitespace.
pub(crate) fn strip_markup(text: &str) -> String {
    let stripped = MARKUP_RE.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase a DOI and drop resolver prefixes; empty input maps to `None`.
pub(crate) fn normalize_doi(raw: &str) -> Option<String> {
    let mut doi = raw.trim().to_lowercase();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ] {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.to_string();
            break;
        }
    }
    if doi.is_empty() {
        None
    } else {
        Some(doi)
    }
}

pub(crate) fn join_authors(names: Vec<String>) -> Option<String> {
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Year-precision publication date.
pub(crate) fn year_date(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}
