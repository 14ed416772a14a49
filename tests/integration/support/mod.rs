//! Scripted collaborators for driving the gather pipeline without a
//! network.

use std::sync::Arc;

use async_trait::async_trait;
use referencebase::models::reference::{CandidateReference, SourceKind};
use referencebase::services::ai::{CallOptions, ChatMessage, ModelClient, ModelError};
use referencebase::services::sources::{SearchFilters, SourceError, SourceFetcher};
use referencebase::{GatherSettings, ReferenceGatherer};

/// Fetcher that returns the same scripted batch for every query.
pub struct StaticFetcher {
    kind: SourceKind,
    batch: Vec<CandidateReference>,
}

impl StaticFetcher {
    pub fn new(kind: SourceKind, batch: Vec<CandidateReference>) -> Self {
        Self { kind, batch }
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        Ok(self.batch.clone())
    }
}

/// Fetcher whose every call fails, standing in for a broken provider.
pub struct FailingFetcher(pub SourceKind);

#[async_trait]
impl SourceFetcher for FailingFetcher {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        Err(SourceError::Parse("provider exploded".into()))
    }
}

/// Model client that always answers with the same scripted reply.
pub struct ScriptedModel(pub String);

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CallOptions,
    ) -> Result<String, ModelError> {
        Ok(self.0.clone())
    }
}

/// Model client whose every call fails.
pub struct BrokenModel;

#[async_trait]
impl ModelClient for BrokenModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CallOptions,
    ) -> Result<String, ModelError> {
        Err(ModelError::Transport("connection refused".into()))
    }
}

/// Candidate with enough substance to clear the validity filter.
pub fn candidate(title: &str, url: &str, kind: SourceKind) -> CandidateReference {
    let mut candidate = CandidateReference::from_source(title.into(), url.into(), kind);
    candidate.authors = Some("Ada Lovelace".into());
    candidate
}

/// Gatherer over scripted fetchers, no model attached.
pub fn gatherer(fetchers: Vec<Arc<dyn SourceFetcher>>) -> ReferenceGatherer {
    init_tracing();
    ReferenceGatherer::with_fetchers(GatherSettings::default(), fetchers, None)
}

/// Gatherer over scripted fetchers plus a scripted model.
pub fn gatherer_with_model(
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    model: Arc<dyn ModelClient>,
) -> ReferenceGatherer {
    init_tracing();
    ReferenceGatherer::with_fetchers(GatherSettings::default(), fetchers, Some(model))
}

/// Surface pipeline tracing in test output when RUST_LOG asks for it.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
