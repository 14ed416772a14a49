//! Section-scoped reference gathering.
//!
//! One gather call expands the section seed into queries, fans every
//! (query, source) pair out concurrently, then normalizes, scores, and
//! truncates the pooled results. The fan-out is awaited as a single batch
//! and the pool is assembled in logical loop order, so dedup priority is
//! reproducible regardless of network completion order.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use futures::future::join_all;
use tracing::debug;
use uuid::Uuid;

use crate::config::GatherSettings;
use crate::models::reference::{CandidateReference, GatherOptions, SourceKind};
use crate::services::ai::{CallOptions, ModelClient};
use crate::services::expansion::expand;
use crate::services::filtering::{normalize_pool, TOPIC_VOCABULARY};
use crate::services::scoring::score_and_rank;
use crate::services::sources::{
    fetch_or_empty, CrossrefFetcher, OpenAlexFetcher, ScholarFetcher, SearchFilters,
    SemanticScholarFetcher, SourceFetcher,
};

const MIN_PER_QUERY_NEED: usize = 2;

pub struct ReferenceGatherer {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    model: Option<Arc<dyn ModelClient>>,
    settings: GatherSettings,
}

impl ReferenceGatherer {
    /// Gatherer wired to the built-in provider fetchers.
    pub fn new(settings: GatherSettings) -> anyhow::Result<Self> {
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![
            Arc::new(OpenAlexFetcher::new(&settings.http)?),
            Arc::new(SemanticScholarFetcher::new(&settings.http)?),
            Arc::new(CrossrefFetcher::new(&settings.http)?),
            Arc::new(ScholarFetcher),
        ];
        Ok(Self {
            fetchers,
            model: None,
            settings,
        })
    }

    /// Attach the generative-model collaborator used for query expansion and
    /// re-ranking. Without one, both features silently stay deterministic.
    pub fn with_model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    /// Caller-supplied fetcher set; tests inject scripted sources here.
    pub fn with_fetchers(
        settings: GatherSettings,
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        model: Option<Arc<dyn ModelClient>>,
    ) -> Self {
        Self {
            fetchers,
            model,
            settings,
        }
    }

    /// Gather up to `options.need` ranked references for one outline
    /// section. Infallible: provider and model failures degrade to smaller
    /// result sets, worst case an empty one.
    pub async fn gather_for_section(
        &self,
        document_title: &str,
        outline: &str,
        section_key: &str,
        options: &GatherOptions,
    ) -> Vec<CandidateReference> {
        let request_id = Uuid::new_v4();
        let hint = super::outline::section_hint(outline, section_key);
        let seed = [document_title, section_key, hint.as_str()]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let call = self.call_options();
        let queries = expand(
            &seed,
            self.model.as_deref(),
            &call,
            options.use_model_expansion,
            options.topic_lock,
        )
        .await;
        if queries.is_empty() {
            return Vec::new();
        }

        let per_query_need =
            MIN_PER_QUERY_NEED.max(options.need.div_ceil(queries.len()));
        let filters = SearchFilters {
            language: options.language.clone(),
            year_range: options.year_range,
            document_types: options.document_types.clone(),
        };
        let enabled = self.enabled_fetchers(&options.sources);

        let mut calls = Vec::new();
        for query in &queries {
            for fetcher in &enabled {
                calls.push(fetch_or_empty(
                    fetcher.as_ref(),
                    query,
                    per_query_need,
                    &filters,
                ));
            }
        }
        let raw_pool: Vec<CandidateReference> =
            join_all(calls).await.into_iter().flatten().collect();
        debug!(
            %request_id,
            section = section_key,
            queries = queries.len(),
            sources = enabled.len(),
            pool = raw_pool.len(),
            "pooled provider results"
        );

        let filtered = normalize_pool(
            raw_pool,
            options.language.as_deref(),
            options.topic_lock,
            options.need,
        );

        let mut context = format!("{document_title}\n{hint}");
        if options.topic_lock {
            context.push('\n');
            context.push_str(&TOPIC_VOCABULARY.join(" "));
        }

        let mut ranked = score_and_rank(
            filtered,
            &context,
            self.model.as_deref(),
            &call,
            options.use_model_rerank,
            options.topic_lock,
            Utc::now().year(),
        )
        .await;
        ranked.truncate(options.need);

        for candidate in &mut ranked {
            candidate.section_key = section_key.to_string();
            candidate.origin = None;
            candidate.score = None;
        }
        debug!(
            %request_id,
            section = section_key,
            returned = ranked.len(),
            "gather complete"
        );
        ranked
    }

    /// Run the section pipeline once per outline section, independently, and
    /// aggregate in outline order. No ranking state is shared across
    /// sections.
    pub async fn gather_for_document(
        &self,
        document_title: &str,
        outline: &str,
        options: &GatherOptions,
    ) -> Vec<CandidateReference> {
        let mut all = Vec::new();
        for section_key in super::outline::section_keys(outline) {
            let mut batch = self
                .gather_for_section(document_title, outline, &section_key, options)
                .await;
            all.append(&mut batch);
        }
        all
    }

    /// Enabled fetchers in the caller's source order, which is also dedup
    /// priority order.
    fn enabled_fetchers(&self, sources: &[SourceKind]) -> Vec<Arc<dyn SourceFetcher>> {
        sources
            .iter()
            .filter_map(|kind| {
                self.fetchers
                    .iter()
                    .find(|fetcher| fetcher.kind() == *kind)
                    .cloned()
            })
            .collect()
    }

    fn call_options(&self) -> CallOptions {
        CallOptions {
            model: self.settings.model.model.clone(),
            temperature: self.settings.model.temperature,
            timeout_ms: self.settings.model.timeout_ms,
        }
    }
}
