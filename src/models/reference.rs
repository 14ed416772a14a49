use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bibliographic provider a candidate was discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OpenAlex,
    SemanticScholar,
    Crossref,
    Scholar,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OpenAlex => "openalex",
            SourceKind::SemanticScholar => "semantic_scholar",
            SourceKind::Crossref => "crossref",
            SourceKind::Scholar => "scholar",
        }
    }

    /// Fixed credibility bonus granted to records from this provider.
    pub fn credibility_bonus(&self) -> i32 {
        match self {
            SourceKind::OpenAlex => 15,
            SourceKind::SemanticScholar => 12,
            SourceKind::Crossref => 8,
            SourceKind::Scholar => 0,
        }
    }
}

/// Coarse publication category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Journal,
    Conference,
    Preprint,
    Book,
    Dataset,
    #[default]
    Other,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Journal => "journal",
            ReferenceType::Conference => "conference",
            ReferenceType::Preprint => "preprint",
            ReferenceType::Book => "book",
            ReferenceType::Dataset => "dataset",
            ReferenceType::Other => "other",
        }
    }
}

/// One discovered bibliographic record, pre-persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReference {
    pub id: Uuid,
    /// Outline section the record was gathered for; empty until orchestration
    /// assigns it.
    #[serde(default)]
    pub section_key: String,
    pub title: String,
    pub url: String,
    /// Normalized identifier (lowercased, resolver prefix stripped); primary
    /// dedup key when present.
    #[serde(default)]
    pub doi: Option<String>,
    /// Venue/container name.
    #[serde(default)]
    pub source: Option<String>,
    /// Joined free-text author list.
    #[serde(default)]
    pub authors: Option<String>,
    /// Year precision is acceptable (January 1st when only a year is known).
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub reference_type: ReferenceType,
    /// Abstract/snippet text, markup stripped.
    #[serde(default)]
    pub summary: Option<String>,
    /// 0-100, computed by the scorer, never caller- or provider-supplied.
    #[serde(default)]
    pub credibility: u8,
    /// Lowercase language tag, or empty when the provider reports none.
    #[serde(default)]
    pub language: String,
    /// Provider the record came from. Cleared before the record leaves the core.
    #[serde(skip)]
    pub origin: Option<SourceKind>,
    /// Composite ranking value. Cleared before the record leaves the core.
    #[serde(skip)]
    pub score: Option<f64>,
}

impl CandidateReference {
    /// Blank record tied to the fetcher that produced it; adapters fill in
    /// the provider-specific fields.
    pub fn from_source(title: String, url: String, origin: SourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            section_key: String::new(),
            title,
            url,
            doi: None,
            source: None,
            authors: None,
            published_at: None,
            reference_type: ReferenceType::default(),
            summary: None,
            credibility: 0,
            language: String::new(),
            origin: Some(origin),
            score: None,
        }
    }

    pub fn metadata_summary(&self) -> String {
        format!(
            "{} ({})",
            self.title,
            self.year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "n.d.".into())
        )
    }

    pub fn year(&self) -> Option<i32> {
        self.published_at.map(|date| date.year())
    }
}

/// Per-call knobs for one gather run. Everything is an explicit field so
/// tests can toggle behavior call by call; there are no ambient switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherOptions {
    /// Number of references the caller wants back for the section.
    #[serde(default = "default_need")]
    pub need: usize,
    /// Providers to fan out to, in dedup-priority order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceKind>,
    /// Widen the query set with a generative-model call.
    #[serde(default)]
    pub use_model_expansion: bool,
    /// Re-rank the lexical top of the pool with a generative-model call.
    #[serde(default)]
    pub use_model_rerank: bool,
    /// Force AI/ML-domain coverage in queries, filtering, and scoring.
    #[serde(default)]
    pub topic_lock: bool,
    /// Target language; "English" is the only defined discriminator.
    #[serde(default)]
    pub language: Option<String>,
    /// Carried through to providers that support a region filter; none of
    /// the built-in ones currently do.
    #[serde(default)]
    pub region: Option<String>,
    /// Inclusive publication-year window, forwarded to providers as a hint.
    #[serde(default)]
    pub year_range: Option<(i32, i32)>,
    /// Preferred publication categories, forwarded to providers as a hint.
    #[serde(default)]
    pub document_types: Vec<ReferenceType>,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            need: default_need(),
            sources: default_sources(),
            use_model_expansion: false,
            use_model_rerank: false,
            topic_lock: false,
            language: None,
            region: None,
            year_range: None,
            document_types: Vec::new(),
        }
    }
}

fn default_need() -> usize {
    5
}

fn default_sources() -> Vec<SourceKind> {
    vec![
        SourceKind::OpenAlex,
        SourceKind::SemanticScholar,
        SourceKind::Crossref,
    ]
}
