//! Semantic Scholar Graph API adapter.

use async_trait::async_trait;
use serde_json::Value;

use super::{join_authors, normalize_doi, raw_limit, year_date, SearchFilters, SourceError, SourceFetcher};
use crate::config::HttpSettings;
use crate::models::reference::{CandidateReference, ReferenceType, SourceKind};

const ENDPOINT: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const FIELDS: &str = "title,abstract,url,year,venue,authors,externalIds,publicationTypes";

pub struct SemanticScholarFetcher {
    client: reqwest::Client,
}

impl SemanticScholarFetcher {
    pub fn new(http: &HttpSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_client(http)?,
        })
    }
}

#[async_trait]
impl SourceFetcher for SemanticScholarFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::SemanticScholar
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        let limit_param = raw_limit(limit).to_string();
        let mut request = self.client.get(ENDPOINT).query(&[
            ("query", query),
            ("limit", limit_param.as_str()),
            ("fields", FIELDS),
        ]);
        if let Some((from, to)) = filters.year_range {
            request = request.query(&[("year", format!("{from}-{to}"))]);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Parse("missing data array".into()))?;
        Ok(data.iter().filter_map(map_paper).collect())
    }
}

fn map_paper(paper: &Value) -> Option<CandidateReference> {
    let title = paper
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let paper_id = paper.get("paperId").and_then(Value::as_str);
    let url = paper
        .get("url")
        .and_then(Value::as_str)
        .map(|u| u.to_string())
        .or_else(|| paper_id.map(|id| format!("https://www.semanticscholar.org/paper/{id}")))?;

    let mut candidate =
        CandidateReference::from_source(title.to_string(), url, SourceKind::SemanticScholar);

    candidate.doi = paper
        .get("externalIds")
        .and_then(|ids| ids.get("DOI"))
        .and_then(Value::as_str)
        .and_then(normalize_doi);
    candidate.source = paper
        .get("venue")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());
    candidate.authors = join_authors(
        paper
            .get("authors")
            .and_then(Value::as_array)
            .map(|authors| {
                authors
                    .iter()
                    .filter_map(|a| a.get("name").and_then(Value::as_str).map(|n| n.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
    );
    candidate.published_at = paper
        .get("year")
        .and_then(Value::as_i64)
        .and_then(|y| year_date(y as i32));
    candidate.reference_type = paper
        .get("publicationTypes")
        .and_then(Value::as_array)
        .and_then(|types| types.first())
        .and_then(Value::as_str)
        .map(map_type)
        .unwrap_or_default();
    candidate.summary = paper
        .get("abstract")
        .and_then(Value::as_str)
        .map(super::strip_markup)
        .filter(|s| !s.is_empty());
    // The graph API does not report a record language; the filter heuristic
    // judges the text instead.
    Some(candidate)
}

fn map_type(raw: &str) -> ReferenceType {
    match raw {
        "JournalArticle" | "Review" => ReferenceType::Journal,
        "Conference" => ReferenceType::Conference,
        "Book" | "BookSection" => ReferenceType::Book,
        "Dataset" => ReferenceType::Dataset,
        _ => ReferenceType::Other,
    }
}
