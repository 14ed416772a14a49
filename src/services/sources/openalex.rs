//! OpenAlex works adapter.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    join_authors, normalize_doi, raw_limit, year_date, SearchFilters, SourceError, SourceFetcher,
};
use crate::config::HttpSettings;
use crate::models::reference::{CandidateReference, ReferenceType, SourceKind};
use crate::services::language::is_english_tag;

const ENDPOINT: &str = "https://api.openalex.org/works";

pub struct OpenAlexFetcher {
    client: reqwest::Client,
    mailto: Option<String>,
}

impl OpenAlexFetcher {
    pub fn new(http: &HttpSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_client(http)?,
            mailto: http.mailto.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for OpenAlexFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenAlex
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        let per_page = raw_limit(limit).to_string();
        let mut request = self
            .client
            .get(ENDPOINT)
            .query(&[("search", query), ("per-page", per_page.as_str())]);

        let mut filter_parts: Vec<String> = Vec::new();
        if let Some(language) = &filters.language {
            if is_english_tag(language) {
                filter_parts.push("language:en".into());
            }
        }
        if let Some((from, to)) = filters.year_range {
            filter_parts.push(format!("from_publication_date:{from}-01-01"));
            filter_parts.push(format!("to_publication_date:{to}-12-31"));
        }
        if !filter_parts.is_empty() {
            request = request.query(&[("filter", filter_parts.join(","))]);
        }
        if let Some(mailto) = &self.mailto {
            request = request.query(&[("mailto", mailto)]);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Parse("missing results array".into()))?;
        Ok(results.iter().filter_map(map_work).collect())
    }
}

fn map_work(work: &Value) -> Option<CandidateReference> {
    let title = work
        .get("display_name")
        .or_else(|| work.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let landing = work
        .get("primary_location")
        .and_then(|l| l.get("landing_page_url"))
        .and_then(Value::as_str);
    let url = landing
        .or_else(|| work.get("id").and_then(Value::as_str))
        .map(str::trim)
        .filter(|u| !u.is_empty())?;

    let mut candidate =
        CandidateReference::from_source(title.to_string(), url.to_string(), SourceKind::OpenAlex);

    candidate.doi = work
        .get("doi")
        .and_then(Value::as_str)
        .and_then(normalize_doi);
    candidate.source = work
        .get("primary_location")
        .and_then(|l| l.get("source"))
        .and_then(|s| s.get("display_name"))
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    candidate.authors = join_authors(
        work.get("authorships")
            .and_then(Value::as_array)
            .map(|authorships| {
                authorships
                    .iter()
                    .filter_map(|a| {
                        a.get("author")
                            .and_then(|author| author.get("display_name"))
                            .and_then(Value::as_str)
                            .map(|name| name.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default(),
    );
    candidate.published_at = work
        .get("publication_date")
        .and_then(Value::as_str)
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .or_else(|| {
            work.get("publication_year")
                .and_then(Value::as_i64)
                .and_then(|y| year_date(y as i32))
        });
    candidate.reference_type = map_type(work.get("type").and_then(Value::as_str).unwrap_or(""));
    candidate.summary = work
        .get("abstract_inverted_index")
        .and_then(reconstruct_abstract);
    candidate.language = work
        .get("language")
        .and_then(Value::as_str)
        .map(|l| l.to_lowercase())
        .unwrap_or_default();
    Some(candidate)
}

fn map_type(raw: &str) -> ReferenceType {
    match raw {
        "article" | "review" => ReferenceType::Journal,
        "proceedings-article" => ReferenceType::Conference,
        "preprint" => ReferenceType::Preprint,
        "book" | "book-chapter" | "monograph" => ReferenceType::Book,
        "dataset" => ReferenceType::Dataset,
        _ => ReferenceType::Other,
    }
}

/// OpenAlex ships abstracts as word -> positions; rebuild the running text.
fn reconstruct_abstract(index: &Value) -> Option<String> {
    let object = index.as_object()?;
    let mut slots: Vec<(u64, &str)> = Vec::new();
    for (word, positions) in object {
        let positions = positions.as_array()?;
        for position in positions {
            slots.push((position.as_u64()?, word));
        }
    }
    if slots.is_empty() {
        return None;
    }
    slots.sort_by_key(|(position, _)| *position);
    Some(
        slots
            .iter()
            .map(|(_, word)| *word)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
