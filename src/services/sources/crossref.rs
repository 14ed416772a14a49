//! Crossref works adapter.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    join_authors, normalize_doi, raw_limit, strip_markup, year_date, SearchFilters, SourceError,
    SourceFetcher,
};
use crate::config::HttpSettings;
use crate::models::reference::{CandidateReference, ReferenceType, SourceKind};

const ENDPOINT: &str = "https://api.crossref.org/works";

pub struct CrossrefFetcher {
    client: reqwest::Client,
    mailto: Option<String>,
}

impl CrossrefFetcher {
    pub fn new(http: &HttpSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_client(http)?,
            mailto: http.mailto.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for CrossrefFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Crossref
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        let rows = raw_limit(limit).to_string();
        let mut request = self
            .client
            .get(ENDPOINT)
            .query(&[("query", query), ("rows", rows.as_str())]);

        let mut filter_parts: Vec<String> = Vec::new();
        if let Some((from, to)) = filters.year_range {
            filter_parts.push(format!("from-pub-date:{from}-01-01"));
            filter_parts.push(format!("until-pub-date:{to}-12-31"));
        }
        for doc_type in &filters.document_types {
            if let Some(filter) = type_filter(*doc_type) {
                filter_parts.push(format!("type:{filter}"));
            }
        }
        if !filter_parts.is_empty() {
            request = request.query(&[("filter", filter_parts.join(","))]);
        }
        if let Some(mailto) = &self.mailto {
            request = request.query(&[("mailto", mailto)]);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        let items = body
            .get("message")
            .and_then(|m| m.get("items"))
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Parse("missing message.items array".into()))?;
        Ok(items.iter().filter_map(map_item).collect())
    }
}

fn type_filter(doc_type: ReferenceType) -> Option<&'static str> {
    match doc_type {
        ReferenceType::Journal => Some("journal-article"),
        ReferenceType::Conference => Some("proceedings-article"),
        ReferenceType::Preprint => Some("posted-content"),
        ReferenceType::Book => Some("book"),
        ReferenceType::Dataset => Some("dataset"),
        ReferenceType::Other => None,
    }
}

fn map_item(item: &Value) -> Option<CandidateReference> {
    let title = item
        .get("title")
        .and_then(Value::as_array)
        .and_then(|titles| titles.first())
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let doi = item.get("DOI").and_then(Value::as_str).and_then(normalize_doi);
    let url = item
        .get("URL")
        .and_then(Value::as_str)
        .map(|u| u.to_string())
        .or_else(|| doi.as_ref().map(|d| format!("https://doi.org/{d}")))?;

    let mut candidate =
        CandidateReference::from_source(title.to_string(), url, SourceKind::Crossref);

    candidate.doi = doi;
    candidate.source = item
        .get("container-title")
        .and_then(Value::as_array)
        .and_then(|titles| titles.first())
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    candidate.authors = join_authors(
        item.get("author")
            .and_then(Value::as_array)
            .map(|authors| authors.iter().filter_map(author_name).collect())
            .unwrap_or_default(),
    );
    candidate.published_at = issued_date(item);
    candidate.reference_type = map_type(item.get("type").and_then(Value::as_str).unwrap_or(""));
    candidate.summary = item
        .get("abstract")
        .and_then(Value::as_str)
        .map(strip_markup)
        .filter(|s| !s.is_empty());
    candidate.language = item
        .get("language")
        .and_then(Value::as_str)
        .map(|l| l.to_lowercase())
        .unwrap_or_default();
    Some(candidate)
}

fn author_name(author: &Value) -> Option<String> {
    let given = author.get("given").and_then(Value::as_str).unwrap_or("");
    let family = author.get("family").and_then(Value::as_str).unwrap_or("");
    let name = format!("{given} {family}").trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `issued.date-parts` is `[[year, month?, day?]]`; missing parts fall back
/// to January / the 1st.
fn issued_date(item: &Value) -> Option<chrono::NaiveDate> {
    let parts = item
        .get("issued")
        .and_then(|issued| issued.get("date-parts"))
        .and_then(Value::as_array)
        .and_then(|outer| outer.first())
        .and_then(Value::as_array)?;
    let year = parts.first().and_then(Value::as_i64)? as i32;
    let month = parts.get(1).and_then(Value::as_i64).unwrap_or(1) as u32;
    let day = parts.get(2).and_then(Value::as_i64).unwrap_or(1) as u32;
    chrono::NaiveDate::from_ymd_opt(year, month, day).or_else(|| year_date(year))
}

fn map_type(raw: &str) -> ReferenceType {
    match raw {
        "journal-article" => ReferenceType::Journal,
        "proceedings-article" => ReferenceType::Conference,
        "posted-content" => ReferenceType::Preprint,
        "book" | "book-chapter" | "monograph" => ReferenceType::Book,
        "dataset" => ReferenceType::Dataset,
        _ => ReferenceType::Other,
    }
}
