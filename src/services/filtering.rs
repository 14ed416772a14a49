//! Candidate pool normalization.
//!
//! Sequential, deterministic transforms over the pooled fetcher results:
//! language gate, first-seen-wins dedup, validity checks, optional topic
//! lock. When the language/topic narrowing would empty a non-empty pool the
//! filter relaxes to dedup + validity only; dedup and validity are never
//! skipped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::reference::CandidateReference;
use crate::services::language::{is_english_tag, looks_english};

/// Fixed AI/ML vocabulary backing the topic lock and the scorer's lexical
/// bonus.
pub const TOPIC_VOCABULARY: [&str; 18] = [
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "transformer",
    "large language model",
    "llm",
    "bert",
    "gpt",
    "reinforcement learning",
    "natural language processing",
    "nlp",
    "computer vision",
    "generative",
    "diffusion model",
    "attention",
    "fine-tuning",
    "foundation model",
];

/// Placeholder phrases that mark a record as fabricated rather than fetched.
const SUSPICIOUS_PHRASES: [&str; 3] = [
    "suggested research direction",
    "related research literature",
    "recommended reading list",
];

/// Role words sometimes standing in for a real author list.
const PLACEHOLDER_AUTHORS: [&str; 4] = ["researcher", "database", "author", "unknown"];

static SEARCH_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/search\?|/search/|\?q=|&q=").expect("search url regex"));

const MIN_TITLE_CHARS: usize = 5;
const MIN_URL_CHARS: usize = 10;

/// Identity key for first-seen-wins dedup: lowercase DOI, else lowercase
/// URL, else lowercase trimmed title.
pub fn identity_key(candidate: &CandidateReference) -> String {
    if let Some(doi) = candidate.doi.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        return doi.to_lowercase();
    }
    let url = candidate.url.trim();
    if !url.is_empty() {
        return url.to_lowercase();
    }
    candidate.title.trim().to_lowercase()
}

/// Apply the full filter chain; `cap` bounds the relaxed fallback result.
pub fn normalize_pool(
    pool: Vec<CandidateReference>,
    language: Option<&str>,
    topic_lock: bool,
    cap: usize,
) -> Vec<CandidateReference> {
    let total = pool.len();

    let mut narrowed: Vec<CandidateReference> = pool
        .iter()
        .filter(|candidate| passes_language(candidate, language))
        .cloned()
        .collect();
    narrowed = dedupe(narrowed);
    narrowed.retain(is_valid);
    if topic_lock {
        narrowed.retain(matches_topic);
    }

    if narrowed.is_empty() && total > 0 {
        warn!(
            pool = total,
            "language/topic narrowing emptied the pool, relaxing filters"
        );
        let mut relaxed: Vec<CandidateReference> =
            pool.into_iter().filter(|c| is_valid(c)).collect();
        relaxed = dedupe(relaxed);
        relaxed.truncate(cap);
        return relaxed;
    }

    debug!(pool = total, kept = narrowed.len(), "normalized candidate pool");
    narrowed
}

/// First-seen candidate per identity key survives; order is otherwise
/// preserved.
pub fn dedupe(candidates: Vec<CandidateReference>) -> Vec<CandidateReference> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(identity_key(candidate)))
        .collect()
}

fn passes_language(candidate: &CandidateReference, language: Option<&str>) -> bool {
    let target = match language {
        Some(target) if !target.trim().is_empty() => target.trim().to_lowercase(),
        _ => return true,
    };
    // English is the only defined discriminator; other targets trust the
    // explicit tag when one exists and keep untagged records.
    let wants_english = target == "english" || is_english_tag(&target);
    let tag = candidate.language.trim();
    if !tag.is_empty() {
        return if wants_english {
            is_english_tag(tag)
        } else {
            let prefix: String = target.chars().take(2).collect();
            tag.starts_with(&prefix)
        };
    }
    if !wants_english {
        return true;
    }
    let mut text = candidate.title.clone();
    if let Some(summary) = &candidate.summary {
        text.push(' ');
        text.push_str(summary);
    }
    looks_english(&text)
}

/// Structural validity: long-enough title and URL, no placeholder phrasing,
/// and a URL that is not a search-results page.
pub fn is_valid(candidate: &CandidateReference) -> bool {
    if candidate.title.trim().chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    if candidate.url.trim().chars().count() < MIN_URL_CHARS {
        return false;
    }
    if SEARCH_URL_RE.is_match(&candidate.url) {
        return false;
    }
    let title = candidate.title.to_lowercase();
    if SUSPICIOUS_PHRASES.iter().any(|p| title.contains(p)) {
        return false;
    }
    if let Some(authors) = &candidate.authors {
        let authors_lower = authors.to_lowercase();
        if SUSPICIOUS_PHRASES.iter().any(|p| authors_lower.contains(p)) {
            return false;
        }
        if PLACEHOLDER_AUTHORS.contains(&authors_lower.trim()) {
            return false;
        }
    }
    true
}

fn matches_topic(candidate: &CandidateReference) -> bool {
    let mut text = candidate.title.to_lowercase();
    if let Some(summary) = &candidate.summary {
        text.push(' ');
        text.push_str(&summary.to_lowercase());
    }
    if let Some(source) = &candidate.source {
        text.push(' ');
        text.push_str(&source.to_lowercase());
    }
    TOPIC_VOCABULARY.iter().any(|term| text.contains(term))
}
