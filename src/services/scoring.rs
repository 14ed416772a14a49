//! Composite relevance ranking.
//!
//! Each candidate gets a relevance signal (lexical overlap, optionally
//! replaced by a model rating), a credibility heuristic, and a recency band;
//! the weighted blend decides the final order. The weights are intentionally
//! unnormalized: relevance dominates, and under topic lock the lexical
//! vocabulary bonus pushes on-topic records further up.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::models::reference::CandidateReference;
use crate::services::ai::{
    complete_with_timeout, parse_score_map, CallOptions, ChatMessage, ModelClient,
};
use crate::services::filtering::TOPIC_VOCABULARY;

const MODEL_RERANK_POOL: usize = 20;
const TOPIC_BONUS_PER_HIT: f64 = 6.0;
const TOPIC_BONUS_MAX: f64 = 30.0;
const CREDIBILITY_BASE: i32 = 50;
const CREDIBILITY_DOI_BONUS: i32 = 20;
const CREDIBILITY_VENUE_BONUS: i32 = 10;
const WEIGHT_RELEVANCE_LOCKED: f64 = 0.65;
const WEIGHT_RELEVANCE: f64 = 0.50;
const WEIGHT_CREDIBILITY: f64 = 0.25;
const WEIGHT_RECENCY: f64 = 0.10;

/// Score and rank a candidate pool against a section context. Returns the
/// candidates sorted descending by composite score, ties keeping their
/// original encounter order; credibility and score are written onto each
/// candidate.
pub async fn score_and_rank(
    mut candidates: Vec<CandidateReference>,
    context: &str,
    model: Option<&dyn ModelClient>,
    call: &CallOptions,
    use_model_rerank: bool,
    topic_lock: bool,
    current_year: i32,
) -> Vec<CandidateReference> {
    if candidates.is_empty() {
        return candidates;
    }

    let context_tokens = tokenize(context);
    let lexical: Vec<f64> = candidates
        .iter()
        .map(|candidate| lexical_score(&context_tokens, candidate, topic_lock))
        .collect();

    let model_scores = match (use_model_rerank, model) {
        (true, Some(model)) => {
            rerank_with_model(&candidates, &lexical, context, model, call, topic_lock).await
        }
        _ => HashMap::new(),
    };

    let relevance_weight = if topic_lock {
        WEIGHT_RELEVANCE_LOCKED
    } else {
        WEIGHT_RELEVANCE
    };

    for (index, candidate) in candidates.iter_mut().enumerate() {
        let credibility = credibility_score(candidate);
        let recency = recency_score(candidate.year(), current_year);
        let relevance = model_scores
            .get(&index)
            .copied()
            .unwrap_or(lexical[index]);
        let composite = relevance_weight * relevance
            + WEIGHT_CREDIBILITY * f64::from(credibility)
            + WEIGHT_RECENCY * recency;
        candidate.credibility = credibility as u8;
        candidate.score = Some(composite);
    }

    // Vec::sort_by is stable, so equal scores keep encounter order.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Lowercase alphanumeric/CJK tokens longer than one character.
fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            current.push(c);
        } else if !current.is_empty() {
            if current.chars().count() > 1 {
                tokens.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.chars().count() > 1 {
        tokens.insert(current);
    }
    tokens
}

fn candidate_text(candidate: &CandidateReference) -> String {
    let mut text = candidate.title.clone();
    if let Some(source) = &candidate.source {
        text.push(' ');
        text.push_str(source);
    }
    if let Some(summary) = &candidate.summary {
        text.push(' ');
        text.push_str(summary);
    }
    text
}

/// Normalized token overlap on a 0-100 scale, plus the topic-lock
/// vocabulary bonus (which may push past 100 on purpose).
fn lexical_score(
    context_tokens: &HashSet<String>,
    candidate: &CandidateReference,
    topic_lock: bool,
) -> f64 {
    let text = candidate_text(candidate);
    let text_tokens = tokenize(&text);
    let intersection = context_tokens.intersection(&text_tokens).count();
    let denominator = ((context_tokens.len() * text_tokens.len()) as f64)
        .sqrt()
        .max(1.0);
    let mut score = (intersection as f64 / denominator * 100.0).clamp(0.0, 100.0);
    if topic_lock {
        let lower = text.to_lowercase();
        let hits = TOPIC_VOCABULARY
            .iter()
            .filter(|term| lower.contains(*term))
            .count();
        score += (TOPIC_BONUS_PER_HIT * hits as f64).min(TOPIC_BONUS_MAX);
    }
    score
}

/// Ask the model to rate the lexical top of the pool; anything it does not
/// cover keeps its lexical score. Returns candidate-index -> model score.
async fn rerank_with_model(
    candidates: &[CandidateReference],
    lexical: &[f64],
    context: &str,
    model: &dyn ModelClient,
    call: &CallOptions,
    topic_lock: bool,
) -> HashMap<usize, f64> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        lexical[b]
            .partial_cmp(&lexical[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(MODEL_RERANK_POOL);

    let mut lines = String::new();
    for (position, &index) in order.iter().enumerate() {
        let candidate = &candidates[index];
        let venue = candidate.source.as_deref().unwrap_or("unknown venue");
        let keywords = extract_keywords(&candidate.title).join(" ");
        lines.push_str(&format!(
            "{position}. {} | {venue} | {keywords}\n",
            candidate.title
        ));
    }

    let mut system =
        "You rate how relevant bibliographic records are to a writing context. Respond with a \
         JSON object mapping each item number to an integer from 0 to 100."
            .to_string();
    if topic_lock {
        system.push_str(
            " Give low ratings to items that are not clearly about artificial intelligence or \
             machine learning.",
        );
    }
    let user = format!("Context:\n{context}\n\nItems:\n{lines}");
    let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];

    match complete_with_timeout(model, &messages, call).await {
        Ok(reply) => match parse_score_map(&reply) {
            Some(by_position) => by_position
                .into_iter()
                .filter_map(|(position, score)| order.get(position).map(|&index| (index, score)))
                .collect(),
            None => {
                warn!("model rerank reply had no score map, keeping lexical scores");
                HashMap::new()
            }
        },
        Err(err) => {
            warn!(error = %err, "model rerank failed, keeping lexical scores");
            HashMap::new()
        }
    }
}

/// Credibility heuristic: base 50, +20 for a DOI, +10 for a venue, plus the
/// per-provider bonus, clamped to 0-100.
pub fn credibility_score(candidate: &CandidateReference) -> i32 {
    let mut score = CREDIBILITY_BASE;
    if candidate.doi.as_deref().map(str::trim).filter(|d| !d.is_empty()).is_some() {
        score += CREDIBILITY_DOI_BONUS;
    }
    if candidate.source.as_deref().map(str::trim).filter(|s| !s.is_empty()).is_some() {
        score += CREDIBILITY_VENUE_BONUS;
    }
    if let Some(origin) = candidate.origin {
        score += origin.credibility_bonus();
    }
    score.clamp(0, 100)
}

/// Recency band from the publication-year distance; unknown years are
/// neutral.
pub fn recency_score(year: Option<i32>, current_year: i32) -> f64 {
    match year {
        None => 50.0,
        Some(year) => match (current_year - year).abs() {
            0..=1 => 100.0,
            2..=3 => 85.0,
            4..=5 => 70.0,
            6..=10 => 55.0,
            _ => 40.0,
        },
    }
}

/// Short keyword list from a title, used to compact model-rerank prompt
/// lines.
pub fn extract_keywords(title: &str) -> Vec<String> {
    let mut words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(|w| w.to_lowercase())
        .collect();
    words.sort();
    words.dedup();
    words.truncate(5);
    words
}
