//! Query expansion for one outline section.
//!
//! The deterministic variant set is built first so topic coverage survives a
//! failed model call; the model step only ever widens the set.

use tracing::warn;

use crate::services::ai::{
    complete_with_timeout, parse_string_array, CallOptions, ChatMessage, ModelClient,
};

/// Domain-reinforcing suffixes appended to the seed under topic lock, in
/// this order.
const TOPIC_VARIANTS: [&str; 4] = [
    "Artificial Intelligence",
    "machine learning",
    "deep learning",
    "large language model LLM",
];

const DETERMINISTIC_CAP: usize = 4;
const EXPANDED_CAP: usize = 6;
const MODEL_EXTRA_QUERIES: usize = 3;

/// Turn a seed topic into 1-6 deduplicated, non-empty search queries. The
/// raw seed always leads the set.
pub async fn expand(
    seed: &str,
    model: Option<&dyn ModelClient>,
    call: &CallOptions,
    use_model_expansion: bool,
    topic_lock: bool,
) -> Vec<String> {
    let seed = seed.trim();
    let mut queries: Vec<String> = Vec::new();
    push_unique(&mut queries, seed.to_string());
    if topic_lock {
        for variant in TOPIC_VARIANTS {
            push_unique(&mut queries, format!("{seed} {variant}").trim().to_string());
        }
    }

    let model = match (use_model_expansion, model) {
        (true, Some(model)) => model,
        _ => {
            queries.truncate(DETERMINISTIC_CAP);
            return queries;
        }
    };

    let messages = expansion_messages(seed, topic_lock);
    match complete_with_timeout(model, &messages, call).await {
        Ok(reply) => match parse_string_array(&reply) {
            Some(extra) => {
                for query in extra.into_iter().take(MODEL_EXTRA_QUERIES) {
                    push_unique(&mut queries, query);
                }
                queries.truncate(EXPANDED_CAP);
                queries
            }
            None => {
                warn!("model expansion reply had no query list, using deterministic set");
                queries.truncate(DETERMINISTIC_CAP);
                queries
            }
        },
        Err(err) => {
            warn!(error = %err, "model expansion failed, using deterministic set");
            queries.truncate(DETERMINISTIC_CAP);
            queries
        }
    }
}

fn expansion_messages(seed: &str, topic_lock: bool) -> Vec<ChatMessage> {
    let mut instruction = format!(
        "Topic: {seed}\n\nReturn up to {MODEL_EXTRA_QUERIES} alternative compact search queries \
         for finding academic literature on this topic. Respond with a JSON array of strings only."
    );
    if topic_lock {
        instruction.push_str(
            " Every query must include an artificial-intelligence or machine-learning domain term.",
        );
    }
    vec![
        ChatMessage::system(
            "You expand academic writing topics into literature-search queries.",
        ),
        ChatMessage::user(instruction),
    ]
}

fn push_unique(queries: &mut Vec<String>, query: String) {
    let query = query.trim().to_string();
    if query.is_empty() {
        return;
    }
    if queries.iter().any(|q| q.eq_ignore_ascii_case(&query)) {
        return;
    }
    queries.push(query);
}
