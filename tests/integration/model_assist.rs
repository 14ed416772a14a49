use std::sync::Arc;

use referencebase::models::reference::{GatherOptions, SourceKind};

use super::support::{candidate, gatherer_with_model, BrokenModel, ScriptedModel, StaticFetcher};

const TITLE: &str = "Large Language Models for Clinical Notes";
const OUTLINE: &str = "1. Prompting strategies for clinical summarization\n";

#[tokio::test]
async fn broken_model_still_gathers_deterministically() {
    let fetcher = StaticFetcher::new(
        SourceKind::OpenAlex,
        vec![candidate(
            "Prompting clinical language models",
            "https://example.org/paper/1",
            SourceKind::OpenAlex,
        )],
    );
    let gatherer = gatherer_with_model(vec![Arc::new(fetcher)], Arc::new(BrokenModel));

    let opts = GatherOptions {
        use_model_expansion: true,
        use_model_rerank: true,
        topic_lock: true,
        sources: vec![SourceKind::OpenAlex],
        ..GatherOptions::default()
    };
    let results = gatherer.gather_for_section(TITLE, OUTLINE, "1.", &opts).await;
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn scripted_rerank_reorders_results() {
    let lexical_favorite = candidate(
        "Large language models for clinical notes summarization",
        "https://example.org/paper/lexical",
        SourceKind::OpenAlex,
    );
    let model_favorite = candidate(
        "An archive of unrelated measurements",
        "https://example.org/paper/model",
        SourceKind::OpenAlex,
    );
    let fetcher = StaticFetcher::new(
        SourceKind::OpenAlex,
        vec![lexical_favorite.clone(), model_favorite.clone()],
    );
    // Position 0 is the lexical leader; the scripted reply flips the order.
    let model = ScriptedModel("{\"0\": 3, \"1\": 97}".into());
    let gatherer = gatherer_with_model(vec![Arc::new(fetcher)], Arc::new(model));

    let opts = GatherOptions {
        use_model_rerank: true,
        sources: vec![SourceKind::OpenAlex],
        ..GatherOptions::default()
    };
    let results = gatherer.gather_for_section(TITLE, OUTLINE, "1.", &opts).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, model_favorite.title);
    assert_eq!(results[1].title, lexical_favorite.title);
}

#[tokio::test]
async fn malformed_rerank_reply_keeps_lexical_order() {
    let leader = candidate(
        "Large language models for clinical notes summarization",
        "https://example.org/paper/lexical",
        SourceKind::OpenAlex,
    );
    let trailer = candidate(
        "An archive of unrelated measurements",
        "https://example.org/paper/other",
        SourceKind::OpenAlex,
    );
    let fetcher = StaticFetcher::new(SourceKind::OpenAlex, vec![leader.clone(), trailer]);
    let model = ScriptedModel("I cannot produce JSON today.".into());
    let gatherer = gatherer_with_model(vec![Arc::new(fetcher)], Arc::new(model));

    let opts = GatherOptions {
        use_model_rerank: true,
        sources: vec![SourceKind::OpenAlex],
        ..GatherOptions::default()
    };
    let results = gatherer.gather_for_section(TITLE, OUTLINE, "1.", &opts).await;

    assert_eq!(results[0].title, leader.title);
}
