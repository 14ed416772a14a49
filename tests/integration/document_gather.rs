use std::sync::Arc;

use referencebase::models::reference::{GatherOptions, SourceKind};

use super::support::{candidate, gatherer, StaticFetcher};

const TITLE: &str = "Automated Segmentation of Brain Scans";
const OUTLINE: &str = "\
1. Introduction to segmentation
2. Deep learning methods
";

#[tokio::test]
async fn document_gather_stamps_sections_in_outline_order() {
    let fetcher = StaticFetcher::new(
        SourceKind::OpenAlex,
        vec![
            candidate(
                "Segmentation baselines surveyed",
                "https://example.org/paper/1",
                SourceKind::OpenAlex,
            ),
            candidate(
                "U-Net and its descendants",
                "https://example.org/paper/2",
                SourceKind::OpenAlex,
            ),
        ],
    );
    let gatherer = gatherer(vec![Arc::new(fetcher)]);

    let opts = GatherOptions {
        sources: vec![SourceKind::OpenAlex],
        ..GatherOptions::default()
    };
    let results = gatherer.gather_for_document(TITLE, OUTLINE, &opts).await;

    assert_eq!(results.len(), 4);
    let keys: Vec<&str> = results.iter().map(|r| r.section_key.as_str()).collect();
    assert_eq!(keys, vec!["1.", "1.", "2.", "2."]);
    assert!(results.iter().all(|r| r.origin.is_none() && r.score.is_none()));
}

#[tokio::test]
async fn empty_outline_gathers_nothing() {
    let gatherer = gatherer(vec![Arc::new(StaticFetcher::new(
        SourceKind::OpenAlex,
        Vec::new(),
    ))]);
    let results = gatherer
        .gather_for_document(TITLE, "", &GatherOptions::default())
        .await;
    assert!(results.is_empty());
}
