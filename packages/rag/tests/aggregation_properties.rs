//! Property tests for citation aggregation and context assembly.

use proptest::prelude::*;
use rag::{pipeline::confidence, ContextBuilder, ResultAggregator, RetrievedHit};
use serde_json::{json, Value};
use std::collections::HashSet;

fn hit(title: &str, page: Option<i64>, score: f32, content: &str) -> RetrievedHit {
    let mut payload = json!({"content": content, "document_title": title});
    if let Some(page) = page {
        payload["page_number"] = Value::from(page);
    }
    let Value::Object(map) = payload else {
        unreachable!()
    };
    RetrievedHit::from_payload("id", score, map)
}

fn hits() -> impl Strategy<Value = Vec<RetrievedHit>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["Sepsis Bundle", "Stroke Pathway", "ICU Handbook", "Triage"]),
            prop::option::of(1i64..40),
            0.0f32..1.0,
            "[a-z ]{0,120}",
        ),
        0..30,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(title, page, score, content)| hit(title, page, score, &content))
            .collect()
    })
}

proptest! {
    #[test]
    fn citations_are_capped_and_distinct(hits in hits(), max in 0usize..6) {
        let citations = ResultAggregator::new(max, "/docs").aggregate(&hits);

        prop_assert!(citations.len() <= max);
        let titles: HashSet<&str> = citations.iter().map(|c| c.document_title.as_str()).collect();
        prop_assert_eq!(titles.len(), citations.len());

        for (i, citation) in citations.iter().enumerate() {
            prop_assert_eq!(citation.source_id, i + 1);
        }
    }

    #[test]
    fn citation_pages_are_sorted_and_complete(hits in hits()) {
        let citations = ResultAggregator::new(10, "/docs").aggregate(&hits);

        for citation in &citations {
            let mut expected: Vec<i64> = hits
                .iter()
                .filter(|h| h.document_title == citation.document_title)
                .filter_map(|h| h.page)
                .collect();
            expected.sort_unstable();
            expected.dedup();

            let rendered = expected.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
            prop_assert_eq!(&citation.pages, &rendered);
        }
    }

    #[test]
    fn context_never_exceeds_budget(hits in hits(), max_length in 0usize..2000) {
        let context = ContextBuilder::new(max_length).build(&hits);
        prop_assert!(context.chars().count() <= max_length);
    }

    #[test]
    fn context_and_citations_are_deterministic(hits in hits(), max_length in 0usize..2000) {
        let builder = ContextBuilder::new(max_length);
        prop_assert_eq!(builder.build(&hits), builder.build(&hits));

        let aggregator = ResultAggregator::new(5, "/docs");
        prop_assert_eq!(aggregator.aggregate(&hits), aggregator.aggregate(&hits));
    }

    #[test]
    fn confidence_stays_in_unit_range(hits in hits()) {
        let score = confidence(&hits);
        prop_assert!((0.0..=1.0).contains(&score));
    }
}
