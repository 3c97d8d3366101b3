//! Hits → per-document citations.

use std::collections::{BTreeSet, HashMap};
use url::form_urlencoded::byte_serialize;

use crate::types::{
    citation::{render_pages, Citation},
    hit::{clamp_score, RetrievedHit},
};

/// Number of top hits averaged into the confidence score.
const CONFIDENCE_WINDOW: usize = 3;

/// Groups hits by document title into citations.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    max_citations: usize,
    document_base_url: String,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(5, "/predictive/api/documents/view")
    }
}

impl ResultAggregator {
    pub fn new(max_citations: usize, document_base_url: impl Into<String>) -> Self {
        Self {
            max_citations,
            document_base_url: document_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// One citation per distinct title, in first-seen order, capped.
    ///
    /// The first hit for a title supplies heading, score and store id; later
    /// hits only contribute their page numbers.
    pub fn aggregate(&self, hits: &[RetrievedHit]) -> Vec<Citation> {
        let mut citations: Vec<Citation> = Vec::new();
        let mut by_title: HashMap<&str, usize> = HashMap::new();

        for hit in hits {
            if let Some(&index) = by_title.get(hit.document_title.as_str()) {
                if let Some(page) = hit.page {
                    citations[index].add_page(page);
                }
                continue;
            }

            if citations.len() >= self.max_citations {
                continue;
            }

            let page_numbers: BTreeSet<i64> = hit.page.into_iter().collect();
            by_title.insert(hit.document_title.as_str(), citations.len());
            citations.push(Citation {
                source_id: citations.len() + 1,
                document_title: hit.document_title.clone(),
                pages: render_pages(&page_numbers),
                page_numbers,
                heading: hit.heading.clone(),
                store_id: hit.store_id.clone(),
                score: hit.score,
                url: self.document_url(hit),
            });
        }

        citations
    }

    /// Viewer link for a hit's document, `None` for unknown titles.
    pub fn document_url(&self, hit: &RetrievedHit) -> Option<String> {
        if !hit.has_known_title() {
            return None;
        }
        Some(format!(
            "{}/{}",
            self.document_base_url,
            document_file_name(&hit.document_title)
        ))
    }
}

/// Title → encoded file name: each whitespace character to `_`, `.pdf`
/// suffix forced.
pub fn document_file_name(title: &str) -> String {
    let mut name: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    byte_serialize(name.as_bytes()).collect()
}

/// Mean score of the top hits, clamped to [0, 1]. Zero without hits.
pub fn confidence(hits: &[RetrievedHit]) -> f32 {
    let top: Vec<f32> = hits.iter().take(CONFIDENCE_WINDOW).map(|h| h.score).collect();
    if top.is_empty() {
        return 0.0;
    }
    clamp_score(top.iter().sum::<f32>() / top.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn hit(title: Option<&str>, page: Option<i64>, score: f32) -> RetrievedHit {
        let mut payload = json!({"content": "text", "heading": "Triage"});
        if let Some(title) = title {
            payload["document_title"] = Value::from(title);
        }
        if let Some(page) = page {
            payload["page_number"] = Value::from(page);
        }
        let Value::Object(map) = payload else {
            unreachable!()
        };
        RetrievedHit::from_payload(format!("{}-{:?}", title.unwrap_or("?"), page), score, map)
    }

    #[test]
    fn test_merges_pages_per_title() {
        let aggregator = ResultAggregator::default();
        let hits = vec![
            hit(Some("ED Triage Policy"), Some(3), 0.9),
            hit(Some("Dosing Guide"), Some(4), 0.8),
            hit(Some("ED Triage Policy"), Some(1), 0.7),
            hit(Some("ED Triage Policy"), Some(3), 0.6),
        ];

        let citations = aggregator.aggregate(&hits);

        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source_id, 1);
        assert_eq!(citations[0].pages, "1, 3");
        assert_eq!(citations[0].score, 0.9);
        assert_eq!(citations[0].store_id, "ED Triage Policy-Some(3)");
        assert_eq!(citations[1].source_id, 2);
        assert_eq!(citations[1].pages, "4");
    }

    #[test]
    fn test_citation_cap() {
        let aggregator = ResultAggregator::default();
        let hits: Vec<_> = (0..8)
            .map(|i| hit(Some(&format!("Doc {}", i)), Some(1), 0.5))
            .collect();

        let citations = aggregator.aggregate(&hits);
        assert_eq!(citations.len(), 5);
        assert_eq!(citations[4].document_title, "Doc 4");
    }

    #[test]
    fn test_urls() {
        let aggregator = ResultAggregator::new(5, "/docs/view/");

        let known = aggregator.aggregate(&[hit(Some("Sepsis Bundle v2"), None, 0.5)]);
        assert_eq!(known[0].url.as_deref(), Some("/docs/view/Sepsis_Bundle_v2.pdf"));
        assert_eq!(known[0].pages, "");

        let already_pdf = aggregator.aggregate(&[hit(Some("Stroke & TIA.PDF"), None, 0.5)]);
        assert_eq!(already_pdf[0].url.as_deref(), Some("/docs/view/Stroke_%26_TIA.PDF"));

        let unknown = aggregator.aggregate(&[hit(None, Some(1), 0.5)]);
        assert_eq!(unknown[0].document_title, "Unknown Document");
        assert!(unknown[0].url.is_none());
    }

    #[test]
    fn test_file_name_keeps_every_space() {
        assert_eq!(document_file_name("Sepsis  Bundle "), "Sepsis__Bundle_.pdf");
        assert_eq!(document_file_name(" ICU\tHandbook"), "_ICU_Handbook.pdf");
        assert_eq!(document_file_name("Sepsis_Bundle.pdf"), "Sepsis_Bundle.pdf");
    }

    #[test]
    fn test_confidence_uses_top_three() {
        let hits = vec![
            hit(Some("a"), None, 0.9),
            hit(Some("b"), None, 0.6),
            hit(Some("c"), None, 0.3),
            hit(Some("d"), None, 0.0),
        ];
        assert!((confidence(&hits) - 0.6).abs() < 1e-6);
        assert_eq!(confidence(&[]), 0.0);
    }
}
