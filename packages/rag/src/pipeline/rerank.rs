//! Keyword-overlap reranking.
//!
//! Blends the vector score with the fraction of query terms present in the
//! hit text, which promotes chunks that literally mention the drug or
//! condition asked about.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::traits::reranker::Reranker;
use crate::types::hit::{clamp_score, RetrievedHit};

/// Reranks by `vector_weight * score + keyword_weight * overlap`.
#[derive(Debug, Clone)]
pub struct KeywordOverlapReranker {
    vector_weight: f32,
    keyword_weight: f32,
}

impl Default for KeywordOverlapReranker {
    fn default() -> Self {
        Self::new(0.7, 0.3)
    }
}

impl KeywordOverlapReranker {
    pub fn new(vector_weight: f32, keyword_weight: f32) -> Self {
        Self {
            vector_weight,
            keyword_weight,
        }
    }

    /// Fraction of distinct query terms found in `content`.
    pub fn overlap(query_terms: &HashSet<String>, content: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let content_terms = terms(content);
        let found = query_terms
            .iter()
            .filter(|t| content_terms.contains(t.as_str()))
            .count();
        found as f32 / query_terms.len() as f32
    }
}

/// Lowercase alphanumeric terms longer than two characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl Reranker for KeywordOverlapReranker {
    async fn rerank(&self, query: &str, hits: Vec<RetrievedHit>) -> Result<Vec<RetrievedHit>> {
        let query_terms = terms(query);

        let mut scored: Vec<(f32, usize, RetrievedHit)> = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                let blended = self.vector_weight * hit.score
                    + self.keyword_weight * Self::overlap(&query_terms, &hit.content);
                (blended, rank, hit)
            })
            .collect();

        // Stable on ties: original rank breaks them
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(scored
            .into_iter()
            .map(|(blended, _, mut hit)| {
                hit.score = clamp_score(blended);
                hit
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn hit(content: &str, score: f32) -> RetrievedHit {
        let Value::Object(payload) = json!({"content": content, "document_title": "Doc"}) else {
            unreachable!()
        };
        RetrievedHit::from_payload(content, score, payload)
    }

    #[tokio::test]
    async fn test_keyword_match_promotes_hit() {
        let reranker = KeywordOverlapReranker::default();
        let hits = vec![
            hit("General visiting hours and parking", 0.80),
            hit("Aspirin dosing after myocardial infarction", 0.75),
        ];

        let reranked = reranker
            .rerank("aspirin after myocardial infarction", hits)
            .await
            .unwrap();

        assert!(reranked[0].content.starts_with("Aspirin"));
        assert!(reranked[0].score <= 1.0);
    }

    #[tokio::test]
    async fn test_ties_keep_original_order() {
        let reranker = KeywordOverlapReranker::default();
        let hits = vec![hit("alpha", 0.5), hit("beta", 0.5)];

        let reranked = reranker.rerank("unrelated", hits).await.unwrap();
        assert_eq!(reranked[0].content, "alpha");
        assert_eq!(reranked[1].content, "beta");
    }

    #[test]
    fn test_overlap_fraction() {
        let query = terms("stroke thrombolysis window");
        let overlap = KeywordOverlapReranker::overlap(&query, "Thrombolysis within the stroke window");
        assert!((overlap - 1.0).abs() < 1e-6);
        assert_eq!(KeywordOverlapReranker::overlap(&HashSet::new(), "text"), 0.0);
    }
}
