//! Search hits as seen by the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::chunk::{CONTENT_KEY, HEADING_KEY, PAGE_KEY, TEXT_KEY, TITLE_KEY, UNKNOWN_DOCUMENT};

/// Heading used when a payload carries none.
pub const NO_HEADING: &str = "N/A";

/// One result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedHit {
    /// Chunk text
    pub content: String,

    /// Source document title (`Unknown Document` when absent)
    pub document_title: String,

    /// Page within the document, if known
    pub page: Option<i64>,

    /// Section heading (`N/A` when absent)
    pub heading: String,

    /// Similarity, clamped to [0, 1]
    pub score: f32,

    /// Identifier of the point in the store
    pub store_id: String,

    /// Full stored payload
    pub payload: Map<String, Value>,
}

impl RetrievedHit {
    /// Build a hit from a stored payload, filling defaults for missing fields.
    pub fn from_payload(store_id: impl Into<String>, score: f32, payload: Map<String, Value>) -> Self {
        let content = payload
            .get(CONTENT_KEY)
            .or_else(|| payload.get(TEXT_KEY))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let document_title = payload
            .get(TITLE_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_DOCUMENT)
            .to_string();

        let heading = payload
            .get(HEADING_KEY)
            .and_then(Value::as_str)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(NO_HEADING)
            .to_string();

        let page = payload.get(PAGE_KEY).and_then(parse_page);

        Self {
            content,
            document_title,
            page,
            heading,
            score: clamp_score(score),
            store_id: store_id.into(),
            payload,
        }
    }

    /// Whether the hit names a real document.
    pub fn has_known_title(&self) -> bool {
        self.document_title != UNKNOWN_DOCUMENT
    }
}

/// Pages arrive as integers or numeric strings depending on the ingester.
fn parse_page(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Clamp a raw similarity into [0, 1]. NaN becomes 0.
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let hit = RetrievedHit::from_payload("1", 0.4, payload(json!({"text": "body"})));
        assert_eq!(hit.content, "body");
        assert_eq!(hit.document_title, UNKNOWN_DOCUMENT);
        assert_eq!(hit.heading, NO_HEADING);
        assert_eq!(hit.page, None);
        assert!(!hit.has_known_title());
    }

    #[test]
    fn test_page_from_string() {
        let hit = RetrievedHit::from_payload(
            "1",
            0.4,
            payload(json!({"content": "c", "document_title": "Triage", "page_number": "7"})),
        );
        assert_eq!(hit.page, Some(7));
        assert!(hit.has_known_title());
    }

    #[test]
    fn test_score_clamped() {
        assert_eq!(clamp_score(1.3), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(f32::NAN), 0.0);
    }
}
