//! Qdrant REST request and response types.
//!
//! Only the subset of the HTTP API used for collection lifecycle, point upsert
//! and filtered search is modeled.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Arbitrary JSON payload stored alongside a vector.
pub type Payload = Map<String, Value>;

// =============================================================================
// Envelope
// =============================================================================

/// Every Qdrant response wraps its body in `{ "result": ..., "status": ..., "time": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub result: T,
}

/// Error body: `{ "status": { "error": "..." } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub status: ApiErrorStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorStatus {
    pub error: String,
}

// =============================================================================
// Collections
// =============================================================================

/// Vector distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

/// Vector schema of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    pub size: u64,
    pub distance: Distance,
}

/// Optimizer overrides applied at creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing_threshold: Option<u64>,
}

/// Body of `PUT /collections/{name}`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCollection {
    pub vectors: VectorParams,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimizers_config: Option<OptimizersConfig>,
}

impl CreateCollection {
    /// Create a collection definition with the given vector schema.
    pub fn new(size: u64, distance: Distance) -> Self {
        Self {
            vectors: VectorParams { size, distance },
            optimizers_config: None,
        }
    }

    /// Set the optimizer indexing threshold.
    pub fn with_indexing_threshold(mut self, threshold: u64) -> Self {
        self.optimizers_config = Some(OptimizersConfig {
            indexing_threshold: Some(threshold),
        });
        self
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsList {
    pub collections: Vec<CollectionDescription>,
}

/// Entry of `GET /collections`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
}

/// Subset of `GET /collections/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    pub status: String,

    #[serde(default)]
    pub points_count: Option<u64>,

    #[serde(default)]
    pub vectors_count: Option<u64>,

    #[serde(default)]
    pub config: Option<CollectionConfig>,
}

impl CollectionInfo {
    /// Schema of the unnamed vector. `None` for named-vector collections or
    /// when the server omitted the config.
    pub fn vector_params(&self) -> Option<&VectorParams> {
        match self.config.as_ref()?.params.vectors.as_ref()? {
            VectorsConfig::Single(params) => Some(params),
            VectorsConfig::Named(_) => None,
        }
    }
}

/// `config` section of a collection description.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    pub params: CollectionParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionParams {
    #[serde(default)]
    pub vectors: Option<VectorsConfig>,
}

/// A single unnamed vector, or a map of named vectors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    Single(VectorParams),
    Named(std::collections::BTreeMap<String, VectorParams>),
}

// =============================================================================
// Points
// =============================================================================

/// Point identifier: Qdrant accepts unsigned integers or UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => f.write_str(s),
        }
    }
}

/// A point to upsert.
#[derive(Debug, Clone, Serialize)]
pub struct PointStruct {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpsertPoints<'a> {
    pub points: &'a [PointStruct],
}

/// Result of a write operation.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub operation_id: Option<u64>,
    pub status: String,
}

/// Body of `POST /collections/{name}/points/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub vector: Vec<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    pub limit: usize,

    pub with_payload: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

impl SearchRequest {
    /// Create a search request returning payloads.
    pub fn new(vector: Vec<f32>, limit: usize) -> Self {
        Self {
            vector,
            filter: None,
            limit,
            with_payload: true,
            score_threshold: None,
        }
    }

    /// Restrict the search with a filter.
    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    /// Drop results scoring below `threshold`.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }
}

/// A search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,

    #[serde(default)]
    pub version: u64,

    pub score: f32,

    #[serde(default)]
    pub payload: Option<Payload>,
}

// =============================================================================
// Filters
// =============================================================================

/// Boolean filter over payload fields.
///
/// `should` clauses are OR-ed, `must` clauses AND-ed, `must_not` negated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<FieldCondition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<FieldCondition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<FieldCondition>,
}

impl Filter {
    /// Filter satisfied when at least one condition holds.
    pub fn should(conditions: Vec<FieldCondition>) -> Self {
        Self {
            should: conditions,
            ..Default::default()
        }
    }

    /// Filter satisfied when every condition holds.
    pub fn must(conditions: Vec<FieldCondition>) -> Self {
        Self {
            must: conditions,
            ..Default::default()
        }
    }

    /// True when the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.should.is_empty() && self.must.is_empty() && self.must_not.is_empty()
    }
}

/// Condition on a single payload key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub key: String,

    #[serde(rename = "match")]
    pub matcher: Match,
}

impl FieldCondition {
    /// Equality on a single value.
    pub fn matches(key: impl Into<String>, value: impl Into<MatchValue>) -> Self {
        Self {
            key: key.into(),
            matcher: Match::Value {
                value: value.into(),
            },
        }
    }

    /// Satisfied when the field equals (or, for arrays, contains) any of `values`.
    pub fn matches_any(key: impl Into<String>, values: Vec<MatchValue>) -> Self {
        Self {
            key: key.into(),
            matcher: Match::Any { any: values },
        }
    }
}

/// `{"value": x}` or `{"any": [x, y]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Match {
    Value { value: MatchValue },
    Any { any: Vec<MatchValue> },
}

/// A scalar usable in a match clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Keyword(String),
    Integer(i64),
    Boolean(bool),
}

impl MatchValue {
    /// Whether a payload value equals this match value.
    pub fn matches_json(&self, value: &Value) -> bool {
        match (self, value) {
            (MatchValue::Keyword(expected), Value::String(actual)) => expected == actual,
            (MatchValue::Integer(expected), Value::Number(actual)) => {
                actual.as_i64() == Some(*expected)
            }
            (MatchValue::Boolean(expected), Value::Bool(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl From<String> for MatchValue {
    fn from(s: String) -> Self {
        MatchValue::Keyword(s)
    }
}

impl From<&str> for MatchValue {
    fn from(s: &str) -> Self {
        MatchValue::Keyword(s.to_string())
    }
}

impl From<i64> for MatchValue {
    fn from(n: i64) -> Self {
        MatchValue::Integer(n)
    }
}

impl From<bool> for MatchValue {
    fn from(b: bool) -> Self {
        MatchValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_info_vector_params() {
        let info: CollectionInfo = serde_json::from_value(json!({
            "status": "green",
            "points_count": 42,
            "config": {
                "params": {"vectors": {"size": 1536, "distance": "Cosine"}, "shard_number": 1},
                "hnsw_config": {"m": 16}
            }
        }))
        .unwrap();
        assert_eq!(
            info.vector_params(),
            Some(&VectorParams { size: 1536, distance: Distance::Cosine })
        );

        let named: CollectionInfo = serde_json::from_value(json!({
            "status": "green",
            "config": {"params": {"vectors": {"text": {"size": 8, "distance": "Dot"}}}}
        }))
        .unwrap();
        assert!(named.vector_params().is_none());

        let bare: CollectionInfo = serde_json::from_value(json!({"status": "green"})).unwrap();
        assert!(bare.vector_params().is_none());
    }

    #[test]
    fn test_filter_wire_format() {
        let filter = Filter::should(vec![
            FieldCondition::matches_any(
                "medical_entities",
                vec!["stroke".into(), "aspirin".into()],
            ),
            FieldCondition::matches("department", "cardiology"),
        ]);

        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "should": [
                    {"key": "medical_entities", "match": {"any": ["stroke", "aspirin"]}},
                    {"key": "department", "match": {"value": "cardiology"}}
                ]
            })
        );
    }

    #[test]
    fn test_match_deserializes_both_shapes() {
        let any: Match = serde_json::from_value(json!({"any": [1, 2]})).unwrap();
        assert_eq!(
            any,
            Match::Any {
                any: vec![MatchValue::Integer(1), MatchValue::Integer(2)]
            }
        );

        let value: Match = serde_json::from_value(json!({"value": true})).unwrap();
        assert_eq!(
            value,
            Match::Value {
                value: MatchValue::Boolean(true)
            }
        );
    }

    #[test]
    fn test_create_collection_body() {
        let body = CreateCollection::new(1536, Distance::Cosine).with_indexing_threshold(10_000);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "vectors": {"size": 1536, "distance": "Cosine"},
                "optimizers_config": {"indexing_threshold": 10000}
            })
        );
    }

    #[test]
    fn test_scored_point_ids() {
        let hits: Vec<ScoredPoint> = serde_json::from_value(json!([
            {"id": 7, "version": 1, "score": 0.9, "payload": {"content": "a"}},
            {"id": "5f0c8a52-3c1b-4e8e-9d43-0a3a4d2c9f11", "score": 0.5}
        ]))
        .unwrap();

        assert_eq!(hits[0].id, PointId::Num(7));
        assert_eq!(hits[0].id.to_string(), "7");
        assert!(matches!(hits[1].id, PointId::Uuid(_)));
        assert!(hits[1].payload.is_none());
    }

    #[test]
    fn test_match_value_against_json() {
        assert!(MatchValue::from("stroke").matches_json(&json!("stroke")));
        assert!(!MatchValue::from("stroke").matches_json(&json!("Stroke")));
        assert!(MatchValue::from(3_i64).matches_json(&json!(3)));
        assert!(!MatchValue::from(true).matches_json(&json!("true")));
    }
}
