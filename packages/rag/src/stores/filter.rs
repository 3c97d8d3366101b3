//! Filter set → native store predicate.
//!
//! Rules, per filter key:
//! - category map: match-any over the deduplicated union of all groups
//! - list: match-any over the deduplicated values
//! - scalar: equality
//! - empty list or category: skipped
//!
//! Match-any only accepts keyword or integer lists, so a mixed-type list is
//! split: one match-any for its keywords, one for its integers and one
//! equality per boolean.
//!
//! All resulting conditions are combined with OR (`should`). The metadata
//! bag is never translated.

use qdrant_client::{FieldCondition, Filter, Match, MatchValue, Payload};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::types::filter::{FilterScalar, FilterSet, FilterValue};

impl From<&FilterScalar> for MatchValue {
    fn from(scalar: &FilterScalar) -> Self {
        match scalar {
            FilterScalar::Text(s) => MatchValue::Keyword(s.clone()),
            FilterScalar::Integer(n) => MatchValue::Integer(*n),
            FilterScalar::Bool(b) => MatchValue::Boolean(*b),
        }
    }
}

/// Translate a filter set. Returns `None` when nothing constrains the search.
pub fn to_native_filter(filters: &FilterSet) -> Option<Filter> {
    let mut conditions = Vec::new();

    for (key, value) in &filters.filters {
        match value {
            FilterValue::Scalar(scalar) => {
                conditions.push(FieldCondition::matches(key.as_str(), MatchValue::from(scalar)));
            }
            FilterValue::List(values) => {
                let before = conditions.len();
                conditions.extend(any_of(key, values.iter()));
                if conditions.len() == before {
                    debug!(key = %key, "Skipping empty list filter");
                }
            }
            FilterValue::Category(groups) => {
                let before = conditions.len();
                conditions.extend(any_of(key, groups.values().flatten()));
                if conditions.len() == before {
                    debug!(key = %key, "Skipping empty category filter");
                }
            }
        }
    }

    if conditions.is_empty() {
        None
    } else {
        Some(Filter::should(conditions))
    }
}

/// Conditions matching any of `values`, deduplicated in first-seen order.
/// Empty when there are no values.
fn any_of<'a>(key: &str, values: impl Iterator<Item = &'a FilterScalar>) -> Vec<FieldCondition> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    let mut integers = Vec::new();
    let mut booleans = Vec::new();

    for value in values.filter(|v| seen.insert(*v)) {
        match value {
            FilterScalar::Text(_) => keywords.push(MatchValue::from(value)),
            FilterScalar::Integer(_) => integers.push(MatchValue::from(value)),
            FilterScalar::Bool(b) => booleans.push(*b),
        }
    }

    let mut conditions = Vec::new();
    if !keywords.is_empty() {
        conditions.push(FieldCondition::matches_any(key, keywords));
    }
    if !integers.is_empty() {
        conditions.push(FieldCondition::matches_any(key, integers));
    }
    conditions.extend(
        booleans
            .into_iter()
            .map(|b| FieldCondition::matches(key, MatchValue::Boolean(b))),
    );
    conditions
}

/// Evaluate a predicate against a stored payload, the way the server does.
pub fn matches_payload(filter: &Filter, payload: &Payload) -> bool {
    let should = filter.should.is_empty() || filter.should.iter().any(|c| condition_holds(c, payload));
    let must = filter.must.iter().all(|c| condition_holds(c, payload));
    let must_not = filter.must_not.iter().any(|c| condition_holds(c, payload));

    should && must && !must_not
}

fn condition_holds(condition: &FieldCondition, payload: &Payload) -> bool {
    let Some(field) = payload.get(&condition.key) else {
        return false;
    };

    // Array fields match when any element matches
    let candidates: Vec<&Value> = match field {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    candidates.into_iter().any(|candidate| match &condition.matcher {
        Match::Value { value } => value.matches_json(candidate),
        Match::Any { any } => any.iter().any(|v| v.matches_json(candidate)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn entities() -> FilterValue {
        let mut groups = BTreeMap::new();
        groups.insert(
            "diseases".to_string(),
            vec!["heart attack".into(), "stroke".into()],
        );
        groups.insert(
            "medications".to_string(),
            vec!["aspirin".into(), "stroke".into()],
        );
        FilterValue::Category(groups)
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_category_flattens_to_single_match_any() {
        let set = FilterSet::new().with_filter("medical_entities", entities());
        let filter = to_native_filter(&set).unwrap();

        assert_eq!(filter.should.len(), 1);
        assert!(filter.must.is_empty());
        assert_eq!(
            filter.should[0],
            FieldCondition::matches_any(
                "medical_entities",
                vec!["heart attack".into(), "stroke".into(), "aspirin".into()]
            )
        );
    }

    #[test]
    fn test_scalar_and_list_conditions() {
        let set = FilterSet::new()
            .with_filter("department", FilterValue::Scalar("cardiology".into()))
            .with_filter("year", FilterValue::List(vec![2023_i64.into(), 2024_i64.into()]));
        let filter = to_native_filter(&set).unwrap();

        assert_eq!(filter.should.len(), 2);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"should": [
                {"key": "department", "match": {"value": "cardiology"}},
                {"key": "year", "match": {"any": [2023, 2024]}}
            ]})
        );
    }

    #[test]
    fn test_mixed_list_splits_by_value_type() {
        let set = FilterSet::new().with_filter(
            "tags",
            FilterValue::List(vec![
                "triage".into(),
                3_i64.into(),
                true.into(),
                "icu".into(),
                3_i64.into(),
                false.into(),
                true.into(),
            ]),
        );
        let filter = to_native_filter(&set).unwrap();

        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"should": [
                {"key": "tags", "match": {"any": ["triage", "icu"]}},
                {"key": "tags", "match": {"any": [3]}},
                {"key": "tags", "match": {"value": true}},
                {"key": "tags", "match": {"value": false}}
            ]})
        );

        assert!(matches_payload(&filter, &payload(json!({"tags": [false]}))));
        assert!(matches_payload(&filter, &payload(json!({"tags": 3}))));
        assert!(!matches_payload(&filter, &payload(json!({"tags": ["ward"]}))));
    }

    #[test]
    fn test_empty_filters_translate_to_none() {
        let set = FilterSet::new()
            .with_filter("tags", FilterValue::List(vec![]))
            .with_filter("medical_entities", FilterValue::Category(BTreeMap::new()));
        assert!(to_native_filter(&set).is_none());
    }

    #[test]
    fn test_metadata_is_never_a_condition() {
        let mut set = FilterSet::new();
        set.mark_fallback();
        assert!(to_native_filter(&set).is_none());
    }

    #[test]
    fn test_matches_payload_or_semantics() {
        let filter = Filter::should(vec![
            FieldCondition::matches_any("medical_entities", vec!["stroke".into()]),
            FieldCondition::matches("department", "oncology"),
        ]);

        assert!(matches_payload(
            &filter,
            &payload(json!({"medical_entities": ["diabetes", "stroke"]}))
        ));
        assert!(matches_payload(&filter, &payload(json!({"department": "oncology"}))));
        assert!(!matches_payload(
            &filter,
            &payload(json!({"medical_entities": ["asthma"], "department": "cardiology"}))
        ));
        assert!(!matches_payload(&filter, &payload(json!({}))));
    }

    #[test]
    fn test_must_and_must_not() {
        let filter = Filter {
            must: vec![FieldCondition::matches("published", true)],
            must_not: vec![FieldCondition::matches("page_number", 1_i64)],
            ..Default::default()
        };

        assert!(matches_payload(&filter, &payload(json!({"published": true, "page_number": 2}))));
        assert!(!matches_payload(&filter, &payload(json!({"published": true, "page_number": 1}))));
        assert!(!matches_payload(&filter, &payload(json!({"page_number": 2}))));
    }
}
