//! Per-query filter sets.
//!
//! A filter set is built once per query by the query processor and consumed
//! once by the vector store. Store backends translate it into their native
//! predicate (see [`crate::stores::filter`]).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A single filter leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterScalar {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for FilterScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterScalar::Bool(b) => write!(f, "{}", b),
            FilterScalar::Integer(n) => write!(f, "{}", n),
            FilterScalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterScalar {
    fn from(s: &str) -> Self {
        FilterScalar::Text(s.to_string())
    }
}

impl From<String> for FilterScalar {
    fn from(s: String) -> Self {
        FilterScalar::Text(s)
    }
}

impl From<i64> for FilterScalar {
    fn from(n: i64) -> Self {
        FilterScalar::Integer(n)
    }
}

impl From<bool> for FilterScalar {
    fn from(b: bool) -> Self {
        FilterScalar::Bool(b)
    }
}

/// Value attached to a filter key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Field equals the value.
    Scalar(FilterScalar),

    /// Field equals any of the values.
    List(Vec<FilterScalar>),

    /// Named groups of values (e.g. entity category → terms).
    ///
    /// Flattened by the store into one match-any over the union of all groups.
    Category(BTreeMap<String, Vec<FilterScalar>>),
}

impl FilterValue {
    /// True when there is nothing to match on.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Scalar(_) => false,
            FilterValue::List(values) => values.is_empty(),
            FilterValue::Category(groups) => groups.values().all(|v| v.is_empty()),
        }
    }
}

/// Bookkeeping carried with a filter set. Never becomes a filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMetadata {
    /// Unique id of the query that produced the set
    pub query_id: Uuid,

    /// When the set was produced
    pub timestamp: DateTime<Utc>,

    /// Set when the query vector is a zero-vector fallback
    pub is_fallback: bool,
}

impl FilterMetadata {
    /// Fresh metadata for a new query.
    pub fn new() -> Self {
        Self {
            query_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            is_fallback: false,
        }
    }

    /// Timestamp rendered as ISO-8601.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Default for FilterMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured filters for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Filter conditions by payload key
    pub filters: BTreeMap<String, FilterValue>,

    /// Query bookkeeping
    pub metadata: FilterMetadata,
}

impl FilterSet {
    /// Create an empty filter set with fresh metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the filter for `key`.
    pub fn with_filter(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace the filter for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.filters.insert(key.into(), value);
    }

    /// Look up the filter for `key`.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    /// True when no filter would constrain a search.
    pub fn is_empty(&self) -> bool {
        self.filters.values().all(FilterValue::is_empty)
    }

    /// Mark the set as belonging to a fallback (zero-vector) query.
    ///
    /// A fallback search is unfiltered, so every condition is dropped and
    /// only the metadata survives.
    pub fn mark_fallback(&mut self) {
        self.filters.clear();
        self.metadata.is_fallback = true;
    }
}
