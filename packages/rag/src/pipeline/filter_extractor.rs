//! Query expansion and entity extraction.
//!
//! Pure and deterministic: a phrase table appends clinical synonyms to the
//! query, then per-category matchers collect entity terms from the expanded
//! text. No I/O.

use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::{RagError, Result};
use crate::types::filter::{FilterScalar, FilterValue};

const EXPANSIONS: &[(&str, &str)] = &[
    (
        "heart attack",
        "myocardial infarction cardiac arrest coronary thrombosis acute coronary syndrome",
    ),
    ("high blood pressure", "hypertension elevated blood pressure"),
    ("diabetes", "diabetes mellitus hyperglycemia"),
    ("stroke", "cerebrovascular accident"),
];

const DISEASES: &[&str] = &[
    "diabetes",
    "hypertension",
    "cancer",
    "asthma",
    "covid-19",
    "stroke",
    "tuberculosis",
    "copd",
    "heart disease",
    "heart attack",
    "myocardial infarction",
    "cardiac arrest",
    "pneumonia",
    "sepsis",
];

const MEDICATIONS: &[&str] = &[
    "aspirin",
    "ibuprofen",
    "acetaminophen",
    "lisinopril",
    "metformin",
    "prednisone",
    "insulin",
];

/// Result of running the extractor over a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedQuery {
    /// Original query followed by any matched expansions
    pub expanded_query: String,

    /// Category → lowercase matched terms
    pub entities: BTreeMap<String, BTreeSet<String>>,
}

impl ExtractedQuery {
    /// True when no entity was found.
    pub fn has_entities(&self) -> bool {
        self.entities.values().any(|terms| !terms.is_empty())
    }

    /// Entities as a category filter value, `None` when there are none.
    pub fn to_filter_value(&self) -> Option<FilterValue> {
        if !self.has_entities() {
            return None;
        }

        Some(FilterValue::Category(
            self.entities
                .iter()
                .filter(|(_, terms)| !terms.is_empty())
                .map(|(category, terms)| {
                    (
                        category.clone(),
                        terms.iter().cloned().map(FilterScalar::Text).collect(),
                    )
                })
                .collect(),
        ))
    }
}

struct EntityMatcher {
    category: String,
    pattern: Regex,
}

impl EntityMatcher {
    /// Whole-word, case-insensitive alternation over `terms`. Longer terms
    /// are tried first so a multi-word term beats its own prefix.
    fn new(category: impl Into<String>, terms: &[&str]) -> Result<Self> {
        let category = category.into();
        let mut sorted: Vec<&str> = terms.iter().copied().filter(|t| !t.trim().is_empty()).collect();
        if sorted.is_empty() {
            return Err(RagError::Config(format!("no terms for category {}", category)));
        }
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = sorted
            .iter()
            .map(|term| {
                term.split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .build()
            .map_err(|e| RagError::Config(format!("bad pattern for {}: {}", category, e)))?;

        Ok(Self { category, pattern })
    }
}

/// Expands clinical synonyms and tags entities in a query.
pub struct FilterExtractor {
    expansions: Vec<(String, String)>,
    matchers: Vec<EntityMatcher>,
}

impl Default for FilterExtractor {
    fn default() -> Self {
        Self::medical()
    }
}

impl FilterExtractor {
    /// Extractor with no expansions and no categories.
    pub fn empty() -> Self {
        Self {
            expansions: Vec::new(),
            matchers: Vec::new(),
        }
    }

    /// The built-in clinical vocabulary.
    pub fn medical() -> Self {
        let mut extractor = Self::empty();
        for (phrase, expansion) in EXPANSIONS {
            extractor = extractor.with_expansion(*phrase, *expansion);
        }

        for (category, terms) in [("diseases", DISEASES), ("medications", MEDICATIONS)] {
            match EntityMatcher::new(category, terms) {
                Ok(matcher) => extractor.matchers.push(matcher),
                Err(e) => warn!(category, error = %e, "Skipping entity category"),
            }
        }

        extractor
    }

    /// Append `expansion` whenever `phrase` occurs in a query.
    pub fn with_expansion(mut self, phrase: impl Into<String>, expansion: impl Into<String>) -> Self {
        self.expansions
            .push((phrase.into().to_lowercase(), expansion.into()));
        self
    }

    /// Add an entity category matched by whole-word `terms`.
    pub fn with_category(mut self, category: impl Into<String>, terms: &[&str]) -> Result<Self> {
        self.matchers.push(EntityMatcher::new(category, terms)?);
        Ok(self)
    }

    /// Expand `query` and collect entity terms from the expanded text.
    pub fn extract(&self, query: &str) -> ExtractedQuery {
        if query.trim().is_empty() {
            return ExtractedQuery {
                expanded_query: query.to_string(),
                entities: BTreeMap::new(),
            };
        }

        let expanded_query = self.expand(query);
        let mut entities = BTreeMap::new();

        for matcher in &self.matchers {
            let terms: BTreeSet<String> = matcher
                .pattern
                .find_iter(&expanded_query)
                .map(|m| normalize_term(m.as_str()))
                .collect();

            if !terms.is_empty() {
                entities.insert(matcher.category.clone(), terms);
            }
        }

        ExtractedQuery {
            expanded_query,
            entities,
        }
    }

    /// Original query plus the expansion of every phrase it contains.
    pub fn expand(&self, query: &str) -> String {
        let lowered = query.to_lowercase();
        let mut expanded = query.to_string();

        for (phrase, expansion) in &self.expansions {
            if lowered.contains(phrase.as_str()) {
                expanded.push(' ');
                expanded.push_str(expansion);
            }
        }

        expanded
    }
}

/// Lowercase and collapse internal whitespace.
fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
