//! Per-document citations returned with an answer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A source document backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the citation list
    pub source_id: usize,

    pub document_title: String,

    /// Distinct pages, ascending
    pub page_numbers: BTreeSet<i64>,

    /// `page_numbers` rendered as "1, 3"
    pub pages: String,

    /// Heading of the first hit from this document
    pub heading: String,

    /// Store id of the first hit from this document
    pub store_id: String,

    /// Score of the first hit from this document
    pub score: f32,

    /// Viewer link, when the title maps to a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Citation {
    /// Record another page and refresh the rendered list.
    pub fn add_page(&mut self, page: i64) {
        if self.page_numbers.insert(page) {
            self.pages = render_pages(&self.page_numbers);
        }
    }
}

/// Render a page set as a comma-separated list.
pub fn render_pages(pages: &BTreeSet<i64>) -> String {
    pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
