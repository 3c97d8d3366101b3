//! Bounded context assembly.

use crate::types::hit::RetrievedHit;

/// Assembles ranked hits into a context string under a character budget.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    max_length: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(3000)
    }
}

impl ContextBuilder {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Concatenate snippets in rank order.
    ///
    /// Stops at the first snippet that would push the total past the budget;
    /// snippets are never truncated. Length is counted in characters.
    pub fn build(&self, hits: &[RetrievedHit]) -> String {
        let mut context = String::new();
        let mut length = 0;

        for (i, hit) in hits.iter().enumerate() {
            let snippet = self.snippet(i + 1, hit);
            let snippet_len = snippet.chars().count();
            if length + snippet_len > self.max_length {
                break;
            }
            context.push_str(&snippet);
            length += snippet_len;
        }

        context
    }

    fn snippet(&self, n: usize, hit: &RetrievedHit) -> String {
        let content = hit.content.trim();
        match hit.page {
            Some(page) => format!(
                "**Doc {}:** {}\n(Source: {}, p. {})\n\n",
                n, content, hit.document_title, page
            ),
            None => format!("**Doc {}:** {}\n(Source: {})\n\n", n, content, hit.document_title),
        }
    }
}
