use indoc::formatdoc;
use serde_json::json;

use crate::document::SearchResult;

#[must_use]
pub fn build_prompt(query: &str, sources: &[SearchResult]) -> String {
    formatdoc!(
        "Given the following extracts from a document collection, write a helpful answer to the provided question.
        Only use information from the extracts. If they don't contain the answer, just answer that you don't know instead of making one up, and don't answer questions unrelated to the collection.
    INPUT: {}
    OUTPUT:",
        json!({
            "query": query,
            "sources": sources,
        })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> SearchResult {
        SearchResult {
            title: "Aggregation".to_string(),
            url: "/docs/aggregation".to_string(),
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn prompt_carries_query_and_sources() {
        let prompt = build_prompt(
            "How do pipelines work?",
            &[source("Pipelines are arrays of stages.")],
        );

        assert!(prompt.contains("How do pipelines work?"));
        assert!(prompt.contains("Pipelines are arrays of stages."));
        assert!(prompt.contains("/docs/aggregation"));
        assert!(prompt.ends_with("OUTPUT:"));
    }

    #[test]
    fn prompt_with_no_sources_still_forms() {
        let prompt = build_prompt("Anything?", &[]);

        assert!(prompt.contains(r#""sources":[]"#));
    }
}
