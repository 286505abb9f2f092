//! FAQ knowledge retriever
//!
//! Opaque collaborator returning ranked text chunks. An empty result is a
//! valid "no answer", not an error; the tool surfaces a fallback message so
//! the agent can decline gracefully.

use crate::Result;
use tracing::info;

pub const NO_FAQ_MATCH_MESSAGE: &str =
    "I couldn't find a specific answer to your question in our FAQ database. \
     Please try rephrasing your question or ask something more specific about \
     our financial services or policies.";

/// Trait for the knowledge-retrieval collaborator
#[async_trait::async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>>;
}

/// Join retrieved chunks for the tool result, or fall back when nothing
/// matched.
pub fn format_chunks(chunks: &[String]) -> String {
    if chunks.is_empty() {
        NO_FAQ_MATCH_MESSAGE.to_string()
    } else {
        chunks.join("\n\n")
    }
}

/// Keyword-matched in-memory retriever for development & testing.
pub struct StaticRetriever {
    entries: Vec<(Vec<String>, String)>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, keywords: &[&str], chunk: &str) -> Self {
        self.entries.push((
            keywords.iter().map(|k| k.to_lowercase()).collect(),
            chunk.to_string(),
        ));
        self
    }
}

impl Default for StaticRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KnowledgeRetriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        let lowered = query.to_lowercase();
        let chunks: Vec<String> = self
            .entries
            .iter()
            .filter(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(_, chunk)| chunk.clone())
            .collect();

        info!(count = chunks.len(), "FAQ retrieval complete");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_match_returns_chunk() {
        let retriever = StaticRetriever::new().with_entry(
            &["speed-e", "nsdl"],
            "SPEED-e is NSDL's electronic delivery instruction facility.",
        );

        let chunks = retriever.retrieve("What is SPEED-e of NSDL?").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("SPEED-e"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_not_an_error() {
        let retriever = StaticRetriever::new();
        let chunks = retriever.retrieve("unrelated question").await.unwrap();
        assert!(chunks.is_empty());
        assert_eq!(format_chunks(&chunks), NO_FAQ_MATCH_MESSAGE);
    }
}
