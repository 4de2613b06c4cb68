/// Retrieval module
///
/// Builds the `find_content` capability out of explicit, ordered stages:
/// query preprocessing, nearest-neighbor search against the content store,
/// and reranking. Stage order is fixed at preprocess -> search -> rerank;
/// the no-op stages are identity, so an undecorated pipeline behaves exactly
/// like the base search.

mod pipeline;

use async_trait::async_trait;

use crate::error::ChatbotResult;
use crate::types::EmbeddedContent;

pub use pipeline::FindContentPipeline;

/// Transforms the raw user query before the search stage
#[async_trait]
pub trait QueryPreprocessor: Send + Sync {
    async fn preprocess(&self, query: &str) -> ChatbotResult<String>;
}

/// Reorders or filters results after the search stage. Must return a list.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        results: Vec<EmbeddedContent>,
    ) -> ChatbotResult<Vec<EmbeddedContent>>;
}

/// Identity preprocessor
pub struct NoopPreprocessor;

#[async_trait]
impl QueryPreprocessor for NoopPreprocessor {
    async fn preprocess(&self, query: &str) -> ChatbotResult<String> {
        Ok(query.to_string())
    }
}

/// Identity reranker
pub struct NoopReranker;

#[async_trait]
impl Reranker for NoopReranker {
    async fn rerank(
        &self,
        _query: &str,
        results: Vec<EmbeddedContent>,
    ) -> ChatbotResult<Vec<EmbeddedContent>> {
        Ok(results)
    }
}
