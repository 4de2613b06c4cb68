/// Content store module
///
/// A handle to a persisted collection of embedded content chunks, queryable
/// by vector similarity. The MongoDB implementation delegates the search to
/// an Atlas `$vectorSearch` aggregation; this crate owns only the handle
/// lifecycle and the option plumbing.

mod mongodb_client;

use async_trait::async_trait;

use crate::error::ChatbotResult;
use crate::types::EmbeddedContent;

pub use mongodb_client::MongoDbContentStore;

/// Parameters for the nearest-neighbor search stage
#[derive(Debug, Clone)]
pub struct FindNearestNeighborsOptions {
    /// Number of neighbors to return
    pub k: usize,
    /// Document path holding the embedding vector
    pub path: String,
    /// Atlas vector search index to query
    pub index_name: String,
    /// Matches scoring below this threshold are discarded
    pub min_score: f32,
}

impl FindNearestNeighborsOptions {
    /// Defaults mirroring the reference deployment: five neighbors over the
    /// `embedding` path with a 0.9 score floor.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            k: 5,
            path: "embedding".to_string(),
            index_name: index_name.into(),
            min_score: 0.9,
        }
    }
}

/// A queryable, closeable store of embedded content
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the ranked chunks nearest to `query_vector`
    async fn find_nearest_neighbors(
        &self,
        query_vector: &[f32],
        options: &FindNearestNeighborsOptions,
    ) -> ChatbotResult<Vec<EmbeddedContent>>;

    /// Release the underlying connection
    async fn close(&self) -> ChatbotResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = FindNearestNeighborsOptions::new("vector_index");
        assert_eq!(options.k, 5);
        assert_eq!(options.path, "embedding");
        assert_eq!(options.index_name, "vector_index");
        assert!((options.min_score - 0.9).abs() < f32::EPSILON);
    }
}
