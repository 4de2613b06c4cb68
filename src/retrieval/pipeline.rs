use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::ChatbotResult;
use crate::models::Embedder;
use crate::retrieval::{NoopPreprocessor, NoopReranker, QueryPreprocessor, Reranker};
use crate::store::{FindNearestNeighborsOptions, VectorStore};
use crate::types::EmbeddedContent;

/// The `find_content` capability: query text in, ranked content chunks out.
///
/// Stages run in a fixed order. Decorators default to the identity stages;
/// `with_preprocessor`/`with_reranker` swap them in at assembly time.
pub struct FindContentPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    options: FindNearestNeighborsOptions,
    preprocessor: Arc<dyn QueryPreprocessor>,
    reranker: Arc<dyn Reranker>,
}

impl FindContentPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        options: FindNearestNeighborsOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            options,
            preprocessor: Arc::new(NoopPreprocessor),
            reranker: Arc::new(NoopReranker),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn QueryPreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = reranker;
        self
    }

    /// Run the full pipeline: preprocess -> embed -> search -> rerank
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn find_content(&self, query: &str) -> ChatbotResult<Vec<EmbeddedContent>> {
        let preprocessed = self.preprocessor.preprocess(query).await?;
        if preprocessed != query {
            debug!("Query transformed by preprocessor");
        }

        let query_vector = self.embedder.embed(&preprocessed).await?;

        let results = self
            .store
            .find_nearest_neighbors(&query_vector, &self.options)
            .await?;
        debug!(count = results.len(), "Search stage returned candidates");

        let reranked = self.reranker.rerank(&preprocessed, results).await?;
        debug!(count = reranked.len(), "Rerank stage completed");

        Ok(reranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embedder that records the text it was asked to embed
    struct RecordingEmbedder {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed(&self, text: &str) -> ChatbotResult<Vec<f32>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![text.len() as f32])
        }
    }

    /// Store returning a fixed candidate list, honoring the min_score floor
    struct FixedStore {
        candidates: Vec<EmbeddedContent>,
    }

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn find_nearest_neighbors(
            &self,
            _query_vector: &[f32],
            options: &FindNearestNeighborsOptions,
        ) -> ChatbotResult<Vec<EmbeddedContent>> {
            Ok(self
                .candidates
                .iter()
                .filter(|c| c.score >= options.min_score)
                .take(options.k)
                .cloned()
                .collect())
        }

        async fn close(&self) -> ChatbotResult<()> {
            Ok(())
        }
    }

    struct ReversingReranker;

    #[async_trait]
    impl Reranker for ReversingReranker {
        async fn rerank(
            &self,
            _query: &str,
            mut results: Vec<EmbeddedContent>,
        ) -> ChatbotResult<Vec<EmbeddedContent>> {
            results.reverse();
            Ok(results)
        }
    }

    struct UppercasePreprocessor;

    #[async_trait]
    impl QueryPreprocessor for UppercasePreprocessor {
        async fn preprocess(&self, query: &str) -> ChatbotResult<String> {
            Ok(query.to_uppercase())
        }
    }

    fn chunk(text: &str, score: f32) -> EmbeddedContent {
        EmbeddedContent {
            text: text.to_string(),
            url: None,
            score,
        }
    }

    fn candidates() -> Vec<EmbeddedContent> {
        vec![
            chunk("first", 0.97),
            chunk("second", 0.95),
            chunk("below floor", 0.5),
        ]
    }

    #[tokio::test]
    async fn test_noop_pipeline_matches_base_search() {
        let store = Arc::new(FixedStore {
            candidates: candidates(),
        });
        let options = FindNearestNeighborsOptions::new("idx");

        let base = store
            .find_nearest_neighbors(&[1.0], &options)
            .await
            .unwrap();

        let pipeline =
            FindContentPipeline::new(RecordingEmbedder::new(), store.clone(), options.clone())
                .with_preprocessor(Arc::new(NoopPreprocessor))
                .with_reranker(Arc::new(NoopReranker));

        let piped = pipeline.find_content("any query").await.unwrap();
        assert_eq!(piped, base);
    }

    #[tokio::test]
    async fn test_min_score_floor_discards_matches() {
        let store = Arc::new(FixedStore {
            candidates: candidates(),
        });
        let pipeline = FindContentPipeline::new(
            RecordingEmbedder::new(),
            store,
            FindNearestNeighborsOptions::new("idx"),
        );

        let results = pipeline.find_content("query").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.score >= 0.9));
    }

    #[tokio::test]
    async fn test_preprocessor_runs_before_search() {
        let embedder = RecordingEmbedder::new();
        let store = Arc::new(FixedStore {
            candidates: candidates(),
        });
        let pipeline = FindContentPipeline::new(
            embedder.clone(),
            store,
            FindNearestNeighborsOptions::new("idx"),
        )
        .with_preprocessor(Arc::new(UppercasePreprocessor));

        pipeline.find_content("what is atlas?").await.unwrap();

        let seen = embedder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["WHAT IS ATLAS?"]);
    }

    #[tokio::test]
    async fn test_reranker_runs_after_search() {
        let store = Arc::new(FixedStore {
            candidates: candidates(),
        });
        let pipeline = FindContentPipeline::new(
            RecordingEmbedder::new(),
            store,
            FindNearestNeighborsOptions::new("idx"),
        )
        .with_reranker(Arc::new(ReversingReranker));

        let results = pipeline.find_content("query").await.unwrap();
        let texts: Vec<&str> = results.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
    }

    #[tokio::test]
    async fn test_empty_results_still_yield_a_list() {
        let store = Arc::new(FixedStore { candidates: vec![] });
        let pipeline = FindContentPipeline::new(
            RecordingEmbedder::new(),
            store,
            FindNearestNeighborsOptions::new("idx"),
        )
        .with_reranker(Arc::new(ReversingReranker));

        let results = pipeline.find_content("query").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_k_limits_result_count() {
        let many: Vec<EmbeddedContent> =
            (0..10).map(|i| chunk(&format!("c{}", i), 0.95)).collect();
        let store = Arc::new(FixedStore { candidates: many });
        let mut options = FindNearestNeighborsOptions::new("idx");
        options.k = 3;

        let pipeline = FindContentPipeline::new(RecordingEmbedder::new(), store, options);
        let results = pipeline.find_content("query").await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
