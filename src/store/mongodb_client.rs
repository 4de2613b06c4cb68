use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{ChatbotError, ChatbotResult};
use crate::store::{FindNearestNeighborsOptions, VectorStore};
use crate::types::EmbeddedContent;

/// Collection written by the ingest CLI
const EMBEDDED_CONTENT_COLLECTION: &str = "embedded_content";

/// MongoDB-backed embedded content store
#[derive(Clone)]
pub struct MongoDbContentStore {
    client: Client,
    database: Database,
}

impl MongoDbContentStore {
    /// Connect to the content store and verify the connection with a ping
    pub async fn connect(config: &DatabaseConfig) -> ChatbotResult<Self> {
        info!("Connecting to embedded content store");

        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = client.database(&config.database_name);

        database.run_command(doc! { "ping": 1 }, None).await?;

        info!(
            database = %config.database_name,
            collection = EMBEDDED_CONTENT_COLLECTION,
            "Content store connected"
        );

        Ok(Self { client, database })
    }

    fn collection(&self) -> Collection<mongodb::bson::Document> {
        self.database.collection(EMBEDDED_CONTENT_COLLECTION)
    }
}

#[async_trait]
impl VectorStore for MongoDbContentStore {
    async fn find_nearest_neighbors(
        &self,
        query_vector: &[f32],
        options: &FindNearestNeighborsOptions,
    ) -> ChatbotResult<Vec<EmbeddedContent>> {
        debug!(
            k = options.k,
            index = %options.index_name,
            min_score = options.min_score,
            "Running vector search"
        );

        let query_vector: Vec<f64> = query_vector.iter().map(|v| f64::from(*v)).collect();

        // Oversample candidates, attach the similarity score, then drop
        // matches below the score floor.
        let pipeline = vec![
            doc! {
                "$vectorSearch": {
                    "index": &options.index_name,
                    "path": &options.path,
                    "queryVector": query_vector,
                    "numCandidates": (options.k * 10) as i32,
                    "limit": options.k as i32,
                }
            },
            doc! {
                "$addFields": { "score": { "$meta": "vectorSearchScore" } }
            },
            doc! {
                "$match": { "score": { "$gte": f64::from(options.min_score) } }
            },
            doc! {
                "$project": { "_id": 0, "text": 1, "url": 1, "score": 1 }
            },
        ];

        let mut cursor = self.collection().aggregate(pipeline, None).await?;
        let mut results = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            let content: EmbeddedContent = from_document(document).map_err(|e| {
                ChatbotError::ConnectionError(format!("malformed content document: {}", e))
            })?;
            results.push(content);
        }

        debug!(count = results.len(), "Vector search completed");
        Ok(results)
    }

    async fn close(&self) -> ChatbotResult<()> {
        info!("Closing content store connection");
        self.client.clone().shutdown().await;
        Ok(())
    }
}
