use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Database};

use crate::config::Config;
use crate::error::{NlqError, Result};

#[cfg(test)]
use mockall::automock;

/// Read access to the analytics database
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Names of the collections that exist right now
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Run an aggregation pipeline; documents come back in database order
    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>>;

    /// Up to `limit` documents with no filter
    async fn sample(&self, collection: &str, limit: i64) -> Result<Vec<Document>>;
}

/// MongoDB-backed store bound to a single database
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        if config.mongo.uri.is_empty() {
            return Err(NlqError::Config("MONGO_URI is not set".to_string()));
        }

        tracing::info!("Connecting to MongoDB database {}", config.mongo.database);
        let client = Client::with_uri_str(&config.mongo.uri).await?;
        let db = client.database(&config.mongo.database);

        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("MongoDB connection established");

        Ok(Self { db })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.db.list_collection_names().await?)
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let coll = self.db.collection::<Document>(collection);
        // The driver rejects bad stages either when opening or draining the cursor
        let cursor = coll
            .aggregate(pipeline)
            .await
            .map_err(|e| NlqError::QueryExecution(e.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| NlqError::QueryExecution(e.to_string()))
    }

    async fn sample(&self, collection: &str, limit: i64) -> Result<Vec<Document>> {
        let coll = self.db.collection::<Document>(collection);
        let cursor = coll.find(doc! {}).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }
}
