use mongodb::bson::Document;
use std::sync::Arc;

use crate::error::{NlqError, Result};
use crate::models::{GeneratedQuery, KnownCollection};
use crate::store::DocumentStore;
use crate::validation::InputValidator;

/// Result of running a generated query
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// Non-empty result set in database order
    Rows(Vec<Document>),
    /// The pipeline matched nothing; unfiltered documents from the collection
    Empty { samples: Vec<Document> },
}

/// Upper bound on documents shown when a query matches nothing
pub const MAX_SAMPLE_DOCUMENTS: i64 = 3;

/// Checks a generated query against the live database and runs it
pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
    validator: Arc<InputValidator>,
    sample_size: i64,
}

impl QueryExecutor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        validator: Arc<InputValidator>,
        sample_size: i64,
    ) -> Self {
        // A driver limit of 0 means "no limit", so never pass it through
        let clamped = sample_size.clamp(1, MAX_SAMPLE_DOCUMENTS);
        if clamped != sample_size {
            tracing::warn!(
                requested = sample_size,
                using = clamped,
                "Sample size out of range, clamping"
            );
        }
        Self {
            store,
            validator,
            sample_size: clamped,
        }
    }

    pub async fn execute(&self, query: &GeneratedQuery) -> Result<Execution> {
        let names = self.store.list_collection_names().await?;
        if !names.iter().any(|n| n == &query.collection) {
            tracing::warn!(collection = %query.collection, "Model chose a collection that does not exist");
            return Err(NlqError::CollectionNotFound {
                collection: query.collection.clone(),
            });
        }

        if query.collection.parse::<KnownCollection>().is_err() {
            tracing::debug!(collection = %query.collection, "Collection exists but is not in the prompt schema");
        }

        self.validator.check_pipeline(&query.pipeline)?;

        tracing::info!(
            collection = %query.collection,
            stages = query.pipeline.len(),
            "Running aggregation"
        );
        let rows = self
            .store
            .aggregate(&query.collection, query.pipeline.clone())
            .await?;

        if rows.is_empty() {
            tracing::info!(collection = %query.collection, "No results, fetching sample documents");
            let samples = self.store.sample(&query.collection, self.sample_size).await?;
            return Ok(Execution::Empty { samples });
        }

        tracing::info!(rows = rows.len(), "Aggregation returned results");
        Ok(Execution::Rows(rows))
    }
}
