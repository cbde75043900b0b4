use thiserror::Error;

/// Errors raised while turning a question into a query and answering it
#[derive(Debug, Error)]
pub enum NlqError {
    /// Model output was not the expected `{"collection", "query"}` JSON object
    #[error("Failed to parse model output as a query ({reason})")]
    Parse { raw: String, reason: String },

    #[error("Collection not found: `{collection}`")]
    CollectionNotFound { collection: String },

    #[error("Pipeline stage `{stage}` writes to the database and is not allowed")]
    ForbiddenStage { stage: String },

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NlqError {
    /// Short machine-friendly label used in reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            NlqError::Parse { .. } => "parse_error",
            NlqError::CollectionNotFound { .. } => "collection_not_found",
            NlqError::ForbiddenStage { .. } => "forbidden_stage",
            NlqError::QueryExecution(_) => "query_execution_error",
            NlqError::Model(_) => "model_error",
            NlqError::Database(_) => "database_error",
            NlqError::Config(_) => "config_error",
            NlqError::Validation(_) => "validation_error",
            NlqError::Json(_) => "json_error",
            NlqError::Http(_) => "http_error",
            NlqError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, NlqError>;
