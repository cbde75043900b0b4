use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collections of the `sample_analytics` dataset the model may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownCollection {
    Accounts,
    Customers,
    Transactions,
}

impl KnownCollection {
    pub const ALL: [KnownCollection; 3] = [
        KnownCollection::Accounts,
        KnownCollection::Customers,
        KnownCollection::Transactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnownCollection::Accounts => "accounts",
            KnownCollection::Customers => "customers",
            KnownCollection::Transactions => "transactions",
        }
    }
}

impl fmt::Display for KnownCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownCollection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownCollection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// Query produced by the model: a target collection and an opaque pipeline.
///
/// The collection name is kept as the model wrote it; whether it exists is
/// decided against the live database, not against [`KnownCollection`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuery {
    pub collection: String,
    pub pipeline: Vec<Document>,
}

/// Render a BSON document as relaxed extended JSON for prompts and reports
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

/// One summarized result row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowSummary {
    /// 1-based position in the database result order
    pub index: usize,
    pub summary: String,
    pub document: serde_json::Value,
}

/// What a submission ended with, after the query was generated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// One sentence per result row, in result order
    Summaries {
        collection: String,
        rows: Vec<RowSummary>,
        /// Rows left unsummarized because of `limits.max_summarized_rows`
        skipped: usize,
    },
    /// The query matched nothing; a few documents from the collection instead
    Samples {
        collection: String,
        documents: Vec<serde_json::Value>,
    },
    CollectionNotFound {
        collection: String,
    },
    /// The pipeline contained a write stage and was not run
    Rejected {
        stage: String,
    },
    /// Parse failure, database rejection or a failed summarization call.
    /// `rows` holds the summaries finished before a summarization call failed.
    Failed {
        error: String,
        message: String,
        detail: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        rows: Vec<RowSummary>,
    },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Failed { .. } | Outcome::Rejected { .. } | Outcome::CollectionNotFound { .. }
        )
    }
}

/// Everything shown to the user for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskReport {
    pub submission_id: uuid::Uuid,
    pub question: String,
    /// Model output exactly as received, shown for debugging
    pub raw_response: String,
    pub outcome: Outcome,
    pub generated_at: DateTime<Utc>,
}

// Groq chat message format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// Groq API request format
#[derive(Debug, Serialize, Clone)]
pub struct GroqRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

// Groq API response format
#[derive(Debug, Deserialize)]
pub struct GroqResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

impl GroqResponse {
    /// Content of the first choice, if the API returned any
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}
