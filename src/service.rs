use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{NlqError, Result};
use crate::executor::{Execution, QueryExecutor};
use crate::generator::{GroqQueryGenerator, QueryGenerator};
use crate::models::{AskReport, GeneratedQuery, Outcome, RowSummary, document_to_json};
use crate::prompts::ONE_SHOT_EXAMPLE;
use crate::query::parse_generated_query;
use crate::store::DocumentStore;
use crate::summarizer::{GroqSummarizer, Summarizer};
use crate::transport::{GroqTransport, Transport};
use crate::validation::InputValidator;

/// Message shown for anything that goes wrong after the query was generated
const FAILURE_MESSAGE: &str = "Failed to parse or run the query.";

/// Question → query → results → summaries, one submission at a time.
///
/// Holds process-wide handles only; nothing is kept between calls to
/// [`NlqService::ask`].
pub struct NlqService {
    generator: Arc<dyn QueryGenerator>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn DocumentStore>,
    executor: QueryExecutor,
    validator: Arc<InputValidator>,
    max_summarized_rows: Option<usize>,
}

impl NlqService {
    /// Wire the Groq clients from config around an already-connected store
    pub fn new(cfg: &Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let transport = Arc::new(GroqTransport::new(cfg)?);

        let generator = Arc::new(GroqQueryGenerator::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            cfg.groq.model.clone(),
            cfg.groq.max_tokens,
            cfg.groq.json_mode,
        ));

        let summarizer = Arc::new(GroqSummarizer::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            cfg.groq.model.clone(),
            cfg.groq.max_tokens,
        ));

        Ok(Self::with_parts(cfg, generator, summarizer, store))
    }

    pub fn with_parts(
        cfg: &Config,
        generator: Arc<dyn QueryGenerator>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let validator = Arc::new(InputValidator::new(
            cfg.limits.max_question_chars,
            cfg.guard.allow_write_stages,
        ));
        let executor = QueryExecutor::new(
            Arc::clone(&store),
            Arc::clone(&validator),
            cfg.limits.sample_size,
        );

        Self {
            generator,
            summarizer,
            store,
            executor,
            validator,
            max_summarized_rows: cfg.limits.max_summarized_rows,
        }
    }

    /// Live collection names, for the presentation layer
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.store.list_collection_names().await
    }

    /// Answer one question.
    ///
    /// Returns `Err` only when no model output exists yet (invalid question or
    /// a failed generation call). Everything after that ends up in the
    /// report's [`Outcome`], next to the raw model text.
    pub async fn ask(&self, question: &str) -> Result<AskReport> {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!("ask", submission = %submission_id);
        self.ask_inner(submission_id, question).instrument(span).await
    }

    async fn ask_inner(&self, submission_id: Uuid, question: &str) -> Result<AskReport> {
        let question = self.validator.validate_question(question)?;

        let raw_response = self.generator.generate(question, ONE_SHOT_EXAMPLE).await?;

        let outcome = match self.answer(question, &raw_response).await {
            Ok(outcome) => outcome,
            Err(e) => failure_outcome(e),
        };

        match &outcome {
            Outcome::Failed { error, detail, .. } => {
                tracing::warn!(error = %error, detail = %detail, "Submission failed")
            }
            other if other.is_failure() => tracing::warn!(outcome = ?other, "Submission rejected"),
            _ => tracing::info!("Submission answered"),
        }

        Ok(AskReport {
            submission_id,
            question: question.to_string(),
            raw_response,
            outcome,
            generated_at: Utc::now(),
        })
    }

    async fn answer(&self, question: &str, raw: &str) -> Result<Outcome> {
        let query = parse_generated_query(raw)?;

        match self.executor.execute(&query).await? {
            Execution::Empty { samples } => Ok(Outcome::Samples {
                collection: query.collection,
                documents: samples.iter().map(document_to_json).collect(),
            }),
            Execution::Rows(rows) => Ok(self.summarize_rows(question, query, rows).await),
        }
    }

    /// One summarization call per row, in result order. A failed call stops
    /// the loop; summaries already produced stay in the outcome.
    async fn summarize_rows(
        &self,
        question: &str,
        query: GeneratedQuery,
        rows: Vec<mongodb::bson::Document>,
    ) -> Outcome {
        let total = rows.len();
        let take = self.max_summarized_rows.map_or(total, |cap| cap.min(total));
        if take < total {
            tracing::warn!(total, summarized = take, "Summary cap reached, skipping rows");
        }

        let mut summaries = Vec::with_capacity(take);
        for (i, document) in rows.iter().take(take).enumerate() {
            let summary = match self.summarizer.summarize(question, document).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(row = i + 1, completed = summaries.len(), "Summarization failed");
                    return match failure_outcome(e) {
                        Outcome::Failed {
                            error,
                            message,
                            detail,
                            ..
                        } => Outcome::Failed {
                            error,
                            message,
                            detail,
                            rows: summaries,
                        },
                        other => other,
                    };
                }
            };
            summaries.push(RowSummary {
                index: i + 1,
                summary,
                document: document_to_json(document),
            });
        }

        Outcome::Summaries {
            collection: query.collection,
            rows: summaries,
            skipped: total - take,
        }
    }
}

fn failure_outcome(err: NlqError) -> Outcome {
    match err {
        NlqError::CollectionNotFound { collection } => Outcome::CollectionNotFound { collection },
        NlqError::ForbiddenStage { stage } => Outcome::Rejected { stage },
        NlqError::Parse { reason, .. } => Outcome::Failed {
            error: "parse_error".to_string(),
            message: FAILURE_MESSAGE.to_string(),
            detail: reason,
            rows: Vec::new(),
        },
        other => Outcome::Failed {
            error: other.kind().to_string(),
            message: FAILURE_MESSAGE.to_string(),
            detail: other.to_string(),
            rows: Vec::new(),
        },
    }
}
