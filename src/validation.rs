use mongodb::bson::Document;

use crate::error::{NlqError, Result};

/// Aggregation stages that write to the database
const WRITE_STAGES: [&str; 2] = ["$out", "$merge"];

/// Input checks applied before and between the model calls
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_question_chars: usize,
    allow_write_stages: bool,
}

impl InputValidator {
    pub fn new(max_question_chars: usize, allow_write_stages: bool) -> Self {
        Self {
            max_question_chars,
            allow_write_stages,
        }
    }

    /// Trim the question and reject empty or oversized input
    pub fn validate_question<'a>(&self, question: &'a str) -> Result<&'a str> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(NlqError::Validation("Question cannot be empty".to_string()));
        }
        let chars = trimmed.chars().count();
        if chars > self.max_question_chars {
            return Err(NlqError::Validation(format!(
                "Question is {chars} characters, maximum is {}",
                self.max_question_chars
            )));
        }
        Ok(trimmed)
    }

    /// Reject `$out` / `$merge` stages unless write stages are allowed.
    /// Only top-level stage keys are inspected.
    pub fn check_pipeline(&self, pipeline: &[Document]) -> Result<()> {
        if self.allow_write_stages {
            return Ok(());
        }
        for stage in pipeline {
            if let Some(key) = stage.keys().find(|k| WRITE_STAGES.contains(&k.as_str())) {
                return Err(NlqError::ForbiddenStage { stage: key.clone() });
            }
        }
        Ok(())
    }
}
