use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{NlqError, Result};
use crate::models::{ChatMessage, GroqRequest};
use crate::prompts::{QUERY_SYSTEM_PROMPT, query_user_prompt};
use crate::transport::Transport;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Ask the model for a query; returns its text untouched
    async fn generate(&self, question: &str, sample: &str) -> Result<String>;
}

pub struct GroqQueryGenerator {
    tx: Arc<dyn Transport>,
    model: String,
    max_tokens: i32,
    json_mode: bool,
}

impl GroqQueryGenerator {
    pub fn new(tx: Arc<dyn Transport>, model: String, max_tokens: i32, json_mode: bool) -> Self {
        Self {
            tx,
            model,
            max_tokens,
            json_mode,
        }
    }

    fn request(&self, question: &str, sample: &str) -> GroqRequest {
        GroqRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(QUERY_SYSTEM_PROMPT),
                ChatMessage::user(query_user_prompt(question, sample)),
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: self
                .json_mode
                .then(|| serde_json::json!({"type": "json_object"})),
        }
    }
}

#[async_trait]
impl QueryGenerator for GroqQueryGenerator {
    async fn generate(&self, question: &str, sample: &str) -> Result<String> {
        tracing::info!("Generating MongoDB query with Groq for question: {}", question);

        let groq_response = self.tx.chat(&self.request(question, sample)).await?;

        match groq_response.first_content() {
            Some(text) => {
                tracing::debug!(raw = %text, "Query generation response");
                Ok(text.to_string())
            }
            None => Err(NlqError::Model(
                "Groq API returned empty choices for query generation".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, GroqResponse};
    use crate::prompts::ONE_SHOT_EXAMPLE;
    use std::sync::Mutex;

    // Mock Transport that records requests
    struct MockTransport {
        responses: Mutex<Vec<GroqResponse>>,
        requests: Mutex<Vec<GroqRequest>>,
    }

    impl MockTransport {
        fn new(responses: Vec<GroqResponse>) -> Self {
            MockTransport {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse> {
            self.requests
                .lock()
                .expect("Mock transport mutex should not be poisoned")
                .push(req.clone());
            let mut responses = self
                .responses
                .lock()
                .expect("Mock transport mutex should not be poisoned");
            if let Some(response) = responses.pop() {
                Ok(response)
            } else {
                Err(NlqError::Model("No more mock responses".to_string()))
            }
        }
    }

    fn response(content: &str) -> GroqResponse {
        GroqResponse {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: content.to_string(),
                },
            }],
        }
    }

    #[tokio::test]
    async fn test_generate_returns_raw_text_unchanged() {
        let raw = "Sure, here's your query: {\"collection\": \"accounts\"}";
        let transport = Arc::new(MockTransport::new(vec![response(raw)]));
        let generator =
            GroqQueryGenerator::new(transport.clone(), "test-model".to_string(), 500, true);

        let text = generator
            .generate("Show top 5 accounts by limit", ONE_SHOT_EXAMPLE)
            .await
            .expect("generation should succeed");
        assert_eq!(text, raw);
    }

    #[tokio::test]
    async fn test_generate_request_is_deterministic_json() {
        let transport = Arc::new(MockTransport::new(vec![response("{}")]));
        let generator =
            GroqQueryGenerator::new(transport.clone(), "test-model".to_string(), 500, true);
        generator
            .generate("How many customers live in Texas?", ONE_SHOT_EXAMPLE)
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        let req = &requests[0];
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.model, "test-model");
        assert_eq!(
            req.response_format,
            Some(serde_json::json!({"type": "json_object"}))
        );
        assert_eq!(req.messages[0].role, "system");
        assert!(req.messages[1].content.contains("How many customers live in Texas?"));
        assert!(req.messages[1].content.contains(ONE_SHOT_EXAMPLE));
    }

    #[tokio::test]
    async fn test_generate_without_json_mode() {
        let transport = Arc::new(MockTransport::new(vec![response("{}")]));
        let generator = GroqQueryGenerator::new(transport.clone(), "m".to_string(), 500, false);
        generator.generate("q", ONE_SHOT_EXAMPLE).await.unwrap();
        assert!(transport.requests.lock().unwrap()[0].response_format.is_none());
    }

    #[tokio::test]
    async fn test_generate_empty_choices_is_model_error() {
        let transport = Arc::new(MockTransport::new(vec![GroqResponse { choices: vec![] }]));
        let generator = GroqQueryGenerator::new(transport, "m".to_string(), 500, true);
        let err = generator.generate("q", ONE_SHOT_EXAMPLE).await.unwrap_err();
        assert!(matches!(err, NlqError::Model(_)));
    }
}
