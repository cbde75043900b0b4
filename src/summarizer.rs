use async_trait::async_trait;
use mongodb::bson::Document;
use std::sync::Arc;

use crate::error::{NlqError, Result};
use crate::models::{ChatMessage, GroqRequest};
use crate::prompts::{SUMMARY_SYSTEM_PROMPT, summary_user_prompt};
use crate::transport::Transport;

#[cfg(test)]
use mockall::automock;

/// Turns one result document into a plain-language answer
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, question: &str, document: &Document) -> Result<String>;
}

pub struct GroqSummarizer {
    tx: Arc<dyn Transport>,
    model: String,
    max_tokens: i32,
}

impl GroqSummarizer {
    pub fn new(tx: Arc<dyn Transport>, model: String, max_tokens: i32) -> Self {
        Self {
            tx,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl Summarizer for GroqSummarizer {
    async fn summarize(&self, question: &str, document: &Document) -> Result<String> {
        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(summary_user_prompt(question, document)),
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: None,
        };

        let groq_response = self.tx.chat(&request).await?;

        match groq_response.first_content() {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(NlqError::Model(
                "Groq API returned empty choices for summarization".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, GroqResponse};
    use mongodb::bson::doc;
    use std::sync::Mutex;

    // Mock Transport for testing
    struct MockTransport {
        responses: Mutex<Vec<GroqResponse>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(responses: Vec<GroqResponse>) -> Self {
            MockTransport {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse> {
            self.prompts
                .lock()
                .unwrap()
                .push(req.messages[1].content.clone());
            let mut responses = self.responses.lock().unwrap();
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
    async fn test_summarize_single_document() {
        let transport = Arc::new(MockTransport::new(vec![response(
            "  Account 443178 has the highest limit of 10000.\n",
        )]));
        let summarizer = GroqSummarizer::new(transport.clone(), "fast-model".to_string(), 300);

        let document = doc! { "account_id": 443178, "limit": 10000 };
        let summary = summarizer
            .summarize("Show top 5 accounts by limit", &document)
            .await
            .unwrap();
        assert_eq!(summary, "Account 443178 has the highest limit of 10000.");

        let prompts = transport.prompts.lock().unwrap();
        assert!(prompts[0].contains("Question: Show top 5 accounts by limit"));
        assert!(prompts[0].contains("443178"));
    }

    #[tokio::test]
    async fn test_summarize_sees_only_its_document() {
        let transport = Arc::new(MockTransport::new(vec![response("b"), response("a")]));
        let summarizer = GroqSummarizer::new(transport.clone(), "fast-model".to_string(), 300);

        summarizer
            .summarize("q", &doc! { "account_id": 1 })
            .await
            .unwrap();
        summarizer
            .summarize("q", &doc! { "account_id": 2 })
            .await
            .unwrap();

        let prompts = transport.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#""account_id":1"#));
        assert!(!prompts[0].contains(r#""account_id":2"#));
        assert!(prompts[1].contains(r#""account_id":2"#));
    }

    #[tokio::test]
    async fn test_summarize_transport_error_propagates() {
        let transport = Arc::new(MockTransport::new(vec![]));
        let summarizer = GroqSummarizer::new(transport, "fast-model".to_string(), 300);
        let err = summarizer.summarize("q", &doc! {}).await.unwrap_err();
        assert!(matches!(err, NlqError::Model(_)));
    }
}
