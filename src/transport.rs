use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{Config, RetryConfig};
use crate::error::{NlqError, Result};
use crate::models::{GroqRequest, GroqResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse>;
}

pub struct GroqTransport {
    client: Client,
    api_key: String,
    url: String,
    retry: RetryConfig,
}

impl GroqTransport {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.groq_timeout())
            .build()
            .map_err(|e| NlqError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: cfg.groq.api_key.clone(),
            url: cfg.chat_completions_url(),
            retry: cfg.retry.clone(),
        })
    }
}

/// Status codes worth another attempt; everything else fails immediately
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Exponential backoff with jitter, capped at `max_delay_ms`
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let base = retry
        .initial_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let jitter = if retry.jitter_factor > 0.0 {
        rand::thread_rng().gen_range((1.0 - retry.jitter_factor)..=(1.0 + retry.jitter_factor))
    } else {
        1.0
    };
    let delay = (base as f64 * jitter) as u64;
    Duration::from_millis(delay.min(retry.max_delay_ms))
}

#[async_trait]
impl Transport for GroqTransport {
    async fn chat(&self, req: &GroqRequest) -> Result<GroqResponse> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let last_error = match self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(req)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json().await.map_err(|e| {
                            NlqError::Model(format!("Failed to parse Groq API response: {e}"))
                        });
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if !is_retryable(status) {
                        return Err(NlqError::Model(format!(
                            "Groq API returned {status}: {body}"
                        )));
                    }
                    format!("{status}: {body}")
                }
                Err(e) => e.to_string(),
            };

            if attempts >= max_attempts {
                return Err(NlqError::Model(format!(
                    "Groq API request failed after {attempts} attempts: {last_error}"
                )));
            }

            let delay = backoff_delay(&self.retry, attempts);
            tracing::warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "Groq request failed, retrying"
            );
            sleep(delay).await;
        }
    }
}
