//! Engagement feedback forwarded to the recommendation engine.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::backend::{BackendError, Feedback};

const SERVICE: &str = "recommender";

/// Destination for engagement signals ("read", "upvote").
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn insert_feedback(&self, feedback: Vec<Feedback>) -> Result<(), BackendError>;
}

/// Recommendation engine reached over its REST API.
#[derive(Debug, Clone)]
pub struct HttpFeedbackSink {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpFeedbackSink {
    pub fn new(client: Client, base_url: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/feedback", base_url.trim_end_matches('/')),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl FeedbackSink for HttpFeedbackSink {
    async fn insert_feedback(&self, feedback: Vec<Feedback>) -> Result<(), BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .timeout(self.timeout)
            .json(&feedback)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                service: SERVICE,
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}
