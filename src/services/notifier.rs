//! Webhook delivery of the run transcript
//!
//! Sends the finished report to a WeCom (qiyewechat) group robot as a
//! markdown message. Delivery is best-effort: callers log failures and never
//! let them change the run's exit status.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Markdown robot message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownMessage {
    pub msgtype: String,
    pub markdown: MarkdownContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    pub content: String,
}

impl MarkdownMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            msgtype: "markdown".to_string(),
            markdown: MarkdownContent { content: content.into() },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The request never produced a response
    #[error("webhook delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200
    #[error("failed to send alert, response code: {status}")]
    Status { status: u16, body: String },
}

/// Webhook delivery client
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    /// POST the report once. Only HTTP 200 counts as delivered.
    pub async fn notify(&self, report: &str) -> Result<(), NotifyError> {
        let response =
            self.client.post(&self.url).json(&MarkdownMessage::new(report)).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status: status.as_u16(), body });
        }

        info!(status_code = status.as_u16(), "Run report delivered to webhook");
        Ok(())
    }

    /// Deliver and log the outcome. Returns whether delivery succeeded.
    pub async fn notify_best_effort(&self, report: &str) -> bool {
        match self.notify(report).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to deliver run report to webhook");
                false
            }
        }
    }
}
