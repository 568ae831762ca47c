use crate::navigation::Route;
use crate::transcript::TranscriptMessage;
use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payload sent to the feedback service once a call ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<TranscriptMessage>,
    /// Set when re-taking an interview, so the service overwrites the old
    /// evaluation instead of creating a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    pub success: bool,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

/// The external service that turns a transcript into a stored evaluation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn create_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResult>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback service responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("feedback service could not be reached: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the feedback service.
pub struct FeedbackClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FeedbackClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/feedback", self.base_url)
    }
}

#[async_trait]
impl FeedbackService for FeedbackClient {
    async fn create_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResult> {
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(FeedbackError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedbackError::Status(status).into());
        }

        response
            .json::<FeedbackResult>()
            .await
            .map_err(FeedbackError::from)
            .context("Failed to decode feedback service response")
    }
}

/// What the session should do once feedback generation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    FeedbackReady { feedback_id: String },
    Home,
}

impl NavigationOutcome {
    pub fn route(&self, interview_id: &str) -> Route {
        match self {
            NavigationOutcome::FeedbackReady { feedback_id } => {
                Route::feedback(interview_id, feedback_id)
            }
            NavigationOutcome::Home => Route::Home,
        }
    }
}

/// Issues the one-time feedback request for a finished call and maps its
/// result to a navigation outcome. Never fails: every error ends at `Home`.
#[derive(Clone)]
pub struct FeedbackDispatcher {
    service: Arc<dyn FeedbackService>,
}

impl FeedbackDispatcher {
    pub fn new(service: Arc<dyn FeedbackService>) -> Self {
        Self { service }
    }

    pub async fn dispatch(
        &self,
        transcript: Vec<TranscriptMessage>,
        interview_id: &str,
        user_id: &str,
        feedback_id: Option<&str>,
    ) -> NavigationOutcome {
        if transcript.is_empty() {
            tracing::info!("No transcript captured for {}, skipping feedback", interview_id);
            return NavigationOutcome::Home;
        }

        let request = FeedbackRequest {
            interview_id: interview_id.to_string(),
            user_id: user_id.to_string(),
            transcript,
            feedback_id: feedback_id.map(str::to_string),
        };
        tracing::info!(
            "Requesting feedback for {} ({} messages)",
            interview_id,
            request.transcript.len()
        );

        match self.service.create_feedback(request).await {
            Ok(FeedbackResult {
                success: true,
                feedback_id: Some(id),
            }) => {
                tracing::info!("Feedback {} generated for {}", id, interview_id);
                NavigationOutcome::FeedbackReady { feedback_id: id }
            }
            Ok(result) => {
                tracing::error!("Feedback service did not produce feedback: {:?}", result);
                NavigationOutcome::Home
            }
            Err(e) => {
                tracing::error!("Error saving feedback: {:?}", e);
                NavigationOutcome::Home
            }
        }
    }
}
