use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const DEFAULT_TONE: &str = "professional";

/// Placeholder post returned when no stage yields any post text.
pub const FALLBACK_POST: &str = "No response generated";

// ────────────────────────────────────────────────────────────────────────────
// Request side
// ────────────────────────────────────────────────────────────────────────────

/// One caller's request for a post. Blank optional fields collapse to their
/// defaults at construction; `topic` is checked by `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub context: Option<String>,
    pub tone: String,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, context: Option<String>, tone: Option<String>) -> Self {
        Self {
            topic: topic.into().trim().to_string(),
            context: context
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            tone: tone
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TONE.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic.is_empty() {
            return Err(AppError::Validation("Topic is required".to_string()));
        }
        Ok(())
    }
}

/// Coordinates of one conversation on the agent runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub service_base_url: String,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionHandle {
    /// Builds a handle with a fresh session id.
    ///
    /// UUIDv7 leads with the millisecond timestamp and ends in random bits, so
    /// two requests landing in the same millisecond still get distinct ids.
    pub fn fresh(
        service_base_url: impl Into<String>,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            service_base_url: service_base_url.into(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: format!("session_{}", Uuid::now_v7().simple()),
        }
    }

    pub fn session_url(&self) -> String {
        format!(
            "{}/apps/{}/users/{}/sessions/{}",
            self.service_base_url, self.app_name, self.user_id, self.session_id
        )
    }

    pub fn state_url(&self) -> String {
        format!("{}/state", self.session_url())
    }

    pub fn run_url(&self) -> String {
        format!("{}/run", self.service_base_url)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub topic: String,
    pub context: Option<String>,
    pub tone: String,
    pub generated_at: DateTime<Utc>,
    pub session_id: String,
}

/// The one stable shape returned to callers, whatever the runtime sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub post: String,
    pub hashtags: Vec<String>,
    pub visual_suggestions: Vec<String>,
    pub metadata: ResultMetadata,
}
