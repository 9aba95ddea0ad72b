/// Agent runtime client: the single point of entry for all calls to the
/// external agent runtime that hosts the post-generation pipeline.
///
/// ARCHITECTURAL RULE: No other module may talk HTTP to the runtime.
/// Orchestration and normalization go through the `AgentRuntime` trait so
/// they can be driven by an in-process fake in tests.
///
/// Every call is a single attempt. Nothing here retries.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::generation::models::SessionHandle;

pub mod roles;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent runtime error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// Outcome of the idempotent session-creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCreation {
    Created,
    AlreadyExisted,
}

/// What the runtime's own health endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamHealth {
    pub status: u16,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    app_name: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    new_message: NewMessage<'a>,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: &'a str,
    parts: Vec<MessagePart<'a>>,
}

#[derive(Debug, Serialize)]
struct MessagePart<'a> {
    text: &'a str,
}

/// The runtime operations the service depends on.
///
/// Carried in `AppState` as `Arc<dyn AgentRuntime>`.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Creates the session; an "already exists" answer is not an error.
    async fn create_session(&self, session: &SessionHandle)
        -> Result<SessionCreation, AgentError>;

    /// Submits one user message and returns the raw, untyped response body.
    async fn run(&self, session: &SessionHandle, instruction: &str) -> Result<Value, AgentError>;

    /// Reads the session's committed state.
    async fn session_state(&self, session: &SessionHandle) -> Result<Value, AgentError>;

    /// Probes the runtime's own liveness endpoint.
    async fn health(&self) -> Result<UpstreamHealth, AgentError>;

    /// Base URL reported by the health probe.
    fn base_url(&self) -> &str;
}

/// `AgentRuntime` over the runtime's REST API.
#[derive(Clone)]
pub struct AdkClient {
    client: Client,
    base_url: String,
}

impl AdkClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AgentRuntime for AdkClient {
    async fn create_session(
        &self,
        session: &SessionHandle,
    ) -> Result<SessionCreation, AgentError> {
        let response = self
            .client
            .post(session.session_url())
            .json(&json!({}))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            debug!("Session {} already exists, reusing it", session.session_id);
            return Ok(SessionCreation::AlreadyExisted);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Session creation returned {}: {}", status, body);
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Session {} created", session.session_id);
        Ok(SessionCreation::Created)
    }

    async fn run(&self, session: &SessionHandle, instruction: &str) -> Result<Value, AgentError> {
        let request_body = RunRequest {
            app_name: &session.app_name,
            user_id: &session.user_id,
            session_id: &session.session_id,
            new_message: NewMessage {
                role: "user",
                parts: vec![MessagePart { text: instruction }],
            },
        };

        let response = self
            .client
            .post(session.run_url())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!("Run returned {}: {}", status, body);
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "Run succeeded for session {} ({} bytes)",
            session.session_id,
            body.len()
        );
        Ok(parse_lenient(&body))
    }

    async fn session_state(&self, session: &SessionHandle) -> Result<Value, AgentError> {
        let response = self.client.get(session.state_url()).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_lenient(&body))
    }

    async fn health(&self) -> Result<UpstreamHealth, AgentError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(UpstreamHealth {
            status: status.as_u16(),
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Parses a response body as JSON, degrading to `Value::Null` when the
/// runtime sent something that is not JSON at all.
fn parse_lenient(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Agent runtime returned a non-JSON body ({e}); treating it as empty");
            Value::Null
        }
    }
}
