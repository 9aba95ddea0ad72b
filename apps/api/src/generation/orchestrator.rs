//! Request orchestration: validate, open a session, submit one instruction.
//!
//! Flow: validate → fresh SessionHandle → create_session (409 is fine) →
//!       build_instruction → run → raw result.
//!
//! Calls are sequential and single-attempt; any upstream failure aborts.

use serde_json::Value;
use tracing::info;

use crate::agent_client::{AgentRuntime, SessionCreation};
use crate::config::Config;
use crate::errors::AppError;
use crate::generation::models::{GenerationRequest, SessionHandle};
use crate::generation::prompts::build_instruction;

/// Which app and user on the runtime this service speaks as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTarget {
    pub base_url: String,
    pub app_name: String,
    pub user_id: String,
}

impl AgentTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.agent_base_url.clone(),
            app_name: config.agent_app_name.clone(),
            user_id: config.agent_user_id.clone(),
        }
    }
}

/// Raw output of one pipeline run, with the session it ran in.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    pub session: SessionHandle,
    pub raw: Value,
}

pub async fn generate(
    runtime: &dyn AgentRuntime,
    target: &AgentTarget,
    request: &GenerationRequest,
) -> Result<GenerationRun, AppError> {
    request.validate()?;

    let session =
        SessionHandle::fresh(&target.base_url, &target.app_name, &target.user_id);

    match runtime.create_session(&session).await? {
        SessionCreation::Created => info!("Created session {}", session.session_id),
        SessionCreation::AlreadyExisted => {
            info!("Session {} already existed, proceeding", session.session_id)
        }
    }

    let instruction = build_instruction(
        &request.topic,
        request.context.as_deref(),
        &request.tone,
    );

    info!(
        "Running pipeline for topic {:?} (tone: {}) in session {}",
        request.topic, request.tone, session.session_id
    );
    let raw = runtime.run(&session, &instruction).await?;

    Ok(GenerationRun { session, raw })
}
