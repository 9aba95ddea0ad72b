use std::sync::Arc;

use crate::agent_client::AgentRuntime;
use crate::generation::orchestrator::AgentTarget;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds nothing mutable: every request builds its own session.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable runtime client. Default: AdkClient; tests use an in-process fake.
    pub runtime: Arc<dyn AgentRuntime>,
    pub target: AgentTarget,
}
