//! Axum route handlers for the post generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent_client::AgentError;
use crate::errors::AppError;
use crate::generation::models::{GenerationRequest, NormalizedResult};
use crate::generation::normalizer::normalize;
use crate::generation::orchestrator::generate;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body posted by the browser form. Every field is optional on the wire so a
/// missing topic reaches validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePostBody {
    pub topic: Option<String>,
    pub context: Option<String>,
    pub tone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePostResponse {
    pub ok: bool,
    pub data: NormalizedResult,
}

#[derive(Debug, Serialize)]
pub struct UpstreamProbe {
    pub url: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ok: bool,
    pub service: &'static str,
    pub upstream: UpstreamProbe,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate-post
///
/// Runs the agent pipeline for one topic and returns the normalized post.
/// Only a missing topic or an upstream failure is an error; odd agent output
/// still answers 200 with placeholder fields.
pub async fn handle_generate_post(
    State(state): State<AppState>,
    body: Result<Json<GeneratePostBody>, JsonRejection>,
) -> Result<Json<GeneratePostResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let request = GenerationRequest::new(body.topic.unwrap_or_default(), body.context, body.tone);

    let run = generate(state.runtime.as_ref(), &state.target, &request).await?;
    let data = normalize(state.runtime.as_ref(), &run.raw, &request, &run.session).await;

    info!(
        "Generated post for session {}: {} chars, {} hashtags, {} visuals",
        data.metadata.session_id,
        data.post.chars().count(),
        data.hashtags.len(),
        data.visual_suggestions.len()
    );

    Ok(Json(GeneratePostResponse { ok: true, data }))
}

/// GET /generate-post
///
/// Health probe for the form. Always 200; reports whether the runtime's own
/// health endpoint answered successfully.
pub async fn handle_generate_post_probe(State(state): State<AppState>) -> Json<ProbeResponse> {
    let url = state.runtime.base_url().to_string();

    let upstream = match state.runtime.health().await {
        Ok(health) => UpstreamProbe {
            url,
            healthy: true,
            status: Some(health.status),
            error: None,
        },
        Err(e) => {
            let status = match &e {
                AgentError::Api { status, .. } => Some(*status),
                AgentError::Http(_) => None,
            };
            UpstreamProbe {
                url,
                healthy: false,
                status,
                error: Some(e.to_string()),
            }
        }
    };

    Json(ProbeResponse {
        ok: true,
        service: env!("CARGO_PKG_NAME"),
        upstream,
    })
}
