//! Response normalization. Turns whatever the agent runtime answered into
//! the one stable `NormalizedResult` shape.
//!
//! Order of trust:
//!   1. session-state read (committed state after the run)
//!   2. the run body's embedded `state`
//!   3. the last turn's message text
//!      (1–3 stop as soon as a post is found; each field keeps its first hit)
//!   4. agent-attributed state deltas, which override 1–3 field by field
//!   5. alternate visual keys, only while visuals are still missing
//!
//! Normalization never fails. Anything missing falls back to a placeholder.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::agent_client::AgentRuntime;
use crate::generation::extract::{
    from_alternate_visual_keys, from_attributed_turns, from_embedded_state, from_last_turn,
    from_session_state, Extraction, Sources,
};
use crate::generation::models::{
    GenerationRequest, NormalizedResult, ResultMetadata, SessionHandle, FALLBACK_POST,
};

type Stage = fn(&Sources<'_>) -> Extraction;

/// Positional stages, most authoritative first.
const POSITIONAL_STAGES: &[(&str, Stage)] = &[
    ("session state", from_session_state),
    ("embedded state", from_embedded_state),
    ("last turn", from_last_turn),
];

/// Reads the session state, then normalizes it together with the run body.
/// A failed state read only removes stage 1 from the chain.
pub async fn normalize(
    runtime: &dyn AgentRuntime,
    raw: &Value,
    request: &GenerationRequest,
    session: &SessionHandle,
) -> NormalizedResult {
    let session_state = match runtime.session_state(session).await {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(
                "Session state read failed for {}: {e}; continuing without it",
                session.session_id
            );
            None
        }
    };

    let sources = Sources {
        session_state: session_state.as_ref(),
        raw,
    };
    normalize_sources(&sources, request, session, Utc::now())
}

/// The pure half of `normalize`.
pub fn normalize_sources(
    sources: &Sources<'_>,
    request: &GenerationRequest,
    session: &SessionHandle,
    generated_at: DateTime<Utc>,
) -> NormalizedResult {
    let merged = run_chain(sources);

    if merged.post.is_none() {
        debug!(
            "No stage produced a post for session {}; using placeholder",
            session.session_id
        );
    }

    NormalizedResult {
        post: merged.post.unwrap_or_else(|| FALLBACK_POST.to_string()),
        hashtags: merged.hashtags.unwrap_or_default(),
        visual_suggestions: merged.visuals.unwrap_or_default(),
        metadata: ResultMetadata {
            topic: request.topic.clone(),
            context: request.context.clone(),
            tone: request.tone.clone(),
            generated_at,
            session_id: session.session_id.clone(),
        },
    }
}

fn run_chain(sources: &Sources<'_>) -> Extraction {
    let mut merged = Extraction::default();

    for (name, stage) in POSITIONAL_STAGES {
        if merged.post.is_some() {
            break;
        }
        let found = stage(sources);
        if found.post.is_some() {
            debug!("Post taken from {name} stage");
        }
        merged.fill_from(found);
    }

    let attributed = from_attributed_turns(sources);
    if attributed != Extraction::default() {
        debug!("Attributed turns override: {attributed:?}");
    }
    merged.override_with(attributed);

    if merged.visuals.is_none() {
        merged.visuals = from_alternate_visual_keys(sources);
    }

    merged
}
