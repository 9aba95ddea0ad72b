// Post generation: orchestrate one pipeline run on the agent runtime, then
// normalize its multi-shaped answer into a single stable result.
// All runtime calls go through agent_client; no direct HTTP here.

pub mod extract;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
