//! Planner prompt
//!
//! Retrieved queries are rendered as YAML, history most-recent-first.

use tracing::warn;

use crate::plan::PLAN_MARKER;
use crate::retrieval::RetrievalHit;
use crate::validation::SENTINEL;

/// Render the YAML block describing the candidate queries
pub fn render_hits(hits: &[RetrievalHit]) -> String {
    match serde_yaml::to_string(hits) {
        Ok(yaml) => yaml,
        Err(e) => {
            warn!("Could not render queries as YAML, using JSON: {}", e);
            serde_json::to_string_pretty(hits).unwrap_or_default()
        }
    }
}

/// Join history newest first; callers send it oldest first
pub fn render_history(history: &[String]) -> String {
    history
        .iter()
        .rev()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full prompt sent to the generation backend
pub fn build_prompt(text: &str, hits: &[RetrievalHit], history: &[String]) -> String {
    format!(
        "You are a planner. Based on the user input and the available queries, produce a JSON \
array called {marker}[ ... ] with a plan of steps. Each step is an object with fields: step (int), \
name (string equal to a query name), parameters (object keyed by the query's parameter names). \
Use only the provided query names and parameter names. If the value of a parameter cannot be \
determined from the user input or the conversation, set it to \"{sentinel}\" instead of guessing.\n\n\
Conversation context (most recent first):\n{history}\n\n\
User: {user}\n\n\
Available queries (YAML):\n{queries}\n\n\
Return only your plan as {marker}[ ... ] and nothing else.",
        marker = PLAN_MARKER,
        sentinel = SENTINEL,
        history = render_history(history),
        user = text,
        queries = render_hits(hits),
    )
}
