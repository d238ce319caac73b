// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The parse stage: turns the conversation so far into a raw extraction of
//! canonical resources via the model, or short-circuits for a
//! freshly-seeded spreadsheet session.

use std::time::Duration;

use serde::Deserialize;

use crate::error::PipelineError;
use crate::llm::{ChatCompletion, ChatMessage};
use crate::models::{CanonicalResource, InputType, Message, StageLabel, WorkflowState};

use super::RouteDecision;

const SYSTEM_PROMPT: &str = r#"You translate a user's infrastructure request into a JSON object with this exact shape:
{"resources": [{"platform": "aws"|"azure", "type": "<resource type>", "name": "<logical name>", "properties": {"Tags": {}, ...}}], "message": "<optional note to the user>"}
`resources` must always be the complete, up-to-date list of every resource discussed so far in this conversation, not just what changed in the latest message — treat each turn as additive, never as a replacement.
Extract tag assignments from any phrasing the user uses, including "Tags: {...}", "tag it with X=Y", and non-English phrasings like "标签：X=Y".
If the request is too vague to extract any resource, return an empty "resources" list and set "message" to a clarifying question."#;

#[derive(Debug, Deserialize, Default)]
struct ParseResponse {
    #[serde(default)]
    resources: Vec<CanonicalResource>,
    #[serde(default)]
    message: Option<String>,
}

fn build_messages(state: &WorkflowState) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    for m in &state.messages {
        match m.role {
            crate::models::Role::User => messages.push(ChatMessage::user(m.content.clone())),
            crate::models::Role::Assistant => messages.push(ChatMessage::assistant(m.content.clone())),
        }
    }
    messages
}

fn clarification_fallback(state: &mut WorkflowState, kind: &str, reason: String) -> (RouteDecision, Vec<CanonicalResource>) {
    state.errors.push(crate::models::ErrorRecord {
        kind: kind.to_string(),
        message: reason,
        timestamp: chrono::Utc::now(),
    });
    state
        .messages
        .push(Message::assistant("I couldn't understand that request — could you rephrase it?"));
    (RouteDecision::Halt(StageLabel::Parse), Vec::new())
}

/// Runs the parse stage. Returns the next route plus any freshly extracted
/// resources for the collect stage to merge (empty on the spreadsheet-seed
/// fast path, since those resources are already in `state.resources`).
pub async fn run(
    state: &mut WorkflowState,
    chat: &dyn ChatCompletion,
    timeout: Duration,
) -> Result<(RouteDecision, Vec<CanonicalResource>), PipelineError> {
    let is_spreadsheet_seed = matches!(state.input_type, InputType::Spreadsheet) && state.messages.len() <= 1;

    if is_spreadsheet_seed {
        state.information_complete = true;
        let count = state.resources.len();
        state
            .messages
            .push(Message::assistant(format!("Received {count} resource(s) from the uploaded spreadsheet.")));
        return Ok((RouteDecision::Continue(StageLabel::Comply), Vec::new()));
    }

    let messages = build_messages(state);
    let completion = tokio::time::timeout(timeout, chat.complete(&messages)).await;

    let raw = match completion {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Ok(clarification_fallback(state, "parse_error", e.to_string())),
        Err(_) => return Ok(clarification_fallback(state, "parse_error", "chat completion timed out".to_string())),
    };

    let parsed: ParseResponse = match serde_json::from_str(&raw) {
        Ok(p) => p,
        Err(e) => return Ok(clarification_fallback(state, "parse_error", format!("model response was not valid JSON: {e}"))),
    };

    if parsed.resources.is_empty() {
        state.messages.push(Message::assistant(
            parsed
                .message
                .unwrap_or_else(|| "Could you describe the infrastructure you'd like to create?".to_string()),
        ));
        return Ok((RouteDecision::Halt(StageLabel::Parse), Vec::new()));
    }

    if let Some(note) = parsed.message {
        state.messages.push(Message::assistant(note));
    }

    Ok((RouteDecision::Continue(StageLabel::Collect), parsed.resources))
}
