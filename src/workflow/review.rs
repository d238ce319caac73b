// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The review stage: an advisory pass over the generated configuration.
//! Never blocks completion and never mutates `generated_code` or
//! `compliance_passed` — it only surfaces resources no enabled policy
//! had anything to say about, so a human reviewer knows where the
//! policy engine was silent rather than satisfied.

use crate::models::{Message, Policy, StageLabel, WorkflowState};

use super::RouteDecision;

fn resources_with_no_applicable_policy(state: &WorkflowState, policies: &[Policy]) -> Vec<String> {
    state
        .resources
        .iter()
        .filter(|r| {
            !policies
                .iter()
                .filter(|p| p.enabled)
                .any(|p| p.cloud_platform.matches(r.platform))
        })
        .map(|r| r.name.clone())
        .collect()
}

/// Always halts at `completed`; appends an informational note when some
/// resource had no enabled policy covering its platform at all.
pub async fn run(state: &mut WorkflowState, policies: &[Policy]) -> RouteDecision {
    let uncovered = resources_with_no_applicable_policy(state, policies);
    if !uncovered.is_empty() {
        state.messages.push(Message::assistant(format!(
            "Note: no policy currently covers the following resource(s), so they were generated without a compliance check: {}",
            uncovered.join(", ")
        )));
    }
    RouteDecision::Halt(StageLabel::Completed)
}
