// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The compliance stage: evaluates every enabled policy against the
//! canonical resource list.

use crate::error::PipelineError;
use crate::models::{Message, Policy, StageLabel, WorkflowState};
use crate::policy::evaluate;

use super::RouteDecision;

fn compose_violations_message(violations: &[crate::models::ViolationRecord]) -> String {
    let mut lines = vec!["This configuration doesn't pass policy review:".to_string()];
    for v in violations {
        lines.push(format!("- [{:?}] {} ({}): {}", v.severity, v.policy_name, v.resource_name, v.detail));
    }
    lines.join("\n")
}

/// Evaluates `policies` against `state.resources`, recording violations and
/// routing to `generate` only when no error-severity violation fired.
pub async fn run(state: &mut WorkflowState, policies: &[Policy]) -> Result<RouteDecision, PipelineError> {
    let outcome = evaluate(policies, &state.resources);
    state.violations = outcome.violations;
    state.compliance_passed = Some(outcome.compliance_passed);

    if outcome.compliance_passed {
        Ok(RouteDecision::Continue(StageLabel::Generate))
    } else {
        state.messages.push(Message::assistant(compose_violations_message(&state.violations)));
        Ok(RouteDecision::Halt(StageLabel::Comply))
    }
}
