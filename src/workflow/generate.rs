// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The generation stage: synthesizes the Terraform file set from the
//! compliant resource list.

use crate::error::PipelineError;
use crate::models::{StageLabel, WorkflowState};
use crate::templates::synthesize;

use super::RouteDecision;

/// Synthesizes Terraform files for every resource in `state.resources`.
/// A synthesis failure (missing template, empty output) is not recoverable
/// within the session — it propagates so the engine marks the workflow
/// `error` rather than halting at `generate` for a retry.
pub async fn run(state: &mut WorkflowState) -> Result<RouteDecision, PipelineError> {
    let files = synthesize(&state.resources)?;
    state.generated_code = files;
    Ok(RouteDecision::Continue(StageLabel::Review))
}
