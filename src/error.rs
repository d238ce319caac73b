// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Crate-wide error taxonomy. Individual subsystems (security, llm, templates)
//! define their own `thiserror` enums; this module carries the stage-level
//! errors the workflow engine routes on.

use thiserror::Error;

/// Errors a pipeline stage can raise. `Parse`, `Template` and `Deployment`
/// are recoverable in the sense that the session survives; `Internal`
/// indicates a bug and should never be matched on by callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to parse intent: {0}")]
    Parse(String),

    #[error("missing template for {platform}/{type_} (available: {available:?})")]
    Template {
        platform: String,
        type_: String,
        available: Vec<String>,
    },

    #[error("generation produced no output files")]
    EmptyOutput,

    #[error("deployment operation failed: {0}")]
    Deployment(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The stable kind string recorded on [`crate::models::ErrorRecord`].
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse_error",
            PipelineError::Template { .. } => "template_error",
            PipelineError::EmptyOutput => "empty_output",
            PipelineError::Deployment(_) => "deployment_error",
            PipelineError::Internal(_) => "internal_error",
        }
    }
}

impl From<crate::llm::chat::ChatError> for PipelineError {
    fn from(value: crate::llm::chat::ChatError) -> Self {
        PipelineError::Parse(value.to_string())
    }
}
