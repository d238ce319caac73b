// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The conversational pipeline: parse → collect → comply → generate →
//! review, driven by [`engine::WorkflowEngine`].

pub mod collect;
pub mod comply;
pub mod engine;
pub mod generate;
pub mod parse;
pub mod review;
pub mod session_store;

pub use engine::WorkflowEngine;
pub use session_store::{InMemorySessionStore, SessionLocks, SessionStore};

use crate::models::{CanonicalResource, StageLabel};

/// What a stage tells the engine to do next. `Continue` dispatches the
/// named stage immediately within the same run; `Halt` stops the loop and
/// becomes the session's resting `workflow_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Continue(StageLabel),
    Halt(StageLabel),
}

/// One turn of user input driving a workflow run. Text input goes through
/// the model at `parse`; spreadsheet input carries its already-ingested
/// resources straight in and skips the model on the first turn.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub message: String,
    pub spreadsheet_resources: Option<Vec<CanonicalResource>>,
}

impl UserInput {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            spreadsheet_resources: None,
        }
    }

    pub fn spreadsheet(message: impl Into<String>, resources: Vec<CanonicalResource>) -> Self {
        Self {
            message: message.into(),
            spreadsheet_resources: Some(resources),
        }
    }
}
