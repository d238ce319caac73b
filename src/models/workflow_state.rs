// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The per-session conversation and pipeline state threaded through every stage.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::CanonicalResource;

/// Who authored a message in the session transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// How the session's resources were originally seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Spreadsheet,
}

/// Where a session currently sits in the pipeline; also used as the halt
/// marker reported back to callers when a run stops short of `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLabel {
    Parse,
    Collect,
    Comply,
    Generate,
    Review,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub policy_id: String,
    pub policy_name: String,
    pub resource_name: String,
    pub detail: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Missing required fields, keyed by resource name, valued by the set of
/// still-missing field names on that resource.
pub type MissingFields = BTreeMap<String, BTreeSet<String>>;

/// The full durable state of one conversation/generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub resources: Vec<CanonicalResource>,
    pub input_type: InputType,
    pub information_complete: bool,
    pub missing_fields: MissingFields,
    pub workflow_state: StageLabel,
    pub compliance_passed: Option<bool>,
    pub violations: Vec<ViolationRecord>,
    pub generated_code: BTreeMap<String, String>,
    pub errors: Vec<ErrorRecord>,
}

impl WorkflowState {
    pub fn new(session_id: impl Into<String>, input_type: InputType) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            resources: Vec::new(),
            input_type,
            information_complete: false,
            missing_fields: BTreeMap::new(),
            workflow_state: StageLabel::Parse,
            compliance_passed: None,
            violations: Vec::new(),
            generated_code: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// `generated_code` is non-empty if and only if `workflow_state == completed`.
    pub fn invariant_generated_code_matches_completion(&self) -> bool {
        !self.generated_code.is_empty() == matches!(self.workflow_state, StageLabel::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_at_parse_with_no_messages() {
        let s = WorkflowState::new("sess-1", InputType::Text);
        assert_eq!(s.workflow_state, StageLabel::Parse);
        assert!(s.messages.is_empty());
        assert!(s.resources.is_empty());
        assert!(!s.information_complete);
    }
}
