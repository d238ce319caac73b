// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Non-blocking progress notifications emitted while a workflow runs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: String,
    pub stage: String,
    pub status: StageStatus,
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(
        session_id: impl Into<String>,
        stage: impl Into<String>,
        status: StageStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            stage: stage.into(),
            status,
            message,
        }
    }
}
