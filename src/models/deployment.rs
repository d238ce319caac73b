// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deployment and target-environment models for the Terraform executor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Planning,
    PlanReady,
    PlanFailed,
    Applying,
    ApplySuccess,
    ApplyFailed,
    Destroying,
    Destroyed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub add: u32,
    pub change: u32,
    pub destroy: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: String,
    pub session_id: String,
    pub environment_id: String,
    pub status: DeploymentStatus,
    pub plan_output: Option<String>,
    pub plan_summary: Option<PlanSummary>,
    pub apply_output: Option<String>,
    pub terraform_outputs: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    pub fn new(
        deployment_id: impl Into<String>,
        session_id: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            deployment_id: deployment_id.into(),
            session_id: session_id.into(),
            environment_id: environment_id.into(),
            status: DeploymentStatus::Pending,
            plan_output: None,
            plan_summary: None,
            apply_output: None,
            terraform_outputs: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A target cloud environment a deployment runs against. Credentials are
/// always stored pre-encrypted — see [`crate::security::crypto`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub environment_id: String,
    pub platform: Platform,
    pub region_or_location: String,
    pub encrypted_credentials: Vec<u8>,
}
