// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The deployment executor: drives `terraform init/plan/apply/destroy` in
//! an isolated working directory per deployment, tracked through the
//! `pending → planning → {plan_ready|plan_failed} → applying → {apply_success|apply_failed} → destroying → destroyed`
//! state machine.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::{Deployment, DeploymentStatus, Environment, PlanSummary};
use crate::security::CredentialVault;

use super::process::{self};

static PLAN_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Plan:\s*(\d+)\s*to add,\s*(\d+)\s*to change,\s*(\d+)\s*to destroy").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct DeployTimeouts {
    pub init: Duration,
    pub plan: Duration,
    pub apply: Duration,
    pub destroy: Duration,
}

impl Default for DeployTimeouts {
    fn default() -> Self {
        Self {
            init: Duration::from_secs(60),
            plan: Duration::from_secs(120),
            apply: Duration::from_secs(300),
            destroy: Duration::from_secs(180),
        }
    }
}

struct DeploymentEntry {
    deployment: Deployment,
    environment: Environment,
    working_dir: PathBuf,
}

pub struct DeploymentExecutor {
    entries: RwLock<HashMap<String, Arc<Mutex<DeploymentEntry>>>>,
    vault: Arc<CredentialVault>,
    workdir_root: PathBuf,
    timeouts: DeployTimeouts,
}

impl DeploymentExecutor {
    pub fn new(vault: Arc<CredentialVault>, workdir_root: PathBuf, timeouts: DeployTimeouts) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            vault,
            workdir_root,
            timeouts,
        }
    }

    async fn entry(&self, deployment_id: &str) -> Result<Arc<Mutex<DeploymentEntry>>, PipelineError> {
        self.entries
            .read()
            .await
            .get(deployment_id)
            .cloned()
            .ok_or_else(|| PipelineError::Deployment(format!("unknown deployment id: {deployment_id}")))
    }

    fn credential_env_vars(&self, environment: &Environment) -> Result<Vec<(String, String)>, PipelineError> {
        let plaintext = self
            .vault
            .decrypt(&environment.encrypted_credentials)
            .map_err(|e| PipelineError::Deployment(format!("failed to decrypt credentials: {e}")))?;
        let parsed: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| PipelineError::Deployment(format!("credential payload is not valid JSON: {e}")))?;
        let obj = parsed
            .as_object()
            .ok_or_else(|| PipelineError::Deployment("credential payload must be a JSON object".to_string()))?;
        Ok(obj
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect())
    }

    /// Writes `files` into a fresh working directory and runs
    /// `terraform init` then `terraform plan`. Credential or I/O setup
    /// failures are propagated as `Err`; subprocess failures are captured
    /// onto the returned `Deployment` with status `plan_failed`.
    pub async fn plan(
        &self,
        session_id: &str,
        environment: Environment,
        files: &BTreeMap<String, String>,
    ) -> Result<Deployment, PipelineError> {
        let deployment_id = Uuid::new_v4().to_string();
        let working_dir = self.workdir_root.join(&deployment_id);
        tokio::fs::create_dir_all(&working_dir)
            .await
            .map_err(|e| PipelineError::Deployment(format!("failed to create working directory: {e}")))?;

        for (filename, content) in files {
            tokio::fs::write(working_dir.join(filename), content)
                .await
                .map_err(|e| PipelineError::Deployment(format!("failed to write {filename}: {e}")))?;
        }

        let mut deployment = Deployment::new(deployment_id.clone(), session_id, &environment.environment_id);
        deployment.status = DeploymentStatus::Planning;

        let env_vars = match self.credential_env_vars(&environment) {
            Ok(vars) => vars,
            Err(e) => {
                deployment.status = DeploymentStatus::PlanFailed;
                deployment.error_message = Some(e.to_string());
                deployment.touch();
                self.store(deployment_id, deployment.clone(), environment, working_dir).await;
                return Ok(deployment);
            }
        };

        if let Err(e) = process::run_terraform(&working_dir, &["init", "-input=false"], &env_vars, self.timeouts.init).await {
            deployment.status = DeploymentStatus::PlanFailed;
            deployment.error_message = Some(e.to_string());
            deployment.touch();
            self.store(deployment_id, deployment.clone(), environment, working_dir).await;
            return Ok(deployment);
        }

        match process::run_terraform(
            &working_dir,
            &["plan", "-input=false", "-out=tfplan"],
            &env_vars,
            self.timeouts.plan,
        )
        .await
        {
            Ok(output) => {
                deployment.plan_summary = Some(parse_plan_summary(&output.stdout));
                deployment.plan_output = Some(output.stdout);
                deployment.status = DeploymentStatus::PlanReady;
            }
            Err(e) => {
                deployment.status = DeploymentStatus::PlanFailed;
                deployment.error_message = Some(e.to_string());
            }
        }

        deployment.touch();
        self.store(deployment_id, deployment.clone(), environment, working_dir).await;
        Ok(deployment)
    }

    /// Requires `plan_ready`. Runs `terraform apply tfplan`.
    pub async fn apply(&self, deployment_id: &str) -> Result<Deployment, PipelineError> {
        let entry_lock = self.entry(deployment_id).await?;
        let mut entry = entry_lock.lock().await;

        if entry.deployment.status != DeploymentStatus::PlanReady {
            return Err(PipelineError::Deployment(format!(
                "deployment {deployment_id} is not plan_ready (current status: {:?})",
                entry.deployment.status
            )));
        }

        entry.deployment.status = DeploymentStatus::Applying;
        let env_vars = self.credential_env_vars(&entry.environment)?;

        match process::run_terraform(&entry.working_dir, &["apply", "-input=false", "tfplan"], &env_vars, self.timeouts.apply).await {
            Ok(output) => {
                entry.deployment.apply_output = Some(output.stdout);
                if let Ok(outputs) =
                    process::run_terraform(&entry.working_dir, &["output", "-json"], &env_vars, self.timeouts.apply).await
                {
                    entry.deployment.terraform_outputs = serde_json::from_str(&outputs.stdout).ok();
                }
                entry.deployment.status = DeploymentStatus::ApplySuccess;
            }
            Err(e) => {
                entry.deployment.status = DeploymentStatus::ApplyFailed;
                entry.deployment.error_message = Some(e.to_string());
            }
        }

        entry.deployment.touch();
        Ok(entry.deployment.clone())
    }

    /// Runs `terraform destroy -auto-approve`. Idempotent once the
    /// deployment has reached `destroyed`; a failed attempt leaves the
    /// deployment in its prior status so a caller can retry.
    pub async fn destroy(&self, deployment_id: &str) -> Result<Deployment, PipelineError> {
        let entry_lock = self.entry(deployment_id).await?;
        let mut entry = entry_lock.lock().await;

        if entry.deployment.status == DeploymentStatus::Destroyed {
            return Ok(entry.deployment.clone());
        }

        let previous_status = entry.deployment.status;
        entry.deployment.status = DeploymentStatus::Destroying;
        let env_vars = self.credential_env_vars(&entry.environment)?;

        match process::run_terraform(&entry.working_dir, &["destroy", "-auto-approve"], &env_vars, self.timeouts.destroy).await {
            Ok(_) => entry.deployment.status = DeploymentStatus::Destroyed,
            Err(e) => {
                entry.deployment.status = previous_status;
                entry.deployment.error_message = Some(e.to_string());
            }
        }

        entry.deployment.touch();
        Ok(entry.deployment.clone())
    }

    /// Removes the deployment's working directory. Meant to be invoked
    /// once a deployment's retention window has elapsed, not immediately
    /// on reaching a terminal state — post-mortem diagnostics rely on the
    /// directory surviving long enough to be inspected.
    pub async fn cleanup(&self, deployment_id: &str) -> Result<(), PipelineError> {
        let entry_lock = self.entry(deployment_id).await?;
        let entry = entry_lock.lock().await;
        let terminal = matches!(
            entry.deployment.status,
            DeploymentStatus::PlanFailed | DeploymentStatus::ApplySuccess | DeploymentStatus::ApplyFailed | DeploymentStatus::Destroyed
        );
        if terminal {
            let _ = tokio::fs::remove_dir_all(&entry.working_dir).await;
        }
        Ok(())
    }

    pub async fn get(&self, deployment_id: &str) -> Option<Deployment> {
        let entries = self.entries.read().await;
        let entry = entries.get(deployment_id)?;
        Some(entry.lock().await.deployment.clone())
    }

    async fn store(&self, deployment_id: String, deployment: Deployment, environment: Environment, working_dir: PathBuf) {
        let entry = DeploymentEntry {
            deployment,
            environment,
            working_dir,
        };
        self.entries.write().await.insert(deployment_id, Arc::new(Mutex::new(entry)));
    }
}

fn parse_plan_summary(stdout: &str) -> PlanSummary {
    PLAN_SUMMARY
        .captures(stdout)
        .map(|c| PlanSummary {
            add: c[1].parse().unwrap_or(0),
            change: c[2].parse().unwrap_or(0),
            destroy: c[3].parse().unwrap_or(0),
        })
        .unwrap_or_default()
}
