// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The collection stage: merges freshly parsed resources into the
//! session's canonical list and checks every resource against the
//! required-fields table.

use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::models::{CanonicalResource, Message, StageLabel, WorkflowState};
use crate::resources::{merge_into, required_fields::missing_fields};

use super::RouteDecision;

fn compose_missing_fields_message(missing: &BTreeMap<String, std::collections::BTreeSet<String>>) -> String {
    let mut lines = vec!["A few more details are needed before I can continue:".to_string()];
    for (resource_name, fields) in missing {
        let fields_list: Vec<&str> = fields.iter().map(String::as_str).collect();
        lines.push(format!("- {resource_name}: {}", fields_list.join(", ")));
    }
    lines.join("\n")
}

/// Merges `pending` into `state.resources` and recomputes `missing_fields`
/// across the whole resource list. Routes to `comply` once every resource
/// has its required fields; otherwise halts at `collect` with a follow-up
/// question.
pub async fn run(state: &mut WorkflowState, pending: Vec<CanonicalResource>) -> Result<RouteDecision, PipelineError> {
    let warnings = merge_into(&mut state.resources, pending);
    for warning in &warnings {
        tracing::warn!(session_id = %state.session_id, warning, "resource merge warning");
    }

    let mut missing = BTreeMap::new();
    for resource in &state.resources {
        let fields = missing_fields(&resource.type_, &resource.properties);
        if !fields.is_empty() {
            missing.insert(resource.name.clone(), fields);
        }
    }
    state.missing_fields = missing.clone();

    if missing.is_empty() {
        state.information_complete = true;
        Ok(RouteDecision::Continue(StageLabel::Comply))
    } else {
        state.information_complete = false;
        state.messages.push(Message::assistant(compose_missing_fields_message(&missing)));
        Ok(RouteDecision::Halt(StageLabel::Collect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputType, Platform};
    use serde_json::json;

    fn incomplete_ec2() -> CanonicalResource {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        r.properties.insert("instance_type".into(), json!("t3.micro"));
        r
    }

    fn complete_ec2() -> CanonicalResource {
        let mut r = incomplete_ec2();
        r.properties.insert("ami".into(), json!("ami-1"));
        r.properties.insert("region".into(), json!("us-east-1"));
        r
    }

    #[tokio::test]
    async fn halts_at_collect_when_fields_missing() {
        let mut state = WorkflowState::new("s1", InputType::Text);
        let route = run(&mut state, vec![incomplete_ec2()]).await.unwrap();
        assert!(matches!(route, RouteDecision::Halt(StageLabel::Collect)));
        assert!(!state.information_complete);
        assert!(state.missing_fields.contains_key("web"));
    }

    #[tokio::test]
    async fn advances_to_comply_when_all_fields_present() {
        let mut state = WorkflowState::new("s1", InputType::Text);
        let route = run(&mut state, vec![complete_ec2()]).await.unwrap();
        assert!(matches!(route, RouteDecision::Continue(StageLabel::Comply)));
        assert!(state.information_complete);
        assert!(state.missing_fields.is_empty());
    }

    #[tokio::test]
    async fn merges_with_existing_resources_across_turns() {
        let mut state = WorkflowState::new("s1", InputType::Text);
        state.resources.push(incomplete_ec2());
        let mut addition = CanonicalResource::new(Platform::Aws, "aws_ec2", "Web");
        addition.properties.insert("ami".into(), json!("ami-1"));
        addition.properties.insert("region".into(), json!("us-east-1"));

        let route = run(&mut state, vec![addition]).await.unwrap();
        assert_eq!(state.resources.len(), 1);
        assert!(matches!(route, RouteDecision::Continue(StageLabel::Comply)));
    }
}
