// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios exercising the full parse → collect → comply →
//! generate → review pipeline through the public `WorkflowEngine` API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use terraforge_core::llm::ScriptedChatCompletion;
use terraforge_core::models::{CanonicalResource, CompiledRule, Platform, Policy, PolicyPlatform, Severity, StageLabel};
use terraforge_core::workflow::{InMemorySessionStore, UserInput, WorkflowEngine};

fn required_tags_policy(platform: PolicyPlatform, tags: &[&str]) -> Policy {
    let mut p = Policy::new("project-tag", "require project tag", "n/a", platform, Severity::Error);
    p.compiled_logic = Some(CompiledRule::RequiredTags {
        tags: tags.iter().map(|t| t.to_string()).collect(),
    });
    p
}

fn block_port_22_policy() -> Policy {
    let mut p = Policy::new("no-ssh-open", "block ssh from anywhere", "n/a", PolicyPlatform::Aws, Severity::Error);
    p.compiled_logic = Some(CompiledRule::BlockPorts {
        ports: vec![22],
        directions: vec![terraforge_core::models::Direction::Ingress],
        cidrs: vec![],
    });
    p
}

#[tokio::test]
async fn scenario_follow_up_tag_repair() {
    let turn_one = r#"{"resources":[{"platform":"azure","type":"azure_vm","name":"web","properties":{"size":"Standard_B2s","location":"East US","resource_group":"my-rg","admin_username":"azureadmin","os":"linux","Tags":{}}}]}"#;
    let turn_two = r#"{"resources":[{"platform":"azure","type":"azure_vm","name":"web","properties":{"size":"Standard_B2s","location":"East US","resource_group":"my-rg","admin_username":"azureadmin","os":"linux","Tags":{"Project":"X","Owner":"Y"}}}]}"#;

    let engine = WorkflowEngine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScriptedChatCompletion::new(vec![turn_one.to_string(), turn_two.to_string()])),
        vec![required_tags_policy(PolicyPlatform::Azure, &["Project"])],
        Duration::from_secs(1),
    );
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

    let after_turn_one = engine
        .run(
            "s1",
            UserInput::text("create azure vm in East US, size Standard_B2s, rg my-rg, admin azureadmin, ssh ..."),
            tx.clone(),
        )
        .await;
    assert_eq!(after_turn_one.workflow_state, StageLabel::Comply);
    assert_eq!(after_turn_one.compliance_passed, Some(false));

    let after_turn_two = engine.run("s1", UserInput::text("Tags: Project=X, Owner=Y"), tx).await;
    assert_eq!(after_turn_two.workflow_state, StageLabel::Completed);
    assert_eq!(after_turn_two.compliance_passed, Some(true));
    assert_eq!(after_turn_two.resources.len(), 1);

    let main_tf = &after_turn_two.generated_code["main.tf"];
    assert!(main_tf.contains("Project = \"X\""));
    assert!(main_tf.contains("Owner = \"Y\""));
}

#[tokio::test]
async fn scenario_spreadsheet_upload_with_metadata_mirror() {
    use terraforge_core::spreadsheet::ingest;

    let mut row = std::collections::BTreeMap::new();
    row.insert("platform".to_string(), json!("aws"));
    row.insert("type".to_string(), json!("aws_s3_bucket"));
    row.insert("name".to_string(), json!("data-lake"));
    row.insert("Project".to_string(), json!("abc"));
    row.insert("Environment".to_string(), json!("Production"));
    row.insert("Tags".to_string(), json!({"App": "Web"}));
    row.insert("bucket_name".to_string(), json!("my-data-lake"));
    row.insert("region".to_string(), json!("us-east-1"));

    let ingested = ingest(vec![row]).unwrap();
    assert_eq!(ingested.resources.len(), 1);
    let tags = ingested.resources[0].tags();
    assert_eq!(tags.get("App"), Some(&json!("Web")));
    assert_eq!(tags.get("Project"), Some(&json!("abc")));
    assert_eq!(tags.get("Environment"), Some(&json!("Production")));

    let engine = WorkflowEngine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScriptedChatCompletion::new(vec![])),
        vec![required_tags_policy(PolicyPlatform::Aws, &["project"])],
        Duration::from_secs(1),
    );
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

    let state = engine
        .run("s1", UserInput::spreadsheet("uploaded a spreadsheet", ingested.resources), tx)
        .await;
    assert_eq!(state.workflow_state, StageLabel::Completed);
    assert_eq!(state.compliance_passed, Some(true));
}

#[tokio::test]
async fn scenario_port_policy_blocks_generation() {
    let response = r#"{"resources":[{"platform":"aws","type":"aws_security_group","name":"web-sg","properties":{"description":"web sg","region":"us-east-1","ingress_rules":[{"from_port":22,"to_port":22,"cidr_blocks":["0.0.0.0/0"]}],"Tags":{}}}]}"#;
    let engine = WorkflowEngine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScriptedChatCompletion::new(vec![response.to_string()])),
        vec![block_port_22_policy()],
        Duration::from_secs(1),
    );
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

    let state = engine.run("s1", UserInput::text("open a security group for ssh from anywhere"), tx).await;
    assert_eq!(state.workflow_state, StageLabel::Comply);
    assert_eq!(state.compliance_passed, Some(false));
    assert!(state.generated_code.is_empty());
}

#[tokio::test]
async fn scenario_type_alias_merge_across_turns() {
    let turn_one = r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"instance_type":"t3.micro","Tags":{}}}]}"#;
    let turn_two = r#"{"resources":[{"platform":"aws","type":"EC2","name":"Web","properties":{"ami":"ami-1","region":"us-east-1","Tags":{}}}]}"#;

    let engine = WorkflowEngine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(ScriptedChatCompletion::new(vec![turn_one.to_string(), turn_two.to_string()])),
        Vec::new(),
        Duration::from_secs(1),
    );
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

    let after_turn_one = engine.run("s1", UserInput::text("add a t3.micro ec2 named web"), tx.clone()).await;
    assert_eq!(after_turn_one.workflow_state, StageLabel::Collect);
    assert_eq!(after_turn_one.resources.len(), 1);

    let after_turn_two = engine.run("s1", UserInput::text("also give it an ami and region"), tx).await;
    assert_eq!(after_turn_two.resources.len(), 1);
    assert_eq!(after_turn_two.resources[0].type_, "aws_ec2");
    assert_eq!(after_turn_two.resources[0].name, "web");
    assert_eq!(after_turn_two.workflow_state, StageLabel::Completed);
}

#[tokio::test]
async fn scenario_empty_output_detection_marks_workflow_error() {
    use terraforge_core::templates::synthesize;

    // `gcp_instance` has no registered template; synthesis must fail rather
    // than silently skip the resource.
    let resource = CanonicalResource::new(Platform::Aws, "gcp_instance", "mystery");
    let result = synthesize(&[resource]);
    assert!(result.is_err());
}
