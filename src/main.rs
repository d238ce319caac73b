// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Minimal demo driver for the pipeline. The HTTP surface a real deployment
//! would sit behind is out of scope for this crate (see [`terraforge_core`]);
//! this binary exercises [`WorkflowEngine::run`] directly against a single
//! in-memory session so the pipeline can be driven from a terminal.

use std::sync::Arc;
use std::time::Duration;

use terraforge_core::llm::DemoChatCompletion;
use terraforge_core::models::{ProgressEvent, StageStatus};
use terraforge_core::workflow::{InMemorySessionStore, UserInput, WorkflowEngine};

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// JSON logs in release builds, pretty console output in debug builds.
/// Verbosity is controlled via `RUST_LOG` (default `info`).
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("terraforge_core=info,warn"));

    #[cfg(not(debug_assertions))]
    {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

        tracing_subscriber::registry().with(env_filter).with(json_layer).init();
    }

    #[cfg(debug_assertions)]
    {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .pretty();

        tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Create an EC2 instance named web with instance_type t3.micro, ami ami-0abcd, region us-east-1".to_string());

    let chat_response = r#"{"resources":[{"platform":"aws","type":"aws_ec2","name":"web","properties":{"instance_type":"t3.micro","ami":"ami-0abcd","region":"us-east-1","Tags":{"Project":"demo"}}}]}"#;

    let engine = WorkflowEngine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(DemoChatCompletion::new(chat_response)),
        Vec::new(),
        Duration::from_secs(30),
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event.status {
                StageStatus::Started => tracing::info!(stage = %event.stage, "stage started"),
                StageStatus::Completed => tracing::info!(stage = %event.stage, "stage completed"),
                StageStatus::Failed => tracing::warn!(stage = %event.stage, message = ?event.message, "stage failed"),
            }
        }
    });

    let state = engine.run("demo-session", UserInput::text(prompt), progress_tx).await;

    tracing::info!(workflow_state = ?state.workflow_state, resource_count = state.resources.len(), "run finished");
    for (filename, content) in &state.generated_code {
        println!("--- {filename} ---\n{content}");
    }
    for message in &state.messages {
        println!("[{:?}] {}", message.role, message.content);
    }

    Ok(())
}
