// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The thin chat-completion boundary the parse stage talks to.
//!
//! The real model provider sits behind this trait and is out of scope here;
//! what lives in this crate is the contract (messages in, JSON-shaped text
//! out) and two deterministic stand-ins used in tests and local demos.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat completion timed out")]
    Timeout,

    #[error("provider error: {0}")]
    Provider(String),
}

/// Everything the parse stage needs from a model provider.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Returns a fixed, always-valid extraction response. Useful for local runs
/// without a configured provider and as a baseline in tests.
pub struct DemoChatCompletion {
    response: String,
}

impl DemoChatCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(r#"{"resources": []}"#)
    }
}

#[async_trait]
impl ChatCompletion for DemoChatCompletion {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
        Ok(self.response.clone())
    }
}

/// Replays a fixed sequence of canned responses, one per call, for
/// deterministic multi-turn tests. Errors once the script runs out.
pub struct ScriptedChatCompletion {
    script: Vec<String>,
    cursor: Mutex<usize>,
}

impl ScriptedChatCompletion {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChatCompletion {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
        let mut cursor = self.cursor.lock().expect("scripted chat mutex poisoned");
        let response = self
            .script
            .get(*cursor)
            .cloned()
            .ok_or_else(|| ChatError::Provider("scripted response script exhausted".to_string()))?;
        *cursor += 1;
        Ok(response)
    }
}
