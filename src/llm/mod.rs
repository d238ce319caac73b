// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chat-completion boundary consumed by the parse stage.

pub mod chat;

pub use chat::{ChatCompletion, ChatError, ChatMessage, ChatRole, DemoChatCompletion, ScriptedChatCompletion};
