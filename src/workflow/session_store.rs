// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The in-process session persistence seam. A production deployment swaps
//! in a relational-store implementation without touching engine logic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::WorkflowState;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Option<WorkflowState>;
    async fn save(&self, session_id: &str, state: &WorkflowState);
}

/// One `RwLock<HashMap<..>>` keyed by session id, matching the per-session
/// locking model in the concurrency design: two concurrent `run` calls on
/// the same session serialize on the session's own lock, not a global one.
#[derive(Default)]
pub struct InMemorySessionStore {
    states: RwLock<HashMap<String, WorkflowState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Option<WorkflowState> {
        self.states.read().await.get(session_id).cloned()
    }

    async fn save(&self, session_id: &str, state: &WorkflowState) {
        self.states.write().await.insert(session_id.to_string(), state.clone());
    }
}

/// One lock per session id, acquired for the duration of a `run` call so
/// concurrent runs against the same session serialize without blocking
/// unrelated sessions.
#[derive(Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_for(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(session_id) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
