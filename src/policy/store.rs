// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compiles and caches a policy's natural-language rule the first time it's
//! needed, so `comply`/`review` never see a `compiled_logic: None` that
//! silently no-ops in the evaluator.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::Policy;

use super::compiler::RuleCompiler;

/// Resolves policies to a form the evaluator can act on, compiling
/// `natural_language_rule` on first use and caching the result by policy id.
pub struct PolicyStore {
    compiler: Arc<dyn RuleCompiler>,
    cache: RwLock<HashMap<String, crate::models::CompiledRule>>,
}

impl PolicyStore {
    pub fn new(compiler: Arc<dyn RuleCompiler>) -> Self {
        Self {
            compiler,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `policies` with `compiled_logic` filled in for any policy
    /// that arrived without it. A policy that already carries
    /// `compiled_logic` is returned unchanged — this never recompiles or
    /// overrides an explicitly set rule.
    pub async fn resolve(&self, policies: &[Policy]) -> Vec<Policy> {
        let mut resolved = Vec::with_capacity(policies.len());
        for policy in policies {
            if policy.compiled_logic.is_some() {
                resolved.push(policy.clone());
                continue;
            }

            if let Some(cached) = self.cache.read().await.get(&policy.id) {
                let mut p = policy.clone();
                p.compiled_logic = Some(cached.clone());
                resolved.push(p);
                continue;
            }

            let compiled = self.compiler.compile(&policy.natural_language_rule);
            self.cache.write().await.insert(policy.id.clone(), compiled.clone());
            let mut p = policy.clone();
            p.compiled_logic = Some(compiled);
            resolved.push(p);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompiledRule, PolicyPlatform, Severity};
    use crate::policy::PatternTableCompiler;

    #[tokio::test]
    async fn compiles_and_fills_in_missing_compiled_logic() {
        let store = PolicyStore::new(Arc::new(PatternTableCompiler));
        let policy = Policy::new("p1", "no ssh", "block port 22 from 0.0.0.0/0", PolicyPlatform::Aws, Severity::Error);
        assert!(policy.compiled_logic.is_none());

        let resolved = store.resolve(&[policy]).await;
        assert_eq!(resolved.len(), 1);
        assert!(matches!(resolved[0].compiled_logic, Some(CompiledRule::BlockPorts { .. })));
    }

    #[tokio::test]
    async fn leaves_already_compiled_policies_untouched() {
        let store = PolicyStore::new(Arc::new(PatternTableCompiler));
        let mut policy = Policy::new("p1", "custom", "n/a", PolicyPlatform::All, Severity::Error);
        policy.compiled_logic = Some(CompiledRule::RequiredEncryption);

        let resolved = store.resolve(&[policy]).await;
        assert!(matches!(resolved[0].compiled_logic, Some(CompiledRule::RequiredEncryption)));
    }

    #[tokio::test]
    async fn caches_compiled_rule_by_policy_id() {
        let store = PolicyStore::new(Arc::new(PatternTableCompiler));
        let policy = Policy::new("p1", "tags", "require tags \"Project\"", PolicyPlatform::All, Severity::Error);

        let _ = store.resolve(&[policy.clone()]).await;
        assert!(store.cache.read().await.contains_key("p1"));

        let resolved = store.resolve(&[policy]).await;
        assert!(matches!(resolved[0].compiled_logic, Some(CompiledRule::RequiredTags { .. })));
    }
}
