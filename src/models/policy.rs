// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Policy definitions: the natural-language rule plus its compiled evaluator form.

use serde::{Deserialize, Serialize};

use super::resource::Platform;
use super::workflow_state::Severity;

/// Which platform(s) a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPlatform {
    Aws,
    Azure,
    All,
}

impl PolicyPlatform {
    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PolicyPlatform::All => true,
            PolicyPlatform::Aws => platform == Platform::Aws,
            PolicyPlatform::Azure => platform == Platform::Azure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ingress,
    Egress,
}

/// The evaluator-ready form a policy's natural-language rule compiles to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompiledRule {
    BlockPorts {
        ports: Vec<u16>,
        directions: Vec<Direction>,
        /// CIDRs the rule restricts; empty means the rule's implicit
        /// default of `0.0.0.0/0` (wide open) rather than "no CIDRs".
        #[serde(default)]
        cidrs: Vec<String>,
    },
    RequiredTags {
        tags: Vec<String>,
    },
    AllowedRegions {
        regions: Vec<String>,
    },
    RequiredEncryption,
    /// The natural-language rule didn't match any known pattern. Carried
    /// through rather than dropped so the evaluator can flag it explicitly
    /// instead of silently never firing.
    Unsupported {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub natural_language_rule: String,
    pub cloud_platform: PolicyPlatform,
    pub severity: Severity,
    pub enabled: bool,
    pub compiled_logic: Option<CompiledRule>,
}

impl Policy {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        natural_language_rule: impl Into<String>,
        cloud_platform: PolicyPlatform,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            natural_language_rule: natural_language_rule.into(),
            cloud_platform,
            severity,
            enabled: true,
            compiled_logic: None,
        }
    }
}
