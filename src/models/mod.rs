// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Data models shared across every stage and the public API surface.

pub mod deployment;
pub mod policy;
pub mod progress;
pub mod resource;
pub mod workflow_state;

pub use deployment::{Deployment, DeploymentStatus, Environment, PlanSummary};
pub use policy::{CompiledRule, Direction, Policy, PolicyPlatform};
pub use progress::{ProgressEvent, StageStatus};
pub use resource::{CanonicalResource, Platform, PropertyMap};
pub use workflow_state::{
    ErrorRecord, InputType, Message, MissingFields, Role, Severity, StageLabel, ViolationRecord,
    WorkflowState,
};
