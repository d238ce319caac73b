// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The Terraform deployment executor and subprocess plumbing.

pub mod executor;
pub mod process;

pub use executor::{DeployTimeouts, DeploymentExecutor};
pub use process::ProcessError;
