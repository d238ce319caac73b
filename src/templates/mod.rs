// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Template-driven Terraform code synthesis.

pub mod assembly;
pub mod context;
pub mod registry;
pub mod render;

pub use assembly::synthesize;
pub use registry::TemplateRegistry;
pub use render::{to_hcl, TemplateError};
