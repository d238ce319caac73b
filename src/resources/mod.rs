// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource type aliasing, identity matching, and cross-turn merging.

pub mod alias;
pub mod defaults;
pub mod identity;
pub mod merge;
pub mod required_fields;

pub use alias::normalize_type;
pub use defaults::apply_safe_defaults;
pub use identity::safe_id;
pub use merge::merge_into;
pub use required_fields::{missing_fields, required_fields_for};
