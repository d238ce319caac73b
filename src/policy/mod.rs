// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Policy compilation and evaluation.

pub mod compiler;
pub mod evaluator;
pub mod store;

pub use compiler::{PatternTableCompiler, RuleCompiler};
pub use evaluator::{evaluate, EvaluationOutcome};
pub use store::PolicyStore;
