// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for identifiers that cross the public API boundary.
//!
//! Mirrors the fluent `Validator` shape used throughout this codebase: each
//! check returns `Self` so callers chain `validate_session_id(...)?`-style
//! calls without intermediate bindings.

use thiserror::Error;

const MAX_SESSION_ID_LEN: usize = 128;
const MAX_RESOURCE_NAME_LEN: usize = 256;
const MAX_POLICY_ID_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains disallowed characters: {value}")]
    InvalidCharacters { field: &'static str, value: String },
}

pub struct Validator;

impl Validator {
    pub fn session_id(value: &str) -> Result<(), ValidationError> {
        Self::non_empty("session_id", value)?;
        Self::max_len("session_id", value, MAX_SESSION_ID_LEN)?;
        Ok(())
    }

    pub fn resource_name(value: &str) -> Result<(), ValidationError> {
        Self::non_empty("resource_name", value)?;
        Self::max_len("resource_name", value, MAX_RESOURCE_NAME_LEN)
    }

    pub fn policy_id(value: &str) -> Result<(), ValidationError> {
        Self::non_empty("policy_id", value)?;
        Self::max_len("policy_id", value, MAX_POLICY_ID_LEN)?;
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ValidationError::InvalidCharacters {
                field: "policy_id",
                value: value.to_string(),
            });
        }
        Ok(())
    }

    fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field });
        }
        Ok(())
    }

    fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
        if value.chars().count() > max {
            return Err(ValidationError::TooLong { field, max });
        }
        Ok(())
    }
}
