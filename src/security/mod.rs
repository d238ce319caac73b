// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation and credential encryption.

pub mod crypto;
pub mod validation;

pub use crypto::{CredentialVault, CryptoError};
pub use validation::{ValidationError, Validator};
