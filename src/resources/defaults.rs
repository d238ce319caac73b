// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Safe defaults injected at ingestion rather than left to templates, so a
//! resource is never insecure-by-default even before the policy engine has
//! a chance to weigh in. Applies identically regardless of which ingestion
//! route (spreadsheet or text/LLM) a resource arrived through.

use serde_json::Value;

use crate::models::CanonicalResource;

/// Fills in security-relevant properties a resource type should always
/// carry, without overwriting anything already set.
pub fn apply_safe_defaults(resource: &mut CanonicalResource) {
    match resource.type_.as_str() {
        "aws_s3_bucket" => {
            resource
                .properties
                .entry("block_public_access")
                .or_insert(Value::Bool(true));
        }
        "aws_rds" => {
            resource
                .properties
                .entry("encrypted")
                .or_insert(Value::Bool(true));
        }
        "azure_storage_account" => {
            resource
                .properties
                .entry("min_tls_version")
                .or_insert(Value::String("TLS1_2".to_string()));
            resource
                .properties
                .entry("https_only")
                .or_insert(Value::Bool(true));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;

    #[test]
    fn s3_bucket_gets_block_public_access() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_s3_bucket", "data");
        apply_safe_defaults(&mut r);
        assert_eq!(r.properties["block_public_access"], Value::Bool(true));
    }

    #[test]
    fn rds_gets_encrypted() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_rds", "db");
        apply_safe_defaults(&mut r);
        assert_eq!(r.properties["encrypted"], Value::Bool(true));
    }

    #[test]
    fn azure_storage_account_gets_tls_and_https_defaults() {
        let mut r = CanonicalResource::new(Platform::Azure, "azure_storage_account", "sa");
        apply_safe_defaults(&mut r);
        assert_eq!(r.properties["min_tls_version"], Value::String("TLS1_2".to_string()));
        assert_eq!(r.properties["https_only"], Value::Bool(true));
    }

    #[test]
    fn explicit_value_is_never_overwritten() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_s3_bucket", "data");
        r.properties.insert("block_public_access".into(), Value::Bool(false));
        apply_safe_defaults(&mut r);
        assert_eq!(r.properties["block_public_access"], Value::Bool(false));
    }

    #[test]
    fn other_types_are_left_untouched() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        apply_safe_defaults(&mut r);
        assert!(r.properties.is_empty());
    }
}
