// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The per-type required-fields table that drives missing-field detection
//! in the collection stage.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

static REQUIRED_FIELDS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("aws_ec2", ["instance_type", "ami", "region"].as_slice()),
        ("aws_security_group", ["description", "region"].as_slice()),
        ("aws_s3_bucket", ["bucket_name", "region"].as_slice()),
        ("aws_rds", ["engine", "instance_class", "region"].as_slice()),
        ("aws_lb", ["lb_type", "region"].as_slice()),
        ("aws_vpc", ["cidr_block", "region"].as_slice()),
        ("aws_subnet", ["cidr_block", "availability_zone"].as_slice()),
        (
            "azure_vm",
            ["size", "location", "resource_group", "admin_username", "os"].as_slice(),
        ),
        (
            "azure_storage_account",
            ["location", "resource_group", "account_tier"].as_slice(),
        ),
        (
            "azure_vnet",
            ["location", "resource_group", "address_space"].as_slice(),
        ),
        ("azure_subnet", ["resource_group", "address_prefix"].as_slice()),
        ("azure_nsg", ["location", "resource_group"].as_slice()),
        ("azure_lb", ["location", "resource_group", "sku"].as_slice()),
        (
            "azure_sql_database",
            ["resource_group", "location", "server_name"].as_slice(),
        ),
    ])
});

/// Required fields for a normalized type, empty if the type isn't in the
/// table (types without a registered schema are never flagged incomplete).
pub fn required_fields_for(normalized_type: &str) -> &'static [&'static str] {
    REQUIRED_FIELDS.get(normalized_type).copied().unwrap_or(&[])
}

/// Returns the set of required fields missing or empty on this resource's
/// property map.
pub fn missing_fields(
    normalized_type: &str,
    properties: &serde_json::Map<String, serde_json::Value>,
) -> BTreeSet<String> {
    required_fields_for(normalized_type)
        .iter()
        .filter(|field| is_absent_or_empty(properties, field))
        .map(|field| field.to_string())
        .collect()
}

fn is_absent_or_empty(properties: &serde_json::Map<String, serde_json::Value>, field: &str) -> bool {
    match properties.get(field) {
        None => true,
        Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_missing_and_empty_fields() {
        let mut props = serde_json::Map::new();
        props.insert("instance_type".into(), json!("t3.micro"));
        props.insert("ami".into(), json!(""));
        let missing = missing_fields("aws_ec2", &props);
        assert!(missing.contains("ami"));
        assert!(missing.contains("region"));
        assert!(!missing.contains("instance_type"));
    }

    #[test]
    fn unknown_type_has_no_required_fields() {
        assert!(missing_fields("gcp_instance", &serde_json::Map::new()).is_empty());
    }

    #[test]
    fn tags_are_never_required() {
        assert!(!required_fields_for("aws_ec2").contains(&"Tags"));
    }
}
