// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Type-alias normalization: collapses the many spellings a user or
//! spreadsheet might use for a resource type down to its canonical form.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static ALIAS_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ec2", "aws_ec2"),
        ("instance", "aws_ec2"),
        ("securitygroup", "aws_security_group"),
        ("sg", "aws_security_group"),
        ("s3", "aws_s3_bucket"),
        ("bucket", "aws_s3_bucket"),
        ("rds", "aws_rds"),
        ("database", "aws_rds"),
        ("lb", "aws_lb"),
        ("loadbalancer", "aws_lb"),
        ("vpc", "aws_vpc"),
        ("subnet", "aws_subnet"),
        ("igw", "aws_internet_gateway"),
        ("internetgateway", "aws_internet_gateway"),
        ("routetable", "aws_route_table"),
        ("vm", "azure_vm"),
        ("virtualmachine", "azure_vm"),
        ("storageaccount", "azure_storage_account"),
        ("storage", "azure_storage_account"),
        ("vnet", "azure_vnet"),
        ("virtualnetwork", "azure_vnet"),
        ("nsg", "azure_nsg"),
        ("networksecuritygroup", "azure_nsg"),
        ("sqldatabase", "azure_sql_database"),
        ("resourcegroup", "azure_resource_group"),
        ("publicip", "azure_public_ip"),
    ])
});

/// Normalizes a raw, user-supplied type string to its canonical
/// `<platform>_<kind>` form. Already-canonical forms and the platform
/// prefix itself pass through the alias table unchanged. Unknown types are
/// returned lowercased with non-alphanumerics stripped, flagged as unknown.
pub fn normalize_type(raw: &str) -> (String, bool) {
    let key: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    if let Some(canonical) = ALIAS_TABLE.get(key.as_str()) {
        return (canonical.to_string(), true);
    }

    let lowered = raw.to_lowercase();
    if lowered.starts_with("aws_") || lowered.starts_with("azure_") {
        return (lowered, true);
    }

    (lowered, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_known_aliases() {
        for (raw, expected) in [("EC2", "aws_ec2"), ("ec2", "aws_ec2"), ("aws_ec2", "aws_ec2")] {
            let (normalized, known) = normalize_type(raw);
            assert_eq!(normalized, expected);
            assert!(known);
        }
    }

    #[test]
    fn collapses_azure_vm_aliases() {
        for raw in ["VM", "vm", "VirtualMachine", "azure_vm"] {
            assert_eq!(normalize_type(raw).0, "azure_vm");
        }
    }

    #[test]
    fn unknown_type_is_flagged() {
        let (normalized, known) = normalize_type("gcp_instance");
        assert_eq!(normalized, "gcp_instance");
        assert!(!known);
    }
}
