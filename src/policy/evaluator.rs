// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Policy evaluation: applies compiled rules to the canonical resource list.

use serde_json::Value;

use crate::models::{CanonicalResource, CompiledRule, Direction, Policy, Severity, ViolationRecord};

const ENCRYPTION_REQUIRED_TYPES: [&str; 4] = [
    "aws_s3_bucket",
    "aws_rds",
    "azure_storage_account",
    "azure_sql_database",
];

/// Result of evaluating every enabled policy against every resource.
pub struct EvaluationOutcome {
    pub violations: Vec<ViolationRecord>,
    pub compliance_passed: bool,
}

/// Evaluates all enabled policies whose platform matches a resource against
/// that resource, collecting violations. `error` severity blocks
/// `compliance_passed`; `warning` is reported but does not.
pub fn evaluate(policies: &[Policy], resources: &[CanonicalResource]) -> EvaluationOutcome {
    let mut violations = Vec::new();

    for policy in policies.iter().filter(|p| p.enabled) {
        for resource in resources {
            if !policy.cloud_platform.matches(resource.platform) {
                continue;
            }
            match &policy.compiled_logic {
                Some(CompiledRule::Unsupported { reason }) => {
                    violations.push(ViolationRecord {
                        policy_id: policy.id.clone(),
                        policy_name: policy.name.clone(),
                        resource_name: resource.name.clone(),
                        detail: format!("policy rule could not be compiled and was skipped: {reason}"),
                        severity: Severity::Warning,
                    });
                }
                Some(rule) => {
                    if let Some(detail) = check_rule(rule, resource) {
                        violations.push(ViolationRecord {
                            policy_id: policy.id.clone(),
                            policy_name: policy.name.clone(),
                            resource_name: resource.name.clone(),
                            detail,
                            severity: policy.severity,
                        });
                    }
                }
                None => {}
            }
        }
    }

    let compliance_passed = !violations
        .iter()
        .any(|v| matches!(v.severity, Severity::Error));

    EvaluationOutcome {
        violations,
        compliance_passed,
    }
}

fn check_rule(rule: &CompiledRule, resource: &CanonicalResource) -> Option<String> {
    match rule {
        CompiledRule::BlockPorts { ports, directions, cidrs } => check_block_ports(ports, directions, cidrs, resource),
        CompiledRule::RequiredTags { tags } => check_required_tags(tags, resource),
        CompiledRule::AllowedRegions { regions } => check_allowed_regions(regions, resource),
        CompiledRule::RequiredEncryption => check_required_encryption(resource),
        CompiledRule::Unsupported { .. } => None,
    }
}

/// `policy_cidrs` are the CIDRs the policy restricts; an empty list is the
/// rule's implicit default of `0.0.0.0/0` per the spec, not "no CIDRs".
fn check_block_ports(ports: &[u16], directions: &[Direction], policy_cidrs: &[String], resource: &CanonicalResource) -> Option<String> {
    let default_cidrs = ["0.0.0.0/0".to_string()];
    let policy_cidrs: &[String] = if policy_cidrs.is_empty() { &default_cidrs } else { policy_cidrs };

    let mut opened = Vec::new();
    for direction in directions {
        let key = match direction {
            Direction::Ingress => "ingress_rules",
            Direction::Egress => "egress_rules",
        };
        let Some(Value::Array(rules)) = resource.properties.get(key) else {
            continue;
        };
        for rule in rules {
            let from_port = rule.get("from_port").and_then(Value::as_u64).unwrap_or(0) as u16;
            let to_port = rule.get("to_port").and_then(Value::as_u64).unwrap_or(u16::MAX as u64) as u16;
            let rule_cidrs: Vec<String> = rule
                .get("cidr_blocks")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_else(|| vec!["0.0.0.0/0".to_string()]);

            for port in ports {
                if *port >= from_port && *port <= to_port {
                    for cidr in rule_cidrs.iter().filter(|c| policy_cidrs.contains(c)) {
                        opened.push(format!("{direction:?} port {port} from {cidr}"));
                    }
                }
            }
        }
    }

    if opened.is_empty() {
        None
    } else {
        Some(format!("blocked port(s) opened: {}", opened.join(", ")))
    }
}

fn check_required_tags(required: &[String], resource: &CanonicalResource) -> Option<String> {
    let tags = resource.tags();
    let missing: Vec<&String> = required
        .iter()
        .filter(|tag| !tags.keys().any(|k| k.eq_ignore_ascii_case(tag)))
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "missing required tag(s): {}",
            missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ))
    }
}

fn check_allowed_regions(allowed: &[String], resource: &CanonicalResource) -> Option<String> {
    let actual = resource
        .property_str("region")
        .or_else(|| resource.property_str("location"));

    match actual {
        None => Some("resource has no region/location property to validate".to_string()),
        Some(region) if allowed.iter().any(|a| a.eq_ignore_ascii_case(region)) => None,
        Some(region) => Some(format!("region '{region}' is not in the allowed list: {allowed:?}")),
    }
}

fn check_required_encryption(resource: &CanonicalResource) -> Option<String> {
    if !ENCRYPTION_REQUIRED_TYPES.contains(&resource.type_.as_str()) {
        return None;
    }
    let encrypted = resource
        .properties
        .get("encrypted")
        .map(is_truthy)
        .unwrap_or(false);

    if encrypted {
        None
    } else {
        Some("resource requires encryption at rest but has no truthy 'encrypted' property".to_string())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, PolicyPlatform};
    use serde_json::json;

    fn policy(rule: CompiledRule, severity: Severity) -> Policy {
        let mut p = Policy::new("p1", "test policy", "n/a", PolicyPlatform::All, severity);
        p.compiled_logic = Some(rule);
        p
    }

    #[test]
    fn blocks_port_22_ingress_from_any_cidr() {
        let mut sg = CanonicalResource::new(Platform::Aws, "aws_security_group", "web-sg");
        sg.properties.insert(
            "ingress_rules".into(),
            json!([{"from_port": 22, "to_port": 22, "cidr_blocks": ["0.0.0.0/0"]}]),
        );
        let policies = vec![policy(
            CompiledRule::BlockPorts {
                ports: vec![22],
                directions: vec![Direction::Ingress],
                cidrs: vec![],
            },
            Severity::Error,
        )];
        let outcome = evaluate(&policies, &[sg]);
        assert!(!outcome.compliance_passed);
        assert_eq!(outcome.violations.len(), 1);
    }

    #[test]
    fn block_ports_ignores_rules_outside_the_policys_cidr_list() {
        let mut sg = CanonicalResource::new(Platform::Aws, "aws_security_group", "web-sg");
        sg.properties.insert(
            "ingress_rules".into(),
            json!([{"from_port": 22, "to_port": 22, "cidr_blocks": ["10.0.0.0/8"]}]),
        );
        let policies = vec![policy(
            CompiledRule::BlockPorts {
                ports: vec![22],
                directions: vec![Direction::Ingress],
                cidrs: vec!["0.0.0.0/0".to_string()],
            },
            Severity::Error,
        )];
        let outcome = evaluate(&policies, &[sg]);
        assert!(outcome.compliance_passed);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn required_tags_is_case_insensitive() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        r.tags_mut().insert("project".into(), json!("abc"));
        let policies = vec![policy(
            CompiledRule::RequiredTags {
                tags: vec!["Project".to_string()],
            },
            Severity::Error,
        )];
        let outcome = evaluate(&policies, &[r]);
        assert!(outcome.compliance_passed);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn unsupported_rule_warns_but_never_blocks() {
        let r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        let policies = vec![policy(
            CompiledRule::Unsupported {
                reason: "no match".into(),
            },
            Severity::Error,
        )];
        let outcome = evaluate(&policies, &[r]);
        assert!(outcome.compliance_passed);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity, Severity::Warning);
    }

    #[test]
    fn warning_severity_never_blocks_compliance() {
        let r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        let policies = vec![policy(
            CompiledRule::RequiredTags {
                tags: vec!["Owner".to_string()],
            },
            Severity::Warning,
        )];
        let outcome = evaluate(&policies, &[r]);
        assert!(outcome.compliance_passed);
        assert_eq!(outcome.violations.len(), 1);
    }

    #[test]
    fn required_encryption_only_applies_to_listed_types() {
        let r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        let policies = vec![policy(CompiledRule::RequiredEncryption, Severity::Error)];
        let outcome = evaluate(&policies, &[r]);
        assert!(outcome.compliance_passed);
    }
}
