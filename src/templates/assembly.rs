// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dispatches each canonical resource to its template, renders it, and
//! assembles the complete Terraform project file bundle.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PipelineError;
use crate::models::{CanonicalResource, Platform};

use super::context::build_context;
use super::registry::TemplateRegistry;
use super::render::render;

static VAR_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"var\.([a-zA-Z0-9_]+)").unwrap());

const MIN_MAIN_TF_BYTES: usize = 50;

fn terraform_address(resource: &CanonicalResource) -> &'static str {
    let is_windows = resource
        .property_str("os")
        .map(|os| os.eq_ignore_ascii_case("windows"))
        .unwrap_or(false);

    match (resource.platform, resource.type_.as_str()) {
        (Platform::Aws, "aws_ec2") => "aws_instance",
        (Platform::Aws, "aws_security_group") => "aws_security_group",
        (Platform::Aws, "aws_s3_bucket") => "aws_s3_bucket",
        (Platform::Aws, "aws_rds") => "aws_db_instance",
        (Platform::Aws, "aws_lb") => "aws_lb",
        (Platform::Aws, "aws_vpc") => "aws_vpc",
        (Platform::Aws, "aws_subnet") => "aws_subnet",
        (Platform::Aws, "aws_internet_gateway") => "aws_internet_gateway",
        (Platform::Aws, "aws_route_table") => "aws_route_table",
        (Platform::Azure, "azure_vm") if is_windows => "azurerm_windows_virtual_machine",
        (Platform::Azure, "azure_vm") => "azurerm_linux_virtual_machine",
        (Platform::Azure, "azure_storage_account") => "azurerm_storage_account",
        (Platform::Azure, "azure_vnet") => "azurerm_virtual_network",
        (Platform::Azure, "azure_subnet") => "azurerm_subnet",
        (Platform::Azure, "azure_nsg") => "azurerm_network_security_group",
        (Platform::Azure, "azure_lb") => "azurerm_lb",
        (Platform::Azure, "azure_sql_database") => "azurerm_mssql_database",
        (Platform::Azure, "azure_resource_group") => "azurerm_resource_group",
        (Platform::Azure, "azure_public_ip") => "azurerm_public_ip",
        _ => "unknown_resource",
    }
}

fn render_resource_block(resource: &CanonicalResource, all_resources: &[CanonicalResource]) -> Result<String, PipelineError> {
    let registry = TemplateRegistry;
    let template = registry.get(resource.platform, &resource.type_).ok_or_else(|| PipelineError::Template {
        platform: resource.platform.to_string(),
        type_: resource.type_.clone(),
        available: registry.available_keys(),
    })?;

    let context = build_context(resource, all_resources);
    render(template, &context).map_err(|e| {
        PipelineError::Template {
            platform: resource.platform.to_string(),
            type_: resource.type_.clone(),
            available: vec![format!("render error: {e}")],
        }
    })
}

fn assemble_provider_tf(resources: &[CanonicalResource]) -> String {
    let mut out = String::new();
    if resources.iter().any(|r| r.platform == Platform::Aws) {
        out.push_str("provider \"aws\" {}\n\n");
    }
    if resources.iter().any(|r| r.platform == Platform::Azure) {
        out.push_str("provider \"azurerm\" {\n  features {}\n}\n\n");
    }
    out
}

fn assemble_variables_tf(main_tf: &str) -> String {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for cap in VAR_REFERENCE.captures_iter(main_tf) {
        names.insert(cap[1].to_string());
    }

    let mut out = String::new();
    for name in names {
        let sensitive = name.contains("password") || name.contains("secret") || name.contains("key");
        out.push_str(&format!(
            "variable \"{name}\" {{\n  type      = string\n  sensitive = {sensitive}\n}}\n\n"
        ));
    }
    out
}

fn assemble_outputs_tf(resources: &[CanonicalResource]) -> String {
    let mut out = String::new();
    for resource in resources {
        let address = terraform_address(resource);
        out.push_str(&format!(
            "output \"{}_id\" {{\n  value = {}.{}.id\n}}\n\n",
            resource.safe_id(),
            address,
            resource.safe_id()
        ));
    }
    out
}

fn assemble_readme(resources: &[CanonicalResource]) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for resource in resources {
        *counts.entry(resource.type_.clone()).or_insert(0) += 1;
    }

    let mut out = String::from("# Generated Terraform Project\n\n## Resources\n\n");
    for (type_, count) in counts {
        out.push_str(&format!("- `{type_}`: {count}\n"));
    }
    out
}

/// Synthesizes the full Terraform project from the canonical resource
/// list. Returns `TemplateError` (EmptyOutput is folded into the same
/// error per §7) if any resource lacks a template or the assembled
/// `main.tf` is suspiciously short.
pub fn synthesize(resources: &[CanonicalResource]) -> Result<BTreeMap<String, String>, PipelineError> {
    let mut main_blocks = Vec::with_capacity(resources.len());
    for resource in resources {
        main_blocks.push(render_resource_block(resource, resources)?);
    }
    let main_tf = main_blocks.join("\n");

    if resources.is_empty() || main_tf.trim().len() < MIN_MAIN_TF_BYTES {
        return Err(PipelineError::EmptyOutput);
    }

    let mut files = BTreeMap::new();
    files.insert("provider.tf".to_string(), assemble_provider_tf(resources));
    files.insert("variables.tf".to_string(), assemble_variables_tf(&main_tf));
    files.insert("main.tf".to_string(), main_tf);
    files.insert("outputs.tf".to_string(), assemble_outputs_tf(resources));
    files.insert("README.md".to_string(), assemble_readme(resources));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ec2(name: &str) -> CanonicalResource {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_ec2", name);
        r.properties.insert("ami".into(), json!("ami-123"));
        r.properties.insert("instance_type".into(), json!("t3.micro"));
        r.properties.insert("region".into(), json!("us-east-1"));
        r
    }

    #[test]
    fn synthesizes_all_five_files() {
        let files = synthesize(&[ec2("web")]).unwrap();
        for name in ["provider.tf", "variables.tf", "main.tf", "outputs.tf", "README.md"] {
            assert!(files.contains_key(name), "missing {name}");
        }
        assert!(files["main.tf"].contains("ami-123"));
        assert!(files["provider.tf"].contains("provider \"aws\""));
        assert!(!files["provider.tf"].contains("azurerm"));
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let unknown = CanonicalResource::new(Platform::Aws, "aws_lambda", "fn");
        let err = synthesize(&[unknown]).unwrap_err();
        assert!(matches!(err, PipelineError::Template { .. }));
    }

    #[test]
    fn empty_resource_list_is_empty_output() {
        assert!(matches!(synthesize(&[]), Err(PipelineError::EmptyOutput)));
    }

    #[test]
    fn windows_vm_declares_admin_password_variable() {
        let mut vm = CanonicalResource::new(Platform::Azure, "azure_vm", "win-box");
        vm.properties.insert("size".into(), json!("Standard_B2s"));
        vm.properties.insert("location".into(), json!("eastus"));
        vm.properties.insert("resource_group".into(), json!("my-rg"));
        vm.properties.insert("admin_username".into(), json!("azureadmin"));
        vm.properties.insert("os".into(), json!("Windows"));
        let files = synthesize(&[vm]).unwrap();
        assert!(files["main.tf"].contains("azurerm_windows_virtual_machine"));
        assert!(files["variables.tf"].contains("admin_password"));
        assert!(files["variables.tf"].contains("sensitive = true"));
    }
}
