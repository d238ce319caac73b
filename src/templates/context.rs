// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Builds the per-resource render context: flattened properties plus the
//! handful of derived fields (`safe_id`, `tags_hcl`, `is_windows`,
//! `__known_resource_groups`) templates rely on.

use serde_json::{Map, Value};

use crate::models::CanonicalResource;

/// Renders a `Tags` map into a ready-to-embed `tags = { ... }` HCL block,
/// or an empty string when there are no tags.
pub fn render_tags_block(tags: &Map<String, Value>) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(tags.len());
    for (k, v) in tags {
        lines.push(format!("    {k} = {}", super::render::to_hcl(v)));
    }
    format!("  tags = {{\n{}\n  }}\n", lines.join("\n"))
}

/// Builds the render context for one resource, given the full resource
/// list (needed for cross-resource references like `azure_rg_ref`).
pub fn build_context(resource: &CanonicalResource, all_resources: &[CanonicalResource]) -> Value {
    let mut ctx = Map::new();

    for (key, value) in &resource.properties {
        if key == "Tags" {
            continue;
        }
        ctx.insert(key.clone(), value.clone());
    }

    ctx.insert("name".to_string(), Value::String(resource.name.clone()));
    ctx.insert("platform".to_string(), Value::String(resource.platform.to_string()));
    ctx.insert("type".to_string(), Value::String(resource.type_.clone()));
    ctx.insert("safe_id".to_string(), Value::String(resource.safe_id()));
    ctx.insert(
        "tags_hcl".to_string(),
        Value::String(render_tags_block(&resource.tags())),
    );

    let is_windows = resource
        .property_str("os")
        .map(|os| os.eq_ignore_ascii_case("windows"))
        .unwrap_or(false);
    ctx.insert("is_windows".to_string(), Value::Bool(is_windows));

    let known_resource_groups: Vec<Value> = all_resources
        .iter()
        .filter(|r| r.type_ == "azure_resource_group")
        .map(|r| Value::String(r.name.clone()))
        .collect();
    ctx.insert(
        "__known_resource_groups".to_string(),
        Value::Array(known_resource_groups),
    );

    Value::Object(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use serde_json::json;

    #[test]
    fn tags_block_renders_empty_string_for_no_tags() {
        assert_eq!(render_tags_block(&Map::new()), "");
    }

    #[test]
    fn tags_block_renders_key_value_pairs() {
        let mut tags = Map::new();
        tags.insert("Project".into(), json!("X"));
        let block = render_tags_block(&tags);
        assert!(block.contains("tags = {"));
        assert!(block.contains("Project = \"X\""));
    }

    #[test]
    fn windows_os_flag_drives_is_windows() {
        let mut r = CanonicalResource::new(Platform::Azure, "azure_vm", "web");
        r.properties.insert("os".into(), json!("Windows"));
        let ctx = build_context(&r, &[r.clone()]);
        assert_eq!(ctx["is_windows"], json!(true));
    }

    #[test]
    fn known_resource_groups_collected_from_sibling_resources() {
        let rg = CanonicalResource::new(Platform::Azure, "azure_resource_group", "my-rg");
        let vm = CanonicalResource::new(Platform::Azure, "azure_vm", "web");
        let ctx = build_context(&vm, &[rg, vm.clone()]);
        assert_eq!(ctx["__known_resource_groups"], json!(["my-rg"]));
    }
}
