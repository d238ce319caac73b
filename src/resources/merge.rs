// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-turn resource merging: type normalization, identity matching, and
//! the tag-union rule that keeps a conversation's resource list coherent
//! across multiple extraction passes.

use serde_json::Value;

use crate::models::resource::RESERVED_METADATA_KEYS;
use crate::models::CanonicalResource;

use super::alias::normalize_type;
use super::defaults::apply_safe_defaults;

/// Copies reserved metadata keys (`Environment`, `Project`, `Owner`,
/// `CostCenter`) present as top-level properties into `Tags`, deduplicating
/// case-insensitively. A key already present in `Tags` under any casing is
/// left untouched.
pub fn mirror_metadata_into_tags(resource: &mut CanonicalResource) {
    for key in RESERVED_METADATA_KEYS {
        let top_level_value = resource
            .properties
            .iter()
            .find(|(k, _)| k.as_str() != "Tags" && k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone());

        let already_tagged = resource
            .tags()
            .keys()
            .any(|k| k.eq_ignore_ascii_case(key));

        if !already_tagged {
            if let Some(value) = top_level_value {
                resource.tags_mut().insert(key.to_string(), value);
            }
        }
    }
}

/// Union-merges `new_tags` into `old_tags`: keys present in both take the
/// new value, keys only in `old_tags` are preserved.
fn merge_tags(old_tags: &serde_json::Map<String, Value>, new_tags: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    let mut merged = old_tags.clone();
    for (k, v) in new_tags {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Merges freshly extracted resources into the session's existing resource
/// list. Returns a list of warnings for types that didn't match the alias
/// table (kept as-is but surfaced, never dropped).
pub fn merge_into(existing: &mut Vec<CanonicalResource>, incoming: Vec<CanonicalResource>) -> Vec<String> {
    let mut warnings = Vec::new();

    for mut resource in incoming {
        let (normalized_type, known) = normalize_type(&resource.type_);
        resource.type_ = normalized_type;
        if !known {
            warnings.push(format!(
                "resource '{}' has unrecognized type '{}'; kept as-is",
                resource.name, resource.type_
            ));
        }
        mirror_metadata_into_tags(&mut resource);

        let key = resource.identity_key();
        if let Some(slot) = existing.iter_mut().find(|r| r.identity_key() == key) {
            let merged_tags = merge_tags(&slot.tags(), &resource.tags());
            for (k, v) in resource.properties.iter() {
                if k != "Tags" {
                    slot.properties.insert(k.clone(), v.clone());
                }
            }
            slot.platform = resource.platform;
            *slot.tags_mut() = merged_tags;
            apply_safe_defaults(slot);
        } else {
            apply_safe_defaults(&mut resource);
            existing.push(resource);
        }
    }

    warnings
}
