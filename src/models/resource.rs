// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The canonical resource representation every stage operates on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved metadata keys mirrored into `Tags` at ingestion time.
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["Environment", "Project", "Owner", "CostCenter"];

/// Cloud platform a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Aws,
    Azure,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Aws => "aws",
            Platform::Azure => "azure",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Platform::Aws),
            "azure" => Ok(Platform::Azure),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// A mapping of string property names to arbitrary JSON values.
pub type PropertyMap = Map<String, Value>;

/// The single resource representation all stages operate on.
///
/// `type` is always the normalized `<platform>_<kind>` form; aliasing happens
/// before a resource is ever constructed here (see [`crate::resources::alias`]).
/// `properties` always carries a `Tags` sub-object, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResource {
    pub platform: Platform,
    #[serde(rename = "type")]
    pub type_: String,
    pub name: String,
    pub properties: PropertyMap,
}

impl CanonicalResource {
    pub fn new(platform: Platform, type_: impl Into<String>, name: impl Into<String>) -> Self {
        let mut properties = Map::new();
        properties.insert("Tags".to_string(), Value::Object(Map::new()));
        Self {
            platform,
            type_: type_.into(),
            name: name.into(),
            properties,
        }
    }

    /// Returns the `Tags` sub-mapping, inserting an empty one if absent.
    pub fn tags(&self) -> Map<String, Value> {
        match self.properties.get("Tags") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    pub fn tags_mut(&mut self) -> &mut Map<String, Value> {
        if !matches!(self.properties.get("Tags"), Some(Value::Object(_))) {
            self.properties
                .insert("Tags".to_string(), Value::Object(Map::new()));
        }
        match self.properties.get_mut("Tags") {
            Some(Value::Object(map)) => map,
            _ => unreachable!("Tags was just normalized to an object"),
        }
    }

    /// Returns a property as a string, if present and string-typed.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// The identity key used for cross-turn resource matching: normalized
    /// type plus case-insensitive name.
    pub fn identity_key(&self) -> (String, String) {
        (self.type_.clone(), self.name.to_lowercase())
    }

    /// The sanitized Terraform-safe identifier for this resource (derived on
    /// read — never stored twice).
    pub fn safe_id(&self) -> String {
        crate::resources::identity::safe_id(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_resource_always_has_tags() {
        let r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        assert_eq!(r.tags(), Map::new());
    }

    #[test]
    fn tags_mut_normalizes_non_object_tags() {
        let mut r = CanonicalResource::new(Platform::Aws, "aws_ec2", "web");
        r.properties.insert("Tags".to_string(), Value::String("oops".into()));
        r.tags_mut().insert("Project".to_string(), Value::String("x".into()));
        assert_eq!(r.tags()["Project"], Value::String("x".into()));
    }

    #[test]
    fn identity_key_lowercases_name_only() {
        let r = CanonicalResource::new(Platform::Aws, "aws_ec2", "Web");
        assert_eq!(r.identity_key(), ("aws_ec2".to_string(), "web".to_string()));
    }
}
