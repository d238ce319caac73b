// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terraform-safe identifier derivation and cross-turn identity matching.

/// Derives the Terraform-safe identifier for a logical resource name:
/// lowercase, `[a-z0-9_]` only, must start with a letter, `res_` prefix
/// injected if it would otherwise start with a digit or be empty.
pub fn safe_id(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    out = collapse_underscores(&out);
    out = out.trim_matches('_').to_string();

    if out.is_empty() {
        out = "resource".to_string();
    }

    if !out.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        out = format!("res_{out}");
    }

    out
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !last_was_underscore {
                out.push(c);
            }
            last_was_underscore = true;
        } else {
            out.push(c);
            last_was_underscore = false;
        }
    }
    out
}

/// Two resources are the same identity if their normalized type is equal
/// and their names are equal case-insensitively.
pub fn identity_key(normalized_type: &str, name: &str) -> (String, String) {
    (normalized_type.to_string(), name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_spaces_and_case() {
        assert_eq!(safe_id("Web Server 1"), "web_server_1");
    }

    #[test]
    fn prefixes_names_starting_with_digit() {
        assert_eq!(safe_id("01-primary"), "res_01_primary");
    }

    #[test]
    fn collapses_repeated_separators() {
        assert_eq!(safe_id("db--primary__east"), "db_primary_east");
    }

    #[test]
    fn falls_back_to_resource_for_empty_input() {
        assert_eq!(safe_id("---"), "resource");
    }

    #[test]
    fn identity_key_is_case_insensitive_on_name_only() {
        assert_eq!(
            identity_key("aws_ec2", "Web"),
            identity_key("aws_ec2", "web")
        );
    }
}
