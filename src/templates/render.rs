// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! A small mustache-plus-filters template interpreter.
//!
//! No templating crate in this codebase's dependency stack supports the
//! domain-specific filters (`safe_id`, `azure_rg_ref`, `fromjson`) this
//! system needs, so this is a deliberately small hand-rolled interpreter
//! rather than an added dependency: conditionals, loops, dotted-path
//! lookup with scope fallback (so a filter inside an `#each` can still see
//! root-level bindings), and three filters.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unclosed block tag: {0}")]
    UnclosedBlock(String),

    #[error("unexpected closing tag '{0}' with no matching opener")]
    UnmatchedClose(String),

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("fromjson filter applied to a non-string, non-object value")]
    InvalidFromJson,

    #[error("embedded JSON failed to parse: {0}")]
    MalformedJson(String),
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var { path: String, filter: Option<String> },
    If { path: String, negate: bool, body: Vec<Node> },
    Each { path: String, body: Vec<Node> },
}

#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Tag(String),
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            tokens.push(Token::Text(rest[start..].to_string()));
            return tokens;
        };
        tokens.push(Token::Tag(after_open[..end].trim().to_string()));
        rest = &after_open[end + 2..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    tokens
}

fn parse_block(tokens: &[Token], idx: &mut usize, stop_tag: Option<&str>) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();
    while *idx < tokens.len() {
        match &tokens[*idx] {
            Token::Text(t) => {
                nodes.push(Node::Text(t.clone()));
                *idx += 1;
            }
            Token::Tag(tag) => {
                if let Some(stop) = stop_tag {
                    if tag == stop {
                        *idx += 1;
                        return Ok(nodes);
                    }
                }
                if let Some(path) = tag.strip_prefix("#if ") {
                    *idx += 1;
                    let body = parse_block(tokens, idx, Some("/if"))?;
                    nodes.push(Node::If {
                        path: path.trim().to_string(),
                        negate: false,
                        body,
                    });
                } else if let Some(path) = tag.strip_prefix("#unless ") {
                    *idx += 1;
                    let body = parse_block(tokens, idx, Some("/unless"))?;
                    nodes.push(Node::If {
                        path: path.trim().to_string(),
                        negate: true,
                        body,
                    });
                } else if let Some(path) = tag.strip_prefix("#each ") {
                    *idx += 1;
                    let body = parse_block(tokens, idx, Some("/each"))?;
                    nodes.push(Node::Each {
                        path: path.trim().to_string(),
                        body,
                    });
                } else if tag.starts_with('/') {
                    return Err(TemplateError::UnmatchedClose(tag.clone()));
                } else {
                    *idx += 1;
                    let mut parts = tag.splitn(2, '|');
                    let path = parts.next().unwrap_or_default().trim().to_string();
                    let filter = parts.next().map(|f| f.trim().to_string());
                    nodes.push(Node::Var { path, filter });
                }
            }
        }
    }
    if let Some(stop) = stop_tag {
        return Err(TemplateError::UnclosedBlock(stop.to_string()));
    }
    Ok(nodes)
}

fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = tokenize(source);
    let mut idx = 0;
    parse_block(&tokens, &mut idx, None)
}

fn lookup<'a>(path: &str, scopes: &[&'a Value]) -> Option<&'a Value> {
    if path == "this" {
        return scopes.last().copied();
    }
    for scope in scopes.iter().rev() {
        if let Some(found) = lookup_path(scope, path) {
            return Some(found);
        }
    }
    None
}

fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Renders a JSON value as an HCL literal: objects become `{ k = v }`
/// blocks, arrays become `[...]`, strings are quoted.
pub fn to_hcl(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(to_hcl).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let mut lines = Vec::new();
            for (k, v) in map {
                lines.push(format!("    {k} = {}", to_hcl(v)));
            }
            format!("{{\n{}\n  }}", lines.join("\n"))
        }
    }
}

fn apply_filter(filter: Option<&str>, value: &Value, scopes: &[&Value]) -> Result<String, TemplateError> {
    match filter {
        None => Ok(stringify(value)),
        Some("safe_id") => Ok(crate::resources::identity::safe_id(&stringify(value))),
        Some("fromjson") => {
            let parsed = match value {
                Value::String(s) => {
                    serde_json::from_str::<Value>(s).map_err(|e| TemplateError::MalformedJson(e.to_string()))?
                }
                Value::Object(_) | Value::Array(_) => value.clone(),
                _ => return Err(TemplateError::InvalidFromJson),
            };
            Ok(to_hcl(&parsed))
        }
        Some("azure_rg_ref") => Ok(azure_rg_ref(value, scopes)),
        Some(other) => Err(TemplateError::UnknownFilter(other.to_string())),
    }
}

/// Dispatches a resource-group reference: if the value names a resource
/// group also being created in this project, emit a live Terraform
/// reference; otherwise emit the literal name as a quoted string.
fn azure_rg_ref(value: &Value, scopes: &[&Value]) -> String {
    let name = stringify(value);
    let known = lookup("__known_resource_groups", scopes)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).any(|rg| rg.eq_ignore_ascii_case(&name)))
        .unwrap_or(false);

    if known {
        format!("azurerm_resource_group.{}.name", crate::resources::identity::safe_id(&name))
    } else {
        format!("\"{name}\"")
    }
}

fn render_with_scopes(nodes: &[Node], scopes: &[&Value]) -> Result<String, TemplateError> {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Var { path, filter } => {
                let value = lookup(path, scopes).cloned().unwrap_or(Value::Null);
                out.push_str(&apply_filter(filter.as_deref(), &value, scopes)?);
            }
            Node::If { path, negate, body } => {
                let value = lookup(path, scopes).cloned().unwrap_or(Value::Null);
                if is_truthy(&value) != *negate {
                    out.push_str(&render_with_scopes(body, scopes)?);
                }
            }
            Node::Each { path, body } => {
                let value = lookup(path, scopes).cloned().unwrap_or(Value::Null);
                if let Value::Array(items) = value {
                    for item in &items {
                        let mut inner = scopes.to_vec();
                        inner.push(item);
                        out.push_str(&render_with_scopes(body, &inner)?);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Renders `source` against `context`, a JSON object of bound variables.
pub fn render(source: &str, context: &Value) -> Result<String, TemplateError> {
    let nodes = parse(source)?;
    render_with_scopes(&nodes, &[context])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_plain_substitution() {
        let out = render("hello {{name}}", &json!({"name": "world"})).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn renders_if_block() {
        let out = render("{{#if flag}}yes{{/if}}{{#unless flag}}no{{/unless}}", &json!({"flag": true})).unwrap();
        assert_eq!(out, "yes");
    }

    #[test]
    fn renders_each_block_with_nested_fields() {
        let out = render(
            "{{#each items}}[{{this.name}}]{{/each}}",
            &json!({"items": [{"name": "a"}, {"name": "b"}]}),
        )
        .unwrap();
        assert_eq!(out, "[a][b]");
    }

    #[test]
    fn each_scope_can_still_see_root_bindings() {
        let out = render(
            "{{#each items}}{{root_value}}-{{this}}{{/each}}",
            &json!({"root_value": "R", "items": ["x", "y"]}),
        )
        .unwrap();
        assert_eq!(out, "R-xR-y");
    }

    #[test]
    fn safe_id_filter_sanitizes() {
        let out = render("{{name|safe_id}}", &json!({"name": "Web Server 1"})).unwrap();
        assert_eq!(out, "web_server_1");
    }

    #[test]
    fn fromjson_filter_renders_hcl_object() {
        let out = render("{{cfg|fromjson}}", &json!({"cfg": "{\"a\":1,\"b\":\"x\"}"})).unwrap();
        assert!(out.contains("a = 1"));
        assert!(out.contains("b = \"x\""));
    }

    #[test]
    fn azure_rg_ref_resolves_known_group_else_literal() {
        let ctx = json!({"__known_resource_groups": ["my-rg"], "rg": "my-rg", "other_rg": "external-rg"});
        assert_eq!(
            render("{{rg|azure_rg_ref}}", &ctx).unwrap(),
            "azurerm_resource_group.my_rg.name"
        );
        assert_eq!(render("{{other_rg|azure_rg_ref}}", &ctx).unwrap(), "\"external-rg\"");
    }

    #[test]
    fn unknown_filter_is_an_error() {
        assert!(render("{{x|nope}}", &json!({"x": 1})).is_err());
    }

    #[test]
    fn unmatched_close_tag_is_an_error() {
        assert!(parse("{{/if}}").is_err());
    }
}
