// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Natural-language-to-rule compilation: a deterministic pattern table, not
//! an LLM call, for the rule kinds this crate ships support for.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CompiledRule, Direction};

static BLOCK_PORTS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bblock\b.*\bport[s]?\b").unwrap());
static REQUIRED_TAGS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\brequire[sd]?\b.*\btag[s]?\b").unwrap());
static ALLOWED_REGIONS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(allow(ed)?|restrict(ed)?)\b.*\bregion[s]?\b").unwrap());
static REQUIRED_ENCRYPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\brequire[sd]?\b.*\bencrypt").unwrap());

static PORT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,5})\b").unwrap());
static CIDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3}/\d{1,2})\b").unwrap());
static QUOTED_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([A-Za-z0-9_\-]+)["']"#).unwrap());
static BARE_WORD_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9_\-]*").unwrap());

/// Extension point for layering an LLM-backed compiler in front of the
/// pattern table without touching the evaluator.
pub trait RuleCompiler: Send + Sync {
    fn compile(&self, natural_language_rule: &str) -> CompiledRule;
}

/// The pattern-table compiler this crate ships: deterministic, synchronous,
/// no LLM non-determinism for the rule kinds that matter most.
pub struct PatternTableCompiler;

impl RuleCompiler for PatternTableCompiler {
    fn compile(&self, rule: &str) -> CompiledRule {
        if BLOCK_PORTS_PATTERN.is_match(rule) {
            return compile_block_ports(rule);
        }
        if REQUIRED_TAGS_PATTERN.is_match(rule) {
            return compile_required_tags(rule);
        }
        if ALLOWED_REGIONS_PATTERN.is_match(rule) {
            return compile_allowed_regions(rule);
        }
        if REQUIRED_ENCRYPTION_PATTERN.is_match(rule) {
            return CompiledRule::RequiredEncryption;
        }
        CompiledRule::Unsupported {
            reason: format!("no pattern matched natural-language rule: {rule}"),
        }
    }
}

fn compile_block_ports(rule: &str) -> CompiledRule {
    let cidrs: Vec<String> = CIDR.find_iter(rule).map(|m| m.as_str().to_string()).collect();
    // Strip CIDR octets before scanning for port numbers, or "0.0.0.0/0"
    // would otherwise be misread as five spurious ports.
    let without_cidrs = CIDR.replace_all(rule, " ");

    let ports: Vec<u16> = PORT_NUMBER
        .captures_iter(&without_cidrs)
        .filter_map(|c| c.get(1)?.as_str().parse::<u16>().ok())
        .collect();

    let mut directions = Vec::new();
    if rule.to_lowercase().contains("egress") || rule.to_lowercase().contains("outbound") {
        directions.push(Direction::Egress);
    }
    if rule.to_lowercase().contains("ingress")
        || rule.to_lowercase().contains("inbound")
        || directions.is_empty()
    {
        directions.push(Direction::Ingress);
    }

    if ports.is_empty() {
        return CompiledRule::Unsupported {
            reason: format!("'block ports' rule had no extractable port numbers: {rule}"),
        };
    }

    CompiledRule::BlockPorts { ports, directions, cidrs }
}

fn compile_required_tags(rule: &str) -> CompiledRule {
    let tags = extract_word_list(rule);
    if tags.is_empty() {
        return CompiledRule::Unsupported {
            reason: format!("'required tags' rule had no extractable tag names: {rule}"),
        };
    }
    CompiledRule::RequiredTags { tags }
}

fn compile_allowed_regions(rule: &str) -> CompiledRule {
    let regions = extract_word_list(rule);
    if regions.is_empty() {
        return CompiledRule::Unsupported {
            reason: format!("'allowed regions' rule had no extractable region names: {rule}"),
        };
    }
    CompiledRule::AllowedRegions { regions }
}

/// Prefers quoted words; falls back to bare capitalized-looking tokens
/// trailing the keyword, skipping common stop words.
fn extract_word_list(rule: &str) -> Vec<String> {
    let quoted: Vec<String> = QUOTED_WORD
        .captures_iter(rule)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }

    const STOP_WORDS: &[&str] = &[
        "require", "requires", "required", "tag", "tags", "allow", "allowed", "restrict",
        "restricted", "region", "regions", "must", "have", "be", "in", "on", "of", "the", "a",
        "an", "and", "or",
    ];

    BARE_WORD_LIST
        .find_iter(rule)
        .map(|m| m.as_str())
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(|w| w.to_string())
        .collect()
}
