// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spreadsheet-row ingestion into canonical resources.
//!
//! The actual `.xlsx`/`.xls` file upload and parsing sit behind the HTTP
//! surface this crate doesn't own; what this module owns is turning an
//! already-tabular row set into `CanonicalResource`s with the same
//! normalization and metadata-mirroring rules the parse/collect stages
//! apply. `from_csv_str` is a convenience entry point for tests and local
//! demos, grounded on the one tabular-ingestion format present anywhere in
//! this codebase's dependency stack.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::models::{CanonicalResource, Platform};
use crate::resources::alias::normalize_type;
use crate::resources::apply_safe_defaults;
use crate::resources::merge::mirror_metadata_into_tags;

/// One row of tabular input: column name → raw value.
pub type SpreadsheetRow = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("row {0} is missing a required 'platform' column")]
    MissingPlatform(usize),

    #[error("row {0} is missing a required 'type' column")]
    MissingType(usize),

    #[error("row {0} is missing a required 'name' column")]
    MissingName(usize),

    #[error("row {0} has an unrecognized platform: {1}")]
    UnknownPlatform(usize, String),

    #[error("failed to read CSV input: {0}")]
    Csv(String),
}

const STRUCTURAL_COLUMNS: [&str; 3] = ["platform", "type", "name"];

/// The outcome of ingesting a batch of spreadsheet rows.
pub struct IngestResult {
    pub resources: Vec<CanonicalResource>,
    pub warnings: Vec<String>,
}

/// Converts already-parsed tabular rows into canonical resources, injecting
/// safe defaults and mirroring reserved metadata columns into `Tags`.
pub fn ingest(rows: Vec<SpreadsheetRow>) -> Result<IngestResult, SpreadsheetError> {
    let mut resources = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let platform_raw = row
            .get("platform")
            .and_then(Value::as_str)
            .ok_or(SpreadsheetError::MissingPlatform(index))?;
        let platform: Platform = platform_raw
            .parse()
            .map_err(|_| SpreadsheetError::UnknownPlatform(index, platform_raw.to_string()))?;

        let type_raw = row
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SpreadsheetError::MissingType(index))?;
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .ok_or(SpreadsheetError::MissingName(index))?;

        let (normalized_type, known) = normalize_type(type_raw);
        if !known {
            warnings.push(format!(
                "row {index}: unrecognized type '{type_raw}', kept as '{normalized_type}'"
            ));
        }

        let mut resource = CanonicalResource::new(platform, normalized_type, name);
        for (column, value) in &row {
            if STRUCTURAL_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            if column.eq_ignore_ascii_case("tags") {
                if let Some(parsed) = parse_embedded_tags(value) {
                    for (k, v) in parsed {
                        resource.tags_mut().insert(k, v);
                    }
                    continue;
                }
            }
            resource.properties.insert(column.clone(), value.clone());
        }

        apply_safe_defaults(&mut resource);
        mirror_metadata_into_tags(&mut resource);
        resources.push(resource);
    }

    inject_safe_defaults_summary(&mut warnings, &resources);
    Ok(IngestResult { resources, warnings })
}

/// `Tags` cells may arrive as an embedded JSON object string (e.g.
/// `{"App":"Web"}`) or already as a JSON object.
fn parse_embedded_tags(value: &Value) -> Option<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_object().cloned()),
        _ => None,
    }
}

fn inject_safe_defaults_summary(warnings: &mut Vec<String>, resources: &[CanonicalResource]) {
    if resources.is_empty() {
        warnings.push("no resources were ingested from the provided rows".to_string());
    }
}

/// Convenience ingestion path for CSV-formatted tabular input (used by
/// tests and local demos; the HTTP upload surface handles real `.xlsx`).
pub fn from_csv_str(data: &str) -> Result<Vec<SpreadsheetRow>, SpreadsheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SpreadsheetError::Csv(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SpreadsheetError::Csv(e.to_string()))?;
        let mut row = SpreadsheetRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(value.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}
