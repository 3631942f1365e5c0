//! Load grouped record input from JSON.

use crate::record::RecordGroups;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Parse an in-memory JSON document into grouped records.
///
/// The top level must be an object mapping category labels to lists. Leaf
/// values are validated later, when records are staged.
pub fn parse_records(json: &str) -> Result<RecordGroups> {
    let value: Value = serde_json::from_str(json).context("failed to parse record JSON")?;
    match value {
        Value::Object(groups) => Ok(groups),
        other => anyhow::bail!(
            "expected a JSON object of record groups at the top level, found {}",
            crate::value::json_kind(&other)
        ),
    }
}

/// Read grouped records from a JSON file.
pub fn load_records(path: &Path) -> Result<RecordGroups> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read records from {}", path.display()))?;
    parse_records(&json).with_context(|| format!("invalid record file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_object() {
        let groups = parse_records(r#"{"members": [{"id": 1}], "meta": "x"}"#).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups["members"].is_array());
    }

    #[test]
    fn test_parse_records_rejects_array_top_level() {
        let err = parse_records("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("found list"));
    }

    #[test]
    fn test_parse_records_rejects_invalid_json() {
        assert!(parse_records("{not json").is_err());
    }

    #[test]
    fn test_load_records_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_records(&tmp.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read records"));
    }
}
