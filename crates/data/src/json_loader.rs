use ohlcflow_core::DataError;
use std::path::Path;
use tracing::info;

use crate::ensure_exists;

/// Load a JSON array of record objects.
///
/// Records are kept as `serde_json::Value` so calculators can reach nested
/// fields through dotted paths (e.g. `"quote.high"`). Objects are not
/// validated beyond being objects; missing fields surface later as `None`.
pub fn load_records_from_json(path: &Path) -> Result<Vec<serde_json::Value>, DataError> {
    ensure_exists(path)?;
    let contents = std::fs::read_to_string(path)?;
    let records = parse_records(&contents)?;
    info!(path = %path.display(), records = records.len(), "Loaded records from JSON");
    Ok(records)
}

fn parse_records(contents: &str) -> Result<Vec<serde_json::Value>, DataError> {
    let document: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| DataError::ParseError(format!("Invalid JSON: {}", e)))?;

    let serde_json::Value::Array(records) = document else {
        return Err(DataError::ParseError("Expected a top-level JSON array of records".into()));
    };

    if let Some(position) = records.iter().position(|r| !r.is_object()) {
        return Err(DataError::ParseError(format!(
            "Record {} is not a JSON object",
            position
        )));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohlcflow_core::{FieldPath, Record};
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_nested_records() {
        let records = parse_records(r#"[{"quote": {"high": 10.5}}, {"quote": {"high": "11"}}]"#).unwrap();
        let path = FieldPath::parse("quote.high");
        assert_eq!(records[0].field(&path), Some(dec!(10.5)));
        assert_eq!(records[1].field(&path), Some(dec!(11)));
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse_records(r#"{"high": 1}"#).unwrap_err();
        assert!(err.to_string().contains("top-level JSON array"));
    }

    #[test]
    fn test_rejects_scalar_record() {
        let err = parse_records("[{}, 3]").unwrap_err();
        assert!(err.to_string().contains("Record 1"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("ohlcflow-json-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bars.json");
        std::fs::write(&path, r#"[{"high": 2, "low": 1}]"#).unwrap();
        assert_eq!(load_records_from_json(&path).unwrap().len(), 1);
    }
}
