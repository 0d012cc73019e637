pub mod csv_loader;
pub mod json_loader;

use ohlcflow_core::DataError;
use std::path::Path;

/// Supported input file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            other => Err(DataError::ParseError(format!(
                "Unsupported input format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }
}

pub(crate) fn ensure_exists(path: &Path) -> Result<(), DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(format!("File not found: {}", path.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("es.csv")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("ES.JSON")).unwrap(), InputFormat::Json);
        assert!(InputFormat::from_path(Path::new("es.parquet")).is_err());
        assert!(InputFormat::from_path(Path::new("es")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ensure_exists(Path::new("/nonexistent/ohlcflow/bars.csv")).unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }
}
