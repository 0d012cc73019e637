use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ohlcflow_core::{Bar, DataError};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::ensure_exists;

/// Load OHLCV bars from a CSV file.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `timestamp` (or `date`, `datetime`, `time`), `open`, `high`, `low`, `close`,
/// and optionally `volume`.
///
/// Bars are returned sorted by timestamp; the instrument is the file stem.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    ensure_exists(path)?;
    let instrument = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::ParseError(format!("Failed to open CSV: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let cell = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                DataError::ParseError(format!("Row {} is missing column {}", line + 1, idx + 1))
            })
        };

        let timestamp = parse_timestamp(cell(col_map.timestamp)?)?;
        let open = parse_decimal(cell(col_map.open)?, "open")?;
        let high = parse_decimal(cell(col_map.high)?, "high")?;
        let low = parse_decimal(cell(col_map.low)?, "low")?;
        let close = parse_decimal(cell(col_map.close)?, "close")?;
        let volume = match col_map.volume {
            Some(vol_idx) => parse_decimal(cell(vol_idx)?, "volume")?,
            None => Decimal::ZERO,
        };

        bars.push(Bar {
            instrument: instrument.clone(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    info!(path = %path.display(), bars = bars.len(), "Loaded bars from CSV");
    Ok(bars)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    Ok(BarColumnMap {
        timestamp: required_column(headers, &["timestamp", "date", "datetime", "time"], "timestamp")?,
        open: required_column(headers, &["open", "o"], "open")?,
        high: required_column(headers, &["high", "h"], "high")?,
        low: required_column(headers, &["low", "l"], "low")?,
        close: required_column(headers, &["close", "c"], "close")?,
        volume: find_column(headers, &["volume", "vol", "v"]),
    })
}

fn required_column(headers: &csv::StringRecord, names: &[&str], label: &str) -> Result<usize, DataError> {
    find_column(headers, names).ok_or_else(|| DataError::ParseError(format!("No {} column found", label)))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let h = header.trim().to_lowercase();
        names.iter().any(|name| h == *name)
    })
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(s.trim())
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    // Try RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Common formats (without timezone, assume UTC)
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    // Date-only rows are daily bars at midnight
    if let Some(naive_dt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive_dt.and_utc());
    }

    // Try Unix timestamp (seconds)
    if let Some(dt) = s.parse::<i64>().ok().and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        return Ok(dt);
    }

    Err(DataError::ParseError(format!("Unable to parse timestamp: '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ohlcflow-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_sorted_bars() {
        let path = write_temp(
            "ES.csv",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-03,11,12,10,11.5,900\n\
             2024-01-02,10,11,9,10.5,1000\n",
        );
        let bars = load_bars_from_csv(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].instrument, "ES");
        assert_eq!(bars[0].close, dec!(10.5));
        assert_eq!(bars[1].volume, dec!(900));
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn test_short_headers_without_volume() {
        let path = write_temp("NQ.csv", "time,o,h,l,c\n1704153600,1,2,0.5,1.5\n");
        let bars = load_bars_from_csv(&path).unwrap();
        assert_eq!(bars[0].high, dec!(2));
        assert_eq!(bars[0].volume, Decimal::ZERO);
        assert_eq!(bars[0].timestamp.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_missing_column() {
        let path = write_temp("bad.csv", "date,open,high,close\n2024-01-02,1,2,1.5\n");
        let err = load_bars_from_csv(&path).unwrap_err();
        assert!(err.to_string().contains("No low column found"));
    }

    #[test]
    fn test_bad_price() {
        let path = write_temp("bad_price.csv", "date,open,high,low,close\n2024-01-02,1,abc,0.5,1\n");
        let err = load_bars_from_csv(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse high"));
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-01-02T09:30:00Z").is_ok());
        assert!(parse_timestamp("2024-01-02 09:30:00").is_ok());
        assert!(parse_timestamp("01/02/2024 09:30").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
