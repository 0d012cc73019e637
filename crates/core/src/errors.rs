use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Rejected calculator options.
///
/// Raised by `with_options` so a bad configuration fails before any data is
/// processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{indicator}: window size must be > 0")]
    InvalidWindowSize { indicator: &'static str },
    #[error("{indicator}: acceleration factor {value} must be > 0")]
    InvalidAccelerationFactor {
        indicator: &'static str,
        value: Decimal,
    },
    #[error("{indicator}: acceleration factor {step} exceeds maximum {max}")]
    AccelerationAboveMaximum {
        indicator: &'static str,
        step: Decimal,
        max: Decimal,
    },
}

// ---------------------------------------------------------------------------
// Data loading
// ---------------------------------------------------------------------------

/// Errors that can occur while loading record series.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
