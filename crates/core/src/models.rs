use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::{FieldPath, Record};

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Look up a price field by name (`open`, `high`, `low`, `close`, `volume`).
    pub fn price(&self, name: &str) -> Option<Decimal> {
        match name {
            "open" => Some(self.open),
            "high" => Some(self.high),
            "low" => Some(self.low),
            "close" => Some(self.close),
            "volume" => Some(self.volume),
            _ => None,
        }
    }
}

impl Record for Bar {
    fn field(&self, path: &FieldPath) -> Option<Decimal> {
        match path.segments() {
            [name] => self.price(name),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived fields
// ---------------------------------------------------------------------------

/// The high/low pair read from one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighLow {
    pub high: Decimal,
    pub low: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar() -> Bar {
        Bar {
            instrument: "ES".to_string(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            open: dec!(10),
            high: dec!(12),
            low: dec!(9),
            close: dec!(11),
            volume: dec!(1500),
        }
    }

    #[test]
    fn test_bar_fields() {
        let bar = bar();
        assert_eq!(bar.field(&FieldPath::parse("high")), Some(dec!(12)));
        assert_eq!(bar.field(&FieldPath::parse("volume")), Some(dec!(1500)));
        assert_eq!(bar.field(&FieldPath::parse("vwap")), None);
        assert_eq!(bar.field(&FieldPath::parse("high.value")), None);
    }
}
