use crate::window::AccumulatingWindow;
use ohlcflow_core::Bar;
use tracing::debug;

/// Aggregates intraday bars into one bar per calendar day (UTC).
///
/// The first day in the input may have started before the data did, and the
/// last may still be in progress; either can be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sessions {
    window: AccumulatingWindow,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discard_partial_first(mut self, discard: bool) -> Self {
        self.window = self.window.discard_till_start(discard);
        self
    }

    pub fn discard_partial_last(mut self, discard: bool) -> Self {
        self.window = self.window.discard_till_end(discard);
        self
    }

    pub fn group(&self, bars: &[Bar]) -> Vec<Bar> {
        debug!(bars = bars.len(), "Grouping bars into sessions");

        self.window
            .apply(
                bars,
                Bar::clone,
                |bar, i| i > 0 && bars[i - 1].timestamp.date_naive() != bar.timestamp.date_naive(),
                merge_session,
            )
            .into_iter()
            .flatten()
            .collect()
    }
}

/// First open, highest high, lowest low, last close, total volume
/// (saturating at `Decimal::MAX`).
fn merge_session(session: &[Bar]) -> Option<Bar> {
    let (first, rest) = session.split_first()?;
    let mut merged = first.clone();
    for bar in rest {
        merged.high = merged.high.max(bar.high);
        merged.low = merged.low.min(bar.low);
        merged.close = bar.close;
        merged.volume = merged.volume.saturating_add(bar.volume);
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Six-hourly bars across three days, starting mid-day.
    fn intraday() -> Vec<Bar> {
        let start = DateTime::<Utc>::from_timestamp(1_704_196_800, 0).unwrap(); // 2024-01-02 12:00
        (0..10)
            .map(|i| {
                let base = Decimal::from(100 + i);
                Bar {
                    instrument: "ES".to_string(),
                    timestamp: start + Duration::hours(6 * i),
                    open: base,
                    high: base + dec!(2),
                    low: base - dec!(1),
                    close: base + dec!(1),
                    volume: dec!(10),
                }
            })
            .collect()
    }

    #[test]
    fn test_daily_sessions() {
        let sessions = Sessions::new().group(&intraday());
        // 12:00, 18:00 | 4 bars | 4 bars
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].open, dec!(100));
        assert_eq!(sessions[0].high, dec!(103));
        assert_eq!(sessions[0].close, dec!(102));
        assert_eq!(sessions[0].volume, dec!(20));

        assert_eq!(sessions[1].open, dec!(102));
        assert_eq!(sessions[1].high, dec!(107));
        assert_eq!(sessions[1].low, dec!(101));
        assert_eq!(sessions[1].close, dec!(106));
        assert_eq!(sessions[1].volume, dec!(40));
    }

    #[test]
    fn test_discard_partial_sessions() {
        let sessions = Sessions::new()
            .discard_partial_first(true)
            .discard_partial_last(true)
            .group(&intraday());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].open, dec!(102));
    }

    #[test]
    fn test_no_bars() {
        assert!(Sessions::new().group(&[]).is_empty());
    }

    #[test]
    fn test_session_volume_saturates() {
        let mut bars = intraday();
        bars[2].volume = Decimal::MAX;
        bars[3].volume = Decimal::MAX;
        let sessions = Sessions::new().group(&bars);
        assert_eq!(sessions[1].volume, Decimal::MAX);
    }
}
