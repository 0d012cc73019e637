use crate::{validate_window_size, value_source, Calculator, Source};
use ohlcflow_core::{ConfigError, FieldPath, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaOptions {
    pub window_size: usize,
    pub source_path: FieldPath,
}

impl Default for EmaOptions {
    fn default() -> Self {
        Self {
            window_size: 10,
            source_path: FieldPath::parse("close"),
        }
    }
}

/// Recurrence state for one EMA run.
#[derive(Debug, Clone, Copy, Default)]
struct EmaState {
    current: Option<Decimal>,
    count: usize,
    /// Accumulates values for the initial SMA seed.
    seed_sum: Decimal,
}

impl EmaState {
    /// Returns the next state and its output. Missing values and arithmetic
    /// overflow yield `None` and leave the state untouched.
    fn step(self, value: Option<Decimal>, len: usize, multiplier: Decimal) -> (Self, Option<Decimal>) {
        match value.and_then(|value| self.advance(value, len, multiplier)) {
            Some(next) => (next, next.current),
            None => (self, None),
        }
    }

    fn advance(self, value: Decimal, len: usize, multiplier: Decimal) -> Option<Self> {
        match self.current {
            None => {
                let seed_sum = self.seed_sum.checked_add(value)?;
                let count = self.count + 1;
                let current = if count >= len {
                    Some(seed_sum.checked_div(Decimal::from(len))?)
                } else {
                    None
                };
                Some(Self {
                    current,
                    count,
                    seed_sum,
                })
            }
            Some(prev) => {
                let current = value
                    .checked_sub(prev)?
                    .checked_mul(multiplier)?
                    .checked_add(prev)?;
                Some(Self {
                    current: Some(current),
                    ..self
                })
            }
        }
    }
}

/// Exponential Moving Average (EMA).
///
/// Seeded with the mean of the first `window_size` values. Records whose
/// source is missing produce `None` and do not advance the state, so leading
/// gaps shift the seed instead of poisoning it.
#[derive(Clone, Default)]
pub struct Ema {
    options: EmaOptions,
    custom_source: Option<Source<Option<Decimal>>>,
}

impl Ema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unvalidated constructor for callers that check the window themselves.
    pub(crate) fn from_options(options: EmaOptions) -> Self {
        Self {
            options,
            custom_source: None,
        }
    }

    fn multiplier(&self) -> Decimal {
        Decimal::TWO / (Decimal::from(self.options.window_size) + Decimal::ONE)
    }
}

impl std::fmt::Debug for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ema")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

impl Calculator for Ema {
    type Options = EmaOptions;
    type Output = Decimal;
    type Fields = Option<Decimal>;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        debug!(window_size = self.options.window_size, records = data.len(), "Computing EMA");

        let len = self.options.window_size;
        if len == 0 {
            return vec![None; data.len()];
        }
        let multiplier = self.multiplier();
        let source = self.source();
        data.iter()
            .scan(EmaState::default(), |state, d| {
                let (next, value) = state.step(source(d as &dyn Record), len, multiplier);
                *state = next;
                Some(value)
            })
            .collect()
    }

    fn options(&self) -> &EmaOptions {
        &self.options
    }

    fn with_options(mut self, options: EmaOptions) -> Result<Self, ConfigError> {
        validate_window_size("EMA", options.window_size)?;
        self.options = options;
        Ok(self)
    }

    fn source(&self) -> Source<Option<Decimal>> {
        match &self.custom_source {
            Some(source) => source.clone(),
            None => value_source(&self.options.source_path),
        }
    }

    fn with_source<F>(mut self, source: F) -> Self
    where
        F: Fn(&dyn Record) -> Option<Decimal> + Send + Sync + 'static,
    {
        self.custom_source = Some(Arc::new(source));
        self
    }

    fn undefined_length(&self) -> usize {
        self.options.window_size.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn ema(window_size: usize) -> Ema {
        Ema::new()
            .with_options(EmaOptions {
                window_size,
                ..Default::default()
            })
            .unwrap()
    }

    fn closes(values: &[i64]) -> Vec<serde_json::Value> {
        values.iter().map(|v| json!({ "close": v })).collect()
    }

    #[test]
    fn test_ema_seed() {
        let out = ema(3).calculate(&closes(&[2, 4, 6]));
        // Third value → SMA seed = (2+4+6)/3 = 4
        assert_eq!(out, vec![None, None, Some(dec!(4))]);
    }

    #[test]
    fn test_ema_after_seed() {
        let out = ema(3).calculate(&closes(&[2, 4, 6, 8]));
        // EMA = (8 - 4) * 0.5 + 4 = 6
        assert_eq!(out[3], Some(dec!(6)));
    }

    #[test]
    fn test_ema_skips_leading_gaps() {
        let mut data = vec![json!({})];
        data.extend(closes(&[2, 4, 6, 8]));
        let out = ema(3).calculate(&data);
        assert_eq!(out, vec![None, None, None, Some(dec!(4)), Some(dec!(6))]);
    }

    #[test]
    fn test_ema_custom_source_path() {
        let data = vec![json!({ "mid": { "px": 10 } }), json!({ "mid": { "px": 20 } })];
        let calc = Ema::new()
            .with_options(EmaOptions {
                window_size: 2,
                source_path: "mid.px".into(),
            })
            .unwrap();
        assert_eq!(calc.calculate(&data), vec![None, Some(dec!(15))]);
        assert_eq!(calc.undefined_length(), 1);
    }

    #[test]
    fn test_ema_overflow_is_undefined_and_keeps_state() {
        let data = vec![json!({ "close": "5e28" }), json!({ "close": "-5e28" }), json!({ "close": 1 })];
        let out = ema(1).calculate(&data);
        assert_eq!(out, vec![Some(Decimal::from_scientific("5e28").unwrap()), None, Some(dec!(1))]);
    }
}
