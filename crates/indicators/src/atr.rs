use crate::true_range::true_range;
use crate::window::SlidingWindow;
use crate::{checked_mean, validate_window_size, Calculator, PriceFields, PricePaths, Source};
use ohlcflow_core::{ConfigError, FieldPath, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtrOptions {
    pub window_size: usize,
    pub high_path: FieldPath,
    pub low_path: FieldPath,
    pub close_path: FieldPath,
    pub open_path: FieldPath,
}

impl Default for AtrOptions {
    fn default() -> Self {
        Self {
            window_size: 14,
            high_path: FieldPath::parse("high"),
            low_path: FieldPath::parse("low"),
            close_path: FieldPath::parse("close"),
            open_path: FieldPath::parse("open"),
        }
    }
}

/// Average True Range (ATR).
///
/// Two stages: True Range over a two-bar window, then Wilder smoothing over
/// `window_size` True Range values. The first True Range is a real value
/// (`high - low`), so the smoothing stage starts at index 0 and the first
/// ATR lands at `window_size - 1`.
#[derive(Clone, Default)]
pub struct Atr {
    options: AtrOptions,
    custom_source: Option<Source<PriceFields>>,
}

impl Atr {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atr")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

/// One Wilder smoothing step over a full window of True Range values.
///
/// Seeds with the window mean; afterwards only the newest value matters.
fn wilder_step(prev_atr: Option<Decimal>, window: &[Option<Decimal>]) -> Option<Decimal> {
    let len = Decimal::from(window.len());
    match prev_atr {
        Some(prev) => {
            let tr = (*window.last()?)?;
            prev.checked_mul(len - Decimal::ONE)?
                .checked_add(tr)?
                .checked_div(len)
        }
        None => checked_mean(window),
    }
}

impl Calculator for Atr {
    type Options = AtrOptions;
    type Output = Decimal;
    type Fields = PriceFields;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        debug!(window_size = self.options.window_size, records = data.len(), "Computing ATR");

        let source = self.source();
        let fields: Vec<PriceFields> = data.iter().map(|d| source(d as &dyn Record)).collect();
        let tr = true_range(&fields);

        let mut prev_atr = None;
        SlidingWindow::new(self.options.window_size).apply(
            &tr,
            |value| *value,
            |_| None,
            |window| {
                let atr = wilder_step(prev_atr, window)?;
                prev_atr = Some(atr);
                Some(atr)
            },
        )
    }

    fn options(&self) -> &AtrOptions {
        &self.options
    }

    fn with_options(mut self, options: AtrOptions) -> Result<Self, ConfigError> {
        validate_window_size("ATR", options.window_size)?;
        self.options = options;
        Ok(self)
    }

    fn source(&self) -> Source<PriceFields> {
        match &self.custom_source {
            Some(source) => source.clone(),
            None => PricePaths {
                open: self.options.open_path.clone(),
                high: self.options.high_path.clone(),
                low: self.options.low_path.clone(),
                close: self.options.close_path.clone(),
            }
            .source(),
        }
    }

    fn with_source<F>(mut self, source: F) -> Self
    where
        F: Fn(&dyn Record) -> PriceFields + Send + Sync + 'static,
    {
        self.custom_source = Some(Arc::new(source));
        self
    }

    fn undefined_length(&self) -> usize {
        self.options.window_size.saturating_sub(1)
    }
}
