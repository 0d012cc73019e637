use crate::window::SlidingWindow;
use crate::{Calculator, PriceFields, PricePaths, Source};
use ohlcflow_core::{ConfigError, FieldPath, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// True Range over a two-bar window.
///
/// The first bar has no previous close, so its range is simply `high - low`.
/// A range that overflows `Decimal` is `None`.
pub(crate) fn true_range(fields: &[PriceFields]) -> Vec<Option<Decimal>> {
    SlidingWindow::new(2).apply(
        fields,
        |f| *f,
        |f| f.high?.checked_sub(f.low?),
        |window| {
            let prev_close = window[0].close?;
            let (high, low) = (window[1].high?, window[1].low?);
            let hl = high.checked_sub(low)?;
            let hc = high.checked_sub(prev_close)?.abs();
            let lc = low.checked_sub(prev_close)?.abs();
            Some(hl.max(hc).max(lc))
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueRangeOptions {
    pub high_path: FieldPath,
    pub low_path: FieldPath,
    pub close_path: FieldPath,
    pub open_path: FieldPath,
}

impl Default for TrueRangeOptions {
    fn default() -> Self {
        Self {
            high_path: FieldPath::parse("high"),
            low_path: FieldPath::parse("low"),
            close_path: FieldPath::parse("close"),
            open_path: FieldPath::parse("open"),
        }
    }
}

/// True Range as a standalone series (the raw input to ATR).
#[derive(Clone, Default)]
pub struct TrueRange {
    options: TrueRangeOptions,
    custom_source: Option<Source<PriceFields>>,
}

impl TrueRange {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for TrueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueRange")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

impl Calculator for TrueRange {
    type Options = TrueRangeOptions;
    type Output = Decimal;
    type Fields = PriceFields;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        debug!(records = data.len(), "Computing true range");
        let source = self.source();
        let fields: Vec<PriceFields> = data.iter().map(|d| source(d as &dyn Record)).collect();
        true_range(&fields)
    }

    fn options(&self) -> &TrueRangeOptions {
        &self.options
    }

    fn with_options(mut self, options: TrueRangeOptions) -> Result<Self, ConfigError> {
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
        0
    }
}
