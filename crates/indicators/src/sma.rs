use crate::window::SlidingWindow;
use crate::{checked_mean, validate_window_size, value_source, Calculator, Source};
use ohlcflow_core::{ConfigError, FieldPath, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaOptions {
    pub window_size: usize,
    pub source_path: FieldPath,
}

impl Default for SmaOptions {
    fn default() -> Self {
        Self {
            window_size: 10,
            source_path: FieldPath::parse("close"),
        }
    }
}

/// Simple Moving Average (SMA).
#[derive(Clone, Default)]
pub struct Sma {
    options: SmaOptions,
    custom_source: Option<Source<Option<Decimal>>>,
}

impl Sma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unvalidated constructor for callers that check the window themselves.
    pub(crate) fn from_options(options: SmaOptions) -> Self {
        Self {
            options,
            custom_source: None,
        }
    }
}

impl std::fmt::Debug for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sma")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

impl Calculator for Sma {
    type Options = SmaOptions;
    type Output = Decimal;
    type Fields = Option<Decimal>;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        debug!(window_size = self.options.window_size, records = data.len(), "Computing SMA");

        let source = self.source();
        SlidingWindow::new(self.options.window_size).apply(
            data,
            |d| source(d as &dyn Record),
            |_| None,
            checked_mean,
        )
    }

    fn options(&self) -> &SmaOptions {
        &self.options
    }

    fn with_options(mut self, options: SmaOptions) -> Result<Self, ConfigError> {
        validate_window_size("SMA", options.window_size)?;
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
