pub mod atr;
pub mod elder_ray;
pub mod ema;
pub mod sar;
pub mod sessions;
pub mod sma;
pub mod true_range;
pub mod window;

pub use atr::{Atr, AtrOptions};
pub use elder_ray::{ElderRay, ElderRayOptions, ElderRayOutput, MovingAverageType};
pub use ema::{Ema, EmaOptions};
pub use sar::{Sar, SarOptions, SarState, Trend};
pub use sessions::Sessions;
pub use sma::{Sma, SmaOptions};
pub use true_range::{TrueRange, TrueRangeOptions};

use ohlcflow_core::{ConfigError, FieldPath, HighLow, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Function that reads the fields a calculator needs from one record.
pub type Source<T> = Arc<dyn Fn(&dyn Record) -> T + Send + Sync>;

/// Uniform shape of every indicator.
///
/// A calculator is an immutable value: options are replaced wholesale with
/// [`with_options`](Calculator::with_options), which hands back a new
/// calculator. Recurrence state lives only inside one `calculate` call, so
/// running the same instance twice on the same input yields identical output.
pub trait Calculator: Sized {
    type Options;
    type Output;
    /// What the source function extracts from each record.
    type Fields;

    /// Compute the derived series. The output always has `data.len()` entries.
    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Self::Output>>;

    fn options(&self) -> &Self::Options;

    /// Replace the options, rejecting invalid configurations.
    fn with_options(self, options: Self::Options) -> Result<Self, ConfigError>;

    /// The current source function (the custom one if set, otherwise one built
    /// from the configured field paths).
    fn source(&self) -> Source<Self::Fields>;

    fn with_source<F>(self, source: F) -> Self
    where
        F: Fn(&dyn Record) -> Self::Fields + Send + Sync + 'static;

    /// Number of leading output entries that are guaranteed to be `None`.
    fn undefined_length(&self) -> usize;
}

pub(crate) fn validate_window_size(indicator: &'static str, window_size: usize) -> Result<(), ConfigError> {
    if window_size == 0 {
        return Err(ConfigError::InvalidWindowSize { indicator });
    }
    Ok(())
}

/// Sum of a window; `None` if any value is missing or the total overflows.
pub(crate) fn checked_sum(values: &[Option<Decimal>]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add((*value)?))
}

pub(crate) fn checked_mean(values: &[Option<Decimal>]) -> Option<Decimal> {
    checked_sum(values)?.checked_div(Decimal::from(values.len()))
}

// ---------------------------------------------------------------------------
// Price fields
// ---------------------------------------------------------------------------

/// OHLC fields read from a record; any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFields {
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
}

/// Paths used to build the default [`PriceFields`] source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PricePaths {
    pub open: FieldPath,
    pub high: FieldPath,
    pub low: FieldPath,
    pub close: FieldPath,
}

impl PricePaths {
    pub fn source(&self) -> Source<PriceFields> {
        let paths = self.clone();
        Arc::new(move |record: &dyn Record| PriceFields {
            open: record.field(&paths.open),
            high: record.field(&paths.high),
            low: record.field(&paths.low),
            close: record.field(&paths.close),
        })
    }
}

pub(crate) fn high_low_source(high: &FieldPath, low: &FieldPath) -> Source<Option<HighLow>> {
    let (high, low) = (high.clone(), low.clone());
    Arc::new(move |record: &dyn Record| {
        Some(HighLow {
            high: record.field(&high)?,
            low: record.field(&low)?,
        })
    })
}

pub(crate) fn value_source(path: &FieldPath) -> Source<Option<Decimal>> {
    Arc::new(path.getter())
}
