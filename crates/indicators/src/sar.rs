use crate::window::MappedSlidingWindow;
use crate::{high_low_source, Calculator, Source};
use ohlcflow_core::{ConfigError, FieldPath, HighLow, Record};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarOptions {
    /// Base acceleration factor, also the increment applied while a trend persists.
    pub acceleration_factor: Decimal,
    pub max_acceleration_factor: Decimal,
    pub high_path: FieldPath,
    pub low_path: FieldPath,
}

impl Default for SarOptions {
    fn default() -> Self {
        Self {
            acceleration_factor: dec!(0.02),
            max_acceleration_factor: dec!(0.2),
            high_path: FieldPath::parse("high"),
            low_path: FieldPath::parse("low"),
        }
    }
}

/// Which SAR branch is authoritative for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
}

/// Per-bar Parabolic SAR state.
///
/// Both branches are tracked on every bar; `trend` selects which one is
/// reported. `trend` is `None` on the first bar and while the first
/// reversal test is ambiguous, in which case `af` is also `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarState {
    pub rising_sar: Option<Decimal>,
    pub rising_ep: Decimal,
    pub falling_sar: Option<Decimal>,
    pub falling_ep: Decimal,
    pub af: Option<Decimal>,
    pub trend: Option<Trend>,
    pub sar: Option<Decimal>,
}

impl SarState {
    fn initial(bar: HighLow, acceleration_factor: Decimal) -> Self {
        Self {
            rising_sar: Some(bar.low),
            rising_ep: bar.high,
            falling_sar: Some(bar.high),
            falling_ep: bar.low,
            af: Some(acceleration_factor),
            trend: None,
            sar: None,
        }
    }

    /// Advance one bar. `None` if the candidate stops overflow `Decimal`.
    fn step(&self, bar: HighLow, options: &SarOptions) -> Option<Self> {
        let (rising_sar, falling_sar) = match self.af {
            Some(af) => (
                accelerate(self.rising_sar, af, self.rising_ep)?,
                accelerate(self.falling_sar, af, self.falling_ep)?,
            ),
            None => (None, None),
        };
        let rising_ep = self.rising_ep.max(bar.high);
        let falling_ep = self.falling_ep.min(bar.low);

        let breaks_rising = matches!(rising_sar, Some(sar) if sar > bar.low);
        let breaks_falling = matches!(falling_sar, Some(sar) if sar < bar.high);

        // Before any trend is established, a bar that breaches both
        // candidates holds them without picking a side.
        if self.trend.is_none() && breaks_rising && breaks_falling {
            return Some(Self {
                rising_sar,
                rising_ep,
                falling_sar,
                falling_ep,
                af: None,
                trend: None,
                sar: None,
            });
        }

        let trend = match self.trend {
            Some(Trend::Falling) if breaks_falling => Trend::Rising,
            Some(Trend::Falling) => Trend::Falling,
            _ if breaks_rising => Trend::Falling,
            _ => Trend::Rising,
        };

        let next = if self.trend == Some(trend) {
            let af = match self.af {
                Some(af) => af.checked_add(options.acceleration_factor)?,
                None => options.acceleration_factor,
            }
            .min(options.max_acceleration_factor);
            Self {
                rising_sar,
                rising_ep,
                falling_sar,
                falling_ep,
                af: Some(af),
                trend: Some(trend),
                sar: None,
            }
        } else {
            // Reversal: restart both branches from the breaching bar.
            Self {
                rising_sar: Some(self.falling_ep.min(bar.low)),
                rising_ep: bar.high,
                falling_sar: Some(self.rising_ep.max(bar.high)),
                falling_ep: bar.low,
                af: Some(options.acceleration_factor),
                trend: Some(trend),
                sar: None,
            }
        };

        Some(Self {
            sar: match trend {
                Trend::Rising => next.rising_sar,
                Trend::Falling => next.falling_sar,
            },
            ..next
        })
    }

    /// Same state with no reported value, used for bars missing high/low.
    fn carried(&self) -> Self {
        Self { sar: None, ..*self }
    }
}

/// `sar + af * (ep - sar)`, which moves the stop toward the extreme point from
/// either side. The outer `None` is overflow; the inner one a missing stop.
fn accelerate(sar: Option<Decimal>, af: Decimal, ep: Decimal) -> Option<Option<Decimal>> {
    match sar {
        Some(sar) => Some(Some(sar.checked_add(af.checked_mul(ep.checked_sub(sar)?)?)?)),
        None => Some(None),
    }
}

/// Parabolic Stop-and-Reverse.
///
/// Runs a two-wide mapped sliding window: each bar's state is derived from
/// the previous bar's state and the current high/low.
#[derive(Clone, Default)]
pub struct Sar {
    options: SarOptions,
    custom_source: Option<Source<Option<HighLow>>>,
}

impl Sar {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full per-bar state chain. `None` until the first bar with both
    /// high and low present.
    pub fn states<R: Record>(&self, data: &[R]) -> Vec<Option<SarState>> {
        debug!(
            acceleration_factor = %self.options.acceleration_factor,
            max_acceleration_factor = %self.options.max_acceleration_factor,
            records = data.len(),
            "Computing SAR"
        );

        let source = self.source();
        let options = &self.options;
        MappedSlidingWindow::new(2).apply(
            data,
            |d| source(d as &dyn Record),
            |bar: &Option<HighLow>| bar.map(|hl| SarState::initial(hl, options.acceleration_factor)),
            |previous: &[Option<SarState>], bar: &Option<HighLow>| match (previous[0], *bar) {
                (Some(prev), Some(hl)) => Some(prev.step(hl, options).unwrap_or_else(|| prev.carried())),
                (Some(prev), None) => Some(prev.carried()),
                (None, Some(hl)) => Some(SarState::initial(hl, options.acceleration_factor)),
                (None, None) => None,
            },
        )
    }
}

impl std::fmt::Debug for Sar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sar")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

impl Calculator for Sar {
    type Options = SarOptions;
    type Output = Decimal;
    type Fields = Option<HighLow>;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        self.states(data)
            .into_iter()
            .map(|state| state.and_then(|s| s.sar))
            .collect()
    }

    fn options(&self) -> &SarOptions {
        &self.options
    }

    fn with_options(mut self, options: SarOptions) -> Result<Self, ConfigError> {
        if options.acceleration_factor <= Decimal::ZERO {
            return Err(ConfigError::InvalidAccelerationFactor {
                indicator: "SAR",
                value: options.acceleration_factor,
            });
        }
        if options.acceleration_factor > options.max_acceleration_factor {
            return Err(ConfigError::AccelerationAboveMaximum {
                indicator: "SAR",
                step: options.acceleration_factor,
                max: options.max_acceleration_factor,
            });
        }
        self.options = options;
        Ok(self)
    }

    fn source(&self) -> Source<Option<HighLow>> {
        match &self.custom_source {
            Some(source) => source.clone(),
            None => high_low_source(&self.options.high_path, &self.options.low_path),
        }
    }

    fn with_source<F>(mut self, source: F) -> Self
    where
        F: Fn(&dyn Record) -> Option<HighLow> + Send + Sync + 'static,
    {
        self.custom_source = Some(Arc::new(source));
        self
    }

    fn undefined_length(&self) -> usize {
        1
    }
}
