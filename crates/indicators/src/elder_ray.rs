use crate::ema::{Ema, EmaOptions};
use crate::sma::{Sma, SmaOptions};
use crate::{validate_window_size, Calculator, PriceFields, PricePaths, Source};
use ohlcflow_core::{ConfigError, FieldPath, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Moving average the powers are measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverageType {
    #[default]
    Sma,
    Ema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElderRayOptions {
    pub moving_average_type: MovingAverageType,
    /// Field the moving average is computed over.
    pub source_path: FieldPath,
    pub window_size: usize,
    pub high_path: FieldPath,
    pub low_path: FieldPath,
}

impl Default for ElderRayOptions {
    fn default() -> Self {
        Self {
            moving_average_type: MovingAverageType::Sma,
            source_path: FieldPath::parse("close"),
            window_size: 13,
            high_path: FieldPath::parse("high"),
            low_path: FieldPath::parse("low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElderRayOutput {
    pub bull_power: Decimal,
    pub bear_power: Decimal,
}

/// Elder Ray: distance of the high and the low from a moving average.
///
/// Bull Power = high - MA, Bear Power = low - MA. The moving average runs
/// over the `close` field of the source, so a custom source drives both.
#[derive(Clone, Default)]
pub struct ElderRay {
    options: ElderRayOptions,
    custom_source: Option<Source<PriceFields>>,
}

impl ElderRay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moving average over the source's `close` field.
    fn moving_average<R: Record>(&self, data: &[R]) -> Vec<Option<Decimal>> {
        let window_size = self.options.window_size;
        let source_path = self.options.source_path.clone();
        let source = self.source();
        let close = move |record: &dyn Record| source(record).close;
        match self.options.moving_average_type {
            MovingAverageType::Ema => Ema::from_options(EmaOptions {
                window_size,
                source_path,
            })
            .with_source(close)
            .calculate(data),
            MovingAverageType::Sma => Sma::from_options(SmaOptions {
                window_size,
                source_path,
            })
            .with_source(close)
            .calculate(data),
        }
    }
}

impl std::fmt::Debug for ElderRay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElderRay")
            .field("options", &self.options)
            .field("custom_source", &self.custom_source.is_some())
            .finish()
    }
}

impl Calculator for ElderRay {
    type Options = ElderRayOptions;
    type Output = ElderRayOutput;
    type Fields = PriceFields;

    fn calculate<R: Record>(&self, data: &[R]) -> Vec<Option<ElderRayOutput>> {
        debug!(
            window_size = self.options.window_size,
            moving_average = ?self.options.moving_average_type,
            records = data.len(),
            "Computing Elder Ray"
        );

        let averages = self.moving_average(data);

        let source = self.source();
        data.iter()
            .zip(averages)
            .map(|(d, average)| {
                let average = average?;
                let fields = source(d as &dyn Record);
                Some(ElderRayOutput {
                    bull_power: fields.high?.checked_sub(average)?,
                    bear_power: fields.low?.checked_sub(average)?,
                })
            })
            .collect()
    }

    fn options(&self) -> &ElderRayOptions {
        &self.options
    }

    fn with_options(mut self, options: ElderRayOptions) -> Result<Self, ConfigError> {
        validate_window_size("Elder Ray", options.window_size)?;
        self.options = options;
        Ok(self)
    }

    fn source(&self) -> Source<PriceFields> {
        match &self.custom_source {
            Some(source) => source.clone(),
            None => PricePaths {
                open: FieldPath::parse("open"),
                high: self.options.high_path.clone(),
                low: self.options.low_path.clone(),
                close: self.options.source_path.clone(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::bars;
    use rust_decimal_macros::dec;

    fn sample() -> Vec<ohlcflow_core::Bar> {
        bars(&[
            (dec!(10), dec!(8), dec!(9)),
            (dec!(11), dec!(9), dec!(11)),
            (dec!(12), dec!(9), dec!(10)),
            (dec!(13), dec!(10), dec!(12)),
            (dec!(12), dec!(11), dec!(12)),
        ])
    }

    fn elder_ray(moving_average_type: MovingAverageType, window_size: usize) -> ElderRay {
        ElderRay::new()
            .with_options(ElderRayOptions {
                moving_average_type,
                window_size,
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_elder_ray_sma() {
        let out = elder_ray(MovingAverageType::Sma, 2).calculate(&sample());
        assert_eq!(out[0], None);
        // MA(close) at index 1 = (9 + 11) / 2 = 10
        assert_eq!(
            out[1],
            Some(ElderRayOutput {
                bull_power: dec!(1),
                bear_power: dec!(-1),
            })
        );
    }

    #[test]
    fn test_elder_ray_ema() {
        let out = elder_ray(MovingAverageType::Ema, 3).calculate(&sample());
        assert_eq!(&out[..2], &[None, None]);
        // EMA seed = (9 + 11 + 10) / 3 = 10, then (12 - 10) * 0.5 + 10 = 11
        assert_eq!(out[2].map(|o| o.bull_power), Some(dec!(2)));
        assert_eq!(out[3].map(|o| o.bull_power), Some(dec!(2)));
        assert_eq!(out[3].map(|o| o.bear_power), Some(dec!(-1)));
    }

    #[test]
    fn test_elder_ray_power_spread_is_bar_range() {
        let data = sample();
        for kind in [MovingAverageType::Sma, MovingAverageType::Ema] {
            let calc = elder_ray(kind, 2);
            let out = calc.calculate(&data);
            assert_eq!(out.len(), data.len());
            assert!(out[..calc.undefined_length()].iter().all(Option::is_none));
            for (bar, value) in data.iter().zip(&out).skip(calc.undefined_length()) {
                let value = value.unwrap();
                assert_eq!(value.bull_power - value.bear_power, bar.high - bar.low);
                assert!(value.bull_power >= value.bear_power);
            }
        }
    }

    #[test]
    fn test_elder_ray_missing_high() {
        let data = vec![
            serde_json::json!({ "high": 10, "low": 8, "close": 9 }),
            serde_json::json!({ "low": 9, "close": 11 }),
        ];
        let out = elder_ray(MovingAverageType::Sma, 1).calculate(&data);
        assert_eq!(
            out[0],
            Some(ElderRayOutput {
                bull_power: dec!(1),
                bear_power: dec!(-1),
            })
        );
        assert_eq!(out[1], None);
    }

    #[test]
    fn test_elder_ray_options_from_toml() {
        let options: ElderRayOptions = toml::from_str("moving_average_type = \"ema\"").unwrap();
        assert_eq!(options.moving_average_type, MovingAverageType::Ema);
        assert_eq!(options.window_size, 13);
    }

    #[test]
    fn test_elder_ray_custom_source_drives_moving_average() {
        let data = vec![
            serde_json::json!({ "px": { "h": 11, "l": 9, "c": 10 } }),
            serde_json::json!({ "px": { "h": 12, "l": 10, "c": 12 } }),
        ];
        let calc = elder_ray(MovingAverageType::Sma, 1).with_source(|record| PriceFields {
            open: None,
            high: record.field(&"px.h".into()),
            low: record.field(&"px.l".into()),
            close: record.field(&"px.c".into()),
        });
        assert_eq!(
            calc.calculate(&data),
            vec![
                Some(ElderRayOutput {
                    bull_power: dec!(1),
                    bear_power: dec!(-1),
                }),
                Some(ElderRayOutput {
                    bull_power: dec!(0),
                    bear_power: dec!(-2),
                }),
            ]
        );
    }

    #[test]
    fn test_elder_ray_overflowing_power_is_undefined() {
        let data = vec![
            serde_json::json!({ "high": "5e28", "low": 0, "close": "-5e28" }),
            serde_json::json!({ "high": 2, "low": 0, "close": 1 }),
        ];
        let out = elder_ray(MovingAverageType::Ema, 1).calculate(&data);
        assert_eq!(out[0], None);
        assert_eq!(
            out[1],
            Some(ElderRayOutput {
                bull_power: dec!(1),
                bear_power: dec!(-1),
            })
        );
    }
}
