use anyhow::{Context, Result};
use clap::ValueEnum;
use ohlcflow_indicators::{AtrOptions, ElderRayOptions, EmaOptions, SarOptions, SmaOptions, TrueRangeOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Indicators the CLI can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndicatorKind {
    Atr,
    Sar,
    ElderRay,
    Ema,
    Sma,
    TrueRange,
}

impl IndicatorKind {
    pub fn describe(&self) -> &'static str {
        match self {
            IndicatorKind::Atr => "Average True Range (Wilder smoothing)",
            IndicatorKind::Sar => "Parabolic Stop-and-Reverse",
            IndicatorKind::ElderRay => "Elder Ray bull/bear power",
            IndicatorKind::Ema => "Exponential Moving Average",
            IndicatorKind::Sma => "Simple Moving Average",
            IndicatorKind::TrueRange => "True Range",
        }
    }
}

/// Options for every indicator, loaded from an optional TOML file.
///
/// Each table is optional and any key left out keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub atr: AtrOptions,
    pub sar: SarOptions,
    pub elder_ray: ElderRayOptions,
    pub ema: EmaOptions,
    pub sma: SmaOptions,
    pub true_range: TrueRangeOptions,
}

impl IndicatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply a `--window-size` override to the selected indicator.
    pub fn override_window_size(&mut self, kind: IndicatorKind, window_size: usize) {
        match kind {
            IndicatorKind::Atr => self.atr.window_size = window_size,
            IndicatorKind::ElderRay => self.elder_ray.window_size = window_size,
            IndicatorKind::Ema => self.ema.window_size = window_size,
            IndicatorKind::Sma => self.sma.window_size = window_size,
            IndicatorKind::Sar | IndicatorKind::TrueRange => {
                tracing::warn!(indicator = ?kind, "Indicator has no window size, ignoring override");
            }
        }
    }
}
