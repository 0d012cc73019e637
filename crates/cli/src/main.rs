mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ohlcflow_core::{Bar, Record};
use ohlcflow_data::{csv_loader, json_loader, InputFormat};
use ohlcflow_indicators::{Atr, Calculator, ElderRay, Ema, Sar, Sessions, Sma, TrueRange};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{IndicatorConfig, IndicatorKind};
use crate::output::{OutputFormat, Table};

#[derive(Parser)]
#[command(name = "ohlcflow")]
#[command(about = "Compute technical indicator series from OHLC bar files")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one indicator, aligned row-for-row with the input
    Compute {
        /// Indicator to compute
        #[arg(short, long, value_enum)]
        indicator: IndicatorKind,

        /// Path to a CSV bar file or a JSON array of records
        #[arg(short, long)]
        data: PathBuf,

        /// TOML file with per-indicator option tables
        #[arg(short, long, env = "OHLCFLOW_CONFIG")]
        config: Option<PathBuf>,

        /// Override the indicator's window size
        #[arg(short, long)]
        window_size: Option<usize>,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate intraday bars into daily sessions
    Sessions {
        /// Path to a CSV bar file
        #[arg(short, long)]
        data: PathBuf,

        /// Drop the first day (it may have started before the data)
        #[arg(long)]
        discard_partial_first: bool,

        /// Drop the last day (it may still be in progress)
        #[arg(long)]
        discard_partial_last: bool,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// List available indicators and print the default options as TOML
    Indicators,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (stderr, so stdout stays clean for data)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compute {
            indicator,
            data,
            config,
            window_size,
            format,
            output,
        } => {
            let mut indicator_config = match config {
                Some(path) => IndicatorConfig::load(&path)?,
                None => IndicatorConfig::default(),
            };
            if let Some(window_size) = window_size {
                indicator_config.override_window_size(indicator, window_size);
            }
            let table = compute(indicator, &data, &indicator_config)?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)?;
                    table.write(format, std::io::BufWriter::new(file))?;
                    info!(output = %path.display(), rows = table.rows.len(), "Wrote indicator series");
                }
                None => table.write(format, std::io::stdout().lock())?,
            }
        }
        Commands::Sessions {
            data,
            discard_partial_first,
            discard_partial_last,
            format,
        } => {
            let bars = csv_loader::load_bars_from_csv(&data)?;
            let sessions = Sessions::new()
                .discard_partial_first(discard_partial_first)
                .discard_partial_last(discard_partial_last)
                .group(&bars);
            info!(bars = bars.len(), sessions = sessions.len(), "Grouped sessions");
            write_bars(&sessions, format, std::io::stdout().lock())?;
        }
        Commands::Indicators => {
            println!("Available indicators:");
            for kind in [
                IndicatorKind::Atr,
                IndicatorKind::Sar,
                IndicatorKind::ElderRay,
                IndicatorKind::Ema,
                IndicatorKind::Sma,
                IndicatorKind::TrueRange,
            ] {
                let name = clap::ValueEnum::to_possible_value(&kind)
                    .map(|v| v.get_name().to_string())
                    .unwrap_or_default();
                println!("  {:<12} - {}", name, kind.describe());
            }
            println!("\nDefault options (usable as --config):\n");
            println!("{}", toml::to_string_pretty(&IndicatorConfig::default())?);
        }
    }

    Ok(())
}

fn compute(indicator: IndicatorKind, data: &Path, config: &IndicatorConfig) -> Result<Table> {
    info!(indicator = ?indicator, data = %data.display(), "Computing indicator");

    match InputFormat::from_path(data)? {
        InputFormat::Csv => {
            let bars = csv_loader::load_bars_from_csv(data)?;
            if bars.is_empty() {
                anyhow::bail!("No bars loaded from CSV file");
            }
            let labels = bars.iter().map(|b| b.timestamp.to_rfc3339()).collect();
            Ok(compute_table(&bars, indicator, config)?.with_labels(labels))
        }
        InputFormat::Json => {
            let records = json_loader::load_records_from_json(data)?;
            if records.is_empty() {
                anyhow::bail!("No records loaded from JSON file");
            }
            compute_table(&records, indicator, config)
        }
    }
}

fn compute_table<R: Record>(records: &[R], indicator: IndicatorKind, config: &IndicatorConfig) -> Result<Table> {
    let table = match indicator {
        IndicatorKind::Atr => single("atr", Atr::new().with_options(config.atr.clone())?, records),
        IndicatorKind::Sar => single("sar", Sar::new().with_options(config.sar.clone())?, records),
        IndicatorKind::Ema => single("ema", Ema::new().with_options(config.ema.clone())?, records),
        IndicatorKind::Sma => single("sma", Sma::new().with_options(config.sma.clone())?, records),
        IndicatorKind::TrueRange => single(
            "true_range",
            TrueRange::new().with_options(config.true_range.clone())?,
            records,
        ),
        IndicatorKind::ElderRay => {
            let calculator = ElderRay::new().with_options(config.elder_ray.clone())?;
            check_warm_up(calculator.undefined_length(), records.len());
            let rows = calculator
                .calculate(records)
                .into_iter()
                .map(|v| vec![v.map(|o| o.bull_power), v.map(|o| o.bear_power)])
                .collect();
            Table {
                columns: vec!["bull_power".to_string(), "bear_power".to_string()],
                labels: None,
                rows,
            }
        }
    };
    Ok(table)
}

fn single<C, R>(column: &str, calculator: C, records: &[R]) -> Table
where
    C: Calculator<Output = Decimal>,
    R: Record,
{
    check_warm_up(calculator.undefined_length(), records.len());
    Table::single(column, calculator.calculate(records))
}

fn check_warm_up(undefined_length: usize, records: usize) {
    if records <= undefined_length {
        warn!(
            undefined_length,
            records, "Input is shorter than the warm-up period, every value will be empty"
        );
    }
}

fn write_bars<W: Write>(bars: &[Bar], format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for bar in bars {
                writer.serialize(bar)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, bars)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
