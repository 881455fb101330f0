#![forbid(unsafe_code)]
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use machineview::aggregation::{
    AnalysisWindow, ColorPalette, DateRange, WeekTieBreak, filter_by_date_range, heatmap,
    metric_histogram, weekday_series,
};
use machineview::config::{self, MachineViewConfig, load_configuration};
use machineview::datamodel::{
    AnomalyReport, MachineDateTime, MachineDateTimeExt, MachineStatusResponse, MetricName,
    MetricRecord, MetricSelection, machine_overview, parse_machine_stops,
};
use machineview::exporters::CsvConverter;
use machineview::parsing::get_parser_from_name;
use machineview::pipeline::{AnalysisParams, DashboardParams, build_analysis, build_dashboard};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::info;

/// Shapes machine telemetry into dashboard views
#[derive(Parser)]
#[command(name = "machineview")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Every dashboard chart for the selected date range
    Dashboard {
        #[command(flatten)]
        input: InputArgs,
        /// Metric for the heatmap, distribution and weekday charts
        #[arg(long)]
        focus: Option<String>,
        #[arg(long)]
        weekday: Option<u8>,
        #[arg(long)]
        tie_break: Option<String>,
    },
    /// Machine analysis view with anomaly severity and daily trend
    Analysis {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        machine: String,
        /// `/api/historical-anomalies` response
        #[arg(long)]
        anomalies: Option<PathBuf>,
        /// First day of the window (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Last day of the window (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Value distribution of one metric
    Histogram {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        metric: String,
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Mean value per weekday and hour
    Heatmap {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        metric: String,
    },
    /// One value per week for a weekday (0 = Sunday)
    Weekday {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        metric: String,
        #[arg(long)]
        weekday: Option<u8>,
        #[arg(long)]
        tie_break: Option<String>,
    },
    /// Machine status table with the latest stop of each machine
    Status {
        /// `/api/machine-status` response
        statuses: PathBuf,
        /// `/api/machine-stops` response
        #[arg(long)]
        stops: Option<PathBuf>,
        /// Reference instant for ongoing stops, RFC 3339
        #[arg(long)]
        now: Option<String>,
    },
    /// Chart colors of the configured metrics
    Colors {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Records as CSV, one column per metric
    ExportCsv {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Machine data file, stdin when absent
    file: Option<PathBuf>,
    /// Payload format: json or jsonl
    #[arg(long, default_value = "json")]
    parser: String,
    /// Date range token (24h, 7d, 30d, 90d, 1y)
    #[arg(long)]
    range: Option<String>,
    /// Comma separated metrics, the configured list when absent
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,
    /// Reference instant for date ranges, RFC 3339
    #[arg(long)]
    now: Option<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

struct Loaded {
    records: Vec<MetricRecord>,
    metrics: MetricSelection,
    range: DateRange,
    now: MachineDateTime,
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn load(input: &InputArgs, config: &MachineViewConfig) -> Result<Loaded> {
    let offset = config.utc_offset()?;
    let data = read_input(input.file.as_deref())?;
    let parser = get_parser_from_name(&input.parser)?;
    let parsed = parser
        .parse_records(&data, offset)
        .context("Failed to parse machine data")?;
    info!(
        "Loaded {} records ({} skipped)",
        parsed.records.len(),
        parsed.skipped
    );

    let metrics = if input.metrics.is_empty() {
        config.metric_selection()?
    } else {
        input
            .metrics
            .iter()
            .map(|name| MetricName::new(name.trim()))
            .collect::<machineview::error::Result<_>>()?
    };
    let range = match &input.range {
        Some(token) => DateRange::parse(token),
        None => config.date_range(),
    };
    Ok(Loaded {
        records: parsed.records,
        metrics,
        range,
        now: parse_now(input.now.as_deref())?,
    })
}

fn parse_now(value: Option<&str>) -> Result<MachineDateTime> {
    let now = match value {
        Some(value) => OffsetDateTime::parse(value, &Rfc3339)
            .with_context(|| format!("Invalid --now value: {}", value))?,
        None => OffsetDateTime::now_utc(),
    };
    Ok(MachineDateTime::from_offset_datetime(&now))
}

fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value, time::macros::format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("Invalid date: {}", value))
}

fn parse_tie_break(value: Option<&str>, config: &MachineViewConfig) -> Result<WeekTieBreak> {
    Ok(match value {
        Some(value) => value.parse()?,
        None => config.tie_break()?,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    load_configuration().context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;
    let offset = config.utc_offset()?;

    match cli.command {
        Commands::Dashboard {
            input,
            focus,
            weekday,
            tie_break,
        } => {
            let loaded = load(&input, &config)?;
            let mut params = DashboardParams::from_config(&config)?;
            params.range = loaded.range;
            params.metrics = loaded.metrics;
            if let Some(focus) = focus {
                let focus = MetricName::new(&focus)?;
                params.heatmap_metric = Some(focus.clone());
                params.distribution_metric = Some(focus.clone());
                params.weekday_metric = Some(focus);
            }
            if let Some(weekday) = weekday {
                params.weekday = weekday;
            }
            params.tie_break = parse_tie_break(tie_break.as_deref(), &config)?;

            let view = build_dashboard(&loaded.records, &params, loaded.now)?;
            print_json(&view)
        }
        Commands::Analysis {
            input,
            machine,
            anomalies,
            start,
            end,
        } => {
            let loaded = load(&input, &config)?;
            let report: AnomalyReport = match anomalies {
                Some(path) => {
                    let data = read_input(Some(&path))?;
                    serde_json::from_slice(&data).context("Failed to parse anomaly report")?
                }
                None => AnomalyReport::default(),
            };
            let mut params = AnalysisParams::from_config(machine, &config)?;
            if !input.metrics.is_empty() {
                params.metrics = loaded.metrics;
            }
            params.range = loaded.range;
            if let (Some(start), Some(end)) = (start, end) {
                params.window = Some(AnalysisWindow::new(parse_date(&start)?, parse_date(&end)?));
            }

            let view = build_analysis(&loaded.records, &report, &params, loaded.now)?;
            match input.output.format {
                OutputFormat::Json => print_json(&view),
                OutputFormat::Csv => {
                    print!("{}", CsvConverter::anomaly_trend_to_csv(&view.trend)?);
                    Ok(())
                }
            }
        }
        Commands::Histogram {
            input,
            metric,
            bins,
        } => {
            let loaded = load(&input, &config)?;
            let records = filter_by_date_range(&loaded.records, loaded.range, loaded.now, offset)?;
            let bins = match bins {
                Some(bins) => std::num::NonZeroUsize::new(bins)
                    .context("Histogram needs at least one bin")?,
                None => config.histogram_bins()?,
            };
            let histogram = metric_histogram(&records, &MetricName::new(&metric)?, bins);
            match input.output.format {
                OutputFormat::Json => print_json(&histogram),
                OutputFormat::Csv => {
                    print!("{}", CsvConverter::histogram_to_csv(&histogram)?);
                    Ok(())
                }
            }
        }
        Commands::Heatmap { input, metric } => {
            if input.output.format == OutputFormat::Csv {
                bail!("The heatmap is only available as JSON");
            }
            let loaded = load(&input, &config)?;
            let records = filter_by_date_range(&loaded.records, loaded.range, loaded.now, offset)?;
            print_json(&heatmap(&records, &MetricName::new(&metric)?, offset)?)
        }
        Commands::Weekday {
            input,
            metric,
            weekday,
            tie_break,
        } => {
            let loaded = load(&input, &config)?;
            let records = filter_by_date_range(&loaded.records, loaded.range, loaded.now, offset)?;
            let weekday = match weekday {
                Some(weekday) => weekday,
                None => config.weekday()?,
            };
            let points = weekday_series(
                &records,
                weekday,
                &MetricName::new(&metric)?,
                parse_tie_break(tie_break.as_deref(), &config)?,
                offset,
            )?;
            match input.output.format {
                OutputFormat::Json => print_json(&points),
                OutputFormat::Csv => {
                    print!("{}", CsvConverter::weekday_to_csv(&points)?);
                    Ok(())
                }
            }
        }
        Commands::Status {
            statuses,
            stops,
            now,
        } => {
            let response: MachineStatusResponse =
                serde_json::from_slice(&read_input(Some(&statuses))?)
                    .context("Failed to parse machine status")?;
            let stops = match stops {
                Some(path) => parse_machine_stops(&read_input(Some(&path))?)
                    .context("Failed to parse machine stops")?,
                None => Vec::new(),
            };
            let now = parse_now(now.as_deref())?;
            print_json(&machine_overview(&response, &stops, now, offset))
        }
        Commands::Colors { output } => {
            let palette = ColorPalette::for_metrics(&config.metric_selection()?);
            match output.format {
                OutputFormat::Json => print_json(&palette),
                OutputFormat::Csv => {
                    println!("metric,color");
                    for (metric, color) in palette.iter() {
                        println!("{},{}", metric, color);
                    }
                    Ok(())
                }
            }
        }
        Commands::ExportCsv { input } => {
            let loaded = load(&input, &config)?;
            let records = filter_by_date_range(&loaded.records, loaded.range, loaded.now, offset)?;
            print!(
                "{}",
                CsvConverter::records_to_csv(&records, &loaded.metrics, offset)?
            );
            Ok(())
        }
    }
}
