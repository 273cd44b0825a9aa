//! Sales dashboard CLI
//!
//! Loads a superstore CSV and prints dashboard render passes, sidebar year
//! options and ad-hoc aggregations as text or JSON.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sales_dashboard::processor::query_builder::QueryResult;
use sales_dashboard::processor::schema::{KeyField, NumericField};
use sales_dashboard::{
    AggregateOp, DashboardConfig, ParseSummary, SalesTable, YearOptions, YearSelection,
    build_report,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(version)]
#[command(about = "Aggregate a superstore sales CSV into dashboard data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct DataArgs {
    /// CSV dataset, overrides the configured one
    #[arg(short, long, env = "SALES_DASHBOARD_DATA", value_name = "FILE")]
    data: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one dashboard render pass
    Report {
        #[command(flatten)]
        data: DataArgs,

        /// Year to show, or "all"
        #[arg(short, long)]
        year: Option<YearSelection>,

        /// Length of the product rankings
        #[arg(short, long)]
        top: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the year selector choices
    Years {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Run an ad-hoc aggregation
    Query {
        #[command(flatten)]
        data: DataArgs,

        /// Year to filter on, or "all"
        #[arg(short, long)]
        year: Option<YearSelection>,

        /// Comma-separated grouping columns (Year, Category, Product Name, Order ID)
        #[arg(short, long, value_delimiter = ',')]
        group_by: Vec<KeyField>,

        /// Column to aggregate (Sales, Profit, Days to ship)
        #[arg(short, long)]
        metric: NumericField,

        /// sum, count, avg, min or max
        #[arg(short, long, default_value = "sum")]
        op: AggregateOp,

        /// Keep only the largest groups
        #[arg(short, long)]
        top: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Load the dataset and report parse problems
    Validate {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Write the default configuration
    Init {
        /// Output file path, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins unless --verbose is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    match cli.command {
        Commands::Report {
            data,
            year,
            top,
            format,
        } => {
            if let Some(n) = top {
                config.top_n = n;
            }
            config.validate()?;
            let (table, _) = load_table(&config, data.data.as_deref())?;
            let selection = config.resolve_selection(&YearOptions::from_table(&table), year);
            let report = build_report(&table, selection, &config);
            match format {
                Format::Text => print!("{report}"),
                Format::Json => print_json(&report)?,
            }
        }
        Commands::Years { data, format } => {
            let (table, _) = load_table(&config, data.data.as_deref())?;
            let options = YearOptions::from_table(&table);
            let default = config.resolve_selection(&options, None);
            match format {
                Format::Text => {
                    for choice in options.choices() {
                        let marker = if choice == default { " (default)" } else { "" };
                        println!("{choice}{marker}");
                    }
                }
                Format::Json => print_json(&serde_json::json!({
                    "options": options.choices(),
                    "default": default,
                }))?,
            }
        }
        Commands::Query {
            data,
            year,
            group_by,
            metric,
            op,
            top,
            format,
        } => {
            let (table, _) = load_table(&config, data.data.as_deref())?;
            let mut query = table
                .query()
                .year(year.unwrap_or_default())
                .group_by_multi(group_by)
                .aggregate(metric, op);
            if let Some(n) = top {
                query = query.limit(n);
            }
            let result = query.execute()?;
            match format {
                Format::Text => print_query(&result, metric, op),
                Format::Json => print_json(&result)?,
            }
        }
        Commands::Validate { data, format } => {
            let (_, summary) = load_table(&config, data.data.as_deref())?;
            match format {
                Format::Text => print_summary(&summary),
                Format::Json => print_json(&summary)?,
            }
        }
        Commands::Init { output } => {
            let yaml = DashboardConfig::default().to_yaml()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Configuration written to {}", path.display());
                }
                None => print!("{yaml}"),
            }
        }
    }

    Ok(())
}

fn load_table(
    config: &DashboardConfig,
    data: Option<&Path>,
) -> anyhow::Result<(SalesTable, ParseSummary)> {
    let path = data.unwrap_or(config.dataset.as_path());
    SalesTable::load_csv(path, &config.load)
        .with_context(|| format!("failed to load dataset {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_query(result: &QueryResult, metric: NumericField, op: AggregateOp) {
    match result {
        QueryResult::Aggregate(value) => println!("{op}({metric}) = {value}"),
        QueryResult::GroupBy(rows) => {
            for row in rows {
                let keys: Vec<String> = row.keys.iter().map(ToString::to_string).collect();
                println!("{:<60} {:>14.2}", keys.join(" | "), row.value);
            }
        }
    }
}

fn print_summary(summary: &ParseSummary) {
    println!("Rows loaded:  {}", summary.rows_loaded);
    println!("Rows skipped: {}", summary.rows_skipped);
    for e in &summary.errors {
        if e.column.is_empty() {
            println!("  line {}: {}", e.line, e.error);
        } else {
            println!("  line {}: {} = {:?}: {}", e.line, e.column, e.value, e.error);
        }
    }
}
