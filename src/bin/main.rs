//! Pivotal CLI - pivot and cohort-group JSON rows through the embedded engine
//!
//! Usage:
//!   pivotal pivot --input <rows.json> --rows <a,b> --columns <c> --value <v> [--agg <agg>]
//!   pivotal sql --input <rows.json> --rows <a,b> --columns <c> --value <v> [--agg <agg>]
//!   pivotal cohort --input <rows.json> --cohort-on <expr> [--trace <config.json>]
//!   pivotal infer --input <rows.json>
//!
//! Examples:
//!   pivotal pivot --input sales.json --rows category --columns region --value sales
//!   pivotal cohort --input sales.json --cohort-on 'column(region)'
//!   RUST_LOG=debug pivotal infer --input sales.json

use clap::{Args, Parser, Subcommand, ValueEnum};
use pivotal::config::Settings;
use pivotal::dataset::{records_from_json, Dataset, Record};
use pivotal::engine::{EngineHandle, SqliteProvider};
use pivotal::inference::{SamplingStrategy, TypeSampler};
use pivotal::pivot::{plan_pivot, AggregateFunc, PivotOptions, PivotRequest};
use pivotal::PivotSession;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pivotal")]
#[command(about = "Pivotal - pivot and cohort grouping over an embedded SQL engine")]
#[command(version)]
struct Cli {
    /// Path to a pivotal.toml (defaults to the usual search locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load rows and print the pivot result as JSON
    Pivot(PivotArgs),

    /// Load rows and print the compiled pivot SQL without running it
    Sql(PivotArgs),

    /// Group rows into cohorts and print one trace per cohort
    Cohort {
        /// JSON file holding an array of row objects
        #[arg(short, long)]
        input: PathBuf,

        /// Cohort expression: ?{sql}, column(name), a quoted literal or a column name
        #[arg(long)]
        cohort_on: Option<String>,

        /// JSON trace configuration merged into every cohort
        #[arg(long)]
        trace: Option<PathBuf>,
    },

    /// Print the inferred column types
    Infer {
        /// JSON file holding an array of row objects
        #[arg(short, long)]
        input: PathBuf,

        /// Sampling strategy (overrides the config file)
        #[arg(long)]
        strategy: Option<StrategyArg>,
    },
}

#[derive(Args)]
struct PivotArgs {
    /// JSON file holding an array of row objects
    #[arg(short, long)]
    input: PathBuf,

    /// Row fields, comma separated
    #[arg(long, value_delimiter = ',')]
    rows: Vec<String>,

    /// Column fields, comma separated
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Value field to aggregate
    #[arg(long)]
    value: String,

    /// Aggregate function
    #[arg(long, default_value = "sum")]
    agg: AggArg,
}

impl PivotArgs {
    fn request(&self) -> PivotRequest {
        PivotRequest::new(self.rows.clone(), self.columns.clone())
            .value(self.value.clone())
            .aggregate(self.agg.into())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AggArg {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl From<AggArg> for AggregateFunc {
    fn from(arg: AggArg) -> Self {
        match arg {
            AggArg::Sum => AggregateFunc::Sum,
            AggArg::Avg => AggregateFunc::Avg,
            AggArg::Min => AggregateFunc::Min,
            AggArg::Max => AggregateFunc::Max,
            AggArg::Count => AggregateFunc::Count,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Striped,
    Random,
}

impl From<StrategyArg> for SamplingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Striped => SamplingStrategy::Striped,
            StrategyArg::Random => SamplingStrategy::Random,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Pivot(args) => runtime.block_on(cmd_pivot(&settings, args)),
        Commands::Sql(args) => runtime.block_on(cmd_sql(&settings, args)),
        Commands::Cohort {
            input,
            cohort_on,
            trace,
        } => runtime.block_on(cmd_cohort(&settings, input, cohort_on, trace)),
        Commands::Infer { input, strategy } => cmd_infer(&settings, input, strategy),
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in '{}': {}", path.display(), e))
}

fn read_rows(path: &Path) -> Result<Vec<Record>, String> {
    read_json(path).map(records_from_json)
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Start the engine and load `rows` into the pivot table.
async fn start_and_load(session: &PivotSession, rows: &[Record]) -> Result<EngineHandle, String> {
    let engine = session
        .initialize_engine(None)
        .await
        .map_err(|e| format!("Engine error: {}", e))?;

    let summary = session
        .load_rows(&engine, rows)
        .await
        .map_err(|e| format!("Load error: {}", e))?;
    if summary.error_rows > 0 {
        eprintln!(
            "Warning: {} of {} rows failed to load",
            summary.error_rows,
            summary.total_rows()
        );
    }
    Ok(engine)
}

async fn cmd_pivot(settings: &Settings, args: PivotArgs) -> ExitCode {
    let rows = match read_rows(&args.input) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = PivotSession::from_settings(Arc::new(SqliteProvider::new()), settings);
    let engine = match start_and_load(&session, &rows).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = session.compile_pivot(Some(&engine), &args.request()).await;
    session.cleanup(Some(engine)).await;

    match result {
        Ok(Some(pivot)) => print_json(&pivot),
        Ok(None) => {
            eprintln!("Nothing to pivot: --rows, --columns and --value are all required");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Pivot error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_sql(settings: &Settings, args: PivotArgs) -> ExitCode {
    let rows = match read_rows(&args.input) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = PivotSession::from_settings(Arc::new(SqliteProvider::new()), settings);
    let engine = match start_and_load(&session, &rows).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = PivotOptions::from_settings(settings);
    let plan = plan_pivot(Some(&engine), &args.request(), &options).await;
    session.cleanup(Some(engine)).await;

    match plan {
        Ok(Some(plan)) => {
            println!("-- Pivotal compiled SQL");
            println!("-- Dialect: {}", plan.dialect);
            println!("-- Pivot columns: {}", plan.groups.len());
            println!();
            println!("{}", plan.to_sql());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("Nothing to pivot: --rows, --columns and --value are all required");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Pivot error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_cohort(
    settings: &Settings,
    input: PathBuf,
    cohort_on: Option<String>,
    trace: Option<PathBuf>,
) -> ExitCode {
    let rows = match read_rows(&input) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let trace_config = match trace {
        Some(path) => match read_json(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let session = PivotSession::from_settings(Arc::new(SqliteProvider::new()), settings);
    if cohort_on.is_some() {
        if let Err(e) = session.initialize_engine(None).await {
            eprintln!("Warning: engine unavailable, rows left ungrouped: {}", e);
        }
    }

    let result = session.group_by_cohort(&rows, cohort_on.as_deref()).await;
    session.cleanup(None).await;

    match trace_config {
        Some(config) => print_json(&result.into_traces(&config)),
        None => print_json(&result),
    }
}

fn cmd_infer(settings: &Settings, input: PathBuf, strategy: Option<StrategyArg>) -> ExitCode {
    let rows = match read_rows(&input) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut inference = settings.inference.clone();
    if let Some(strategy) = strategy {
        inference.strategy = strategy.into();
    }

    let sampler = TypeSampler::from_settings(&inference);
    let schema = sampler.infer_schema(&Dataset::from_records(&rows));
    print_json(&schema)
}
