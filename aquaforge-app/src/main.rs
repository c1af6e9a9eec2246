use anyhow::{Context, Result};
use aquaforge_core::simulation::{builder::LiveSimulatorBuilder, state::HistoryBuffer};
use clap::{Parser, Subcommand};
use std::time::Duration;

mod config;
mod dashboard;
mod logging;
mod plotting;
mod production;
mod report;
mod workflow;

use config::{FarmTables, Settings};
use dashboard::{CancellationToken, DashboardSession};
use production::ProductionFilter;

#[derive(Parser, Debug)]
#[command(
    name = "aquaforge",
    version,
    about = "Aquaponic telemetry simulator and threshold reporter"
)]
struct Cli {
    /// Settings file (YAML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Seed for every random source; overrides the settings file.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the historical telemetry CSV.
    Simulate {
        /// Number of readings; overrides the settings file.
        #[arg(long)]
        records: Option<usize>,
    },
    /// Evaluate the telemetry CSV and write the adjustments workbook.
    Evaluate,
    /// Summarise the adjustments workbook written by `evaluate`.
    Show,
    /// Write the parameter decision workbook.
    Decisions,
    /// Simulate, evaluate and write both workbooks.
    Run,
    /// Live dashboard; runs until Ctrl-C or the tick limit.
    Dashboard {
        #[arg(long)]
        ticks: Option<u64>,
        /// Seconds between updates; overrides the settings file.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Historical production view.
    Production {
        #[arg(long)]
        year: Option<i64>,
        #[arg(long)]
        month: Option<i64>,
        /// Production type to include; repeat for several. All types when omitted.
        #[arg(long = "tipo")]
        kinds: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    let tables = FarmTables::load(&settings.tables_dir)?;

    println!("--- Aquaforge ---");
    match cli.command {
        Command::Simulate { records } => {
            if let Some(records) = records {
                settings.batch.records = records;
            }
            workflow::run_batch_generation(&settings, &tables)?;
        }
        Command::Evaluate => {
            workflow::run_violation_report(&settings, &tables)?;
        }
        Command::Show => {
            workflow::show_adjustments(&settings)?;
        }
        Command::Decisions => workflow::run_decision_report(&settings, &tables)?,
        Command::Run => {
            workflow::run_pipeline(&settings, &tables)?;
            println!("\nEnd-to-end workflow complete.");
        }
        Command::Dashboard { ticks, interval } => {
            let secs = interval.unwrap_or(settings.live.interval_secs).max(1);
            run_dashboard(&settings, &tables, Duration::from_secs(secs), ticks).await?;
        }
        Command::Production { year, month, kinds } => {
            let filter = ProductionFilter { year, month, kinds };
            production::run_production_view(
                &settings.production.workbook,
                &settings.production.output_dir,
                &filter,
            )?;
        }
    }
    Ok(())
}

async fn run_dashboard(
    settings: &Settings,
    tables: &FarmTables,
    period: Duration,
    max_ticks: Option<u64>,
) -> Result<()> {
    let mut builder = LiveSimulatorBuilder::from_profile(&tables.live);
    if let Some(seed) = settings.seed {
        builder = builder.with_seed(seed);
    }
    let simulator = builder.build().context("Invalid live simulation profile")?;
    let history = HistoryBuffer::new(settings.live.history_capacity)?;
    let session = DashboardSession::new(simulator, history);

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    println!(
        "Live dashboard every {}s, writing to '{}' (Ctrl-C to stop)",
        period.as_secs(),
        settings.live.output_dir
    );
    let output_dir = settings.live.output_dir.clone();
    let summary =
        dashboard::run_live_dashboard(session, period, token, max_ticks, |frame, history| {
            dashboard::render_frame(&output_dir, frame, history)
        })
        .await?;

    println!(
        "\nSession closed after {} ticks ({} samples retained, {} to {}).",
        summary.ticks,
        summary.samples_retained,
        summary.first_timestamp.as_deref().unwrap_or("-"),
        summary.last_timestamp.as_deref().unwrap_or("-")
    );
    Ok(())
}
