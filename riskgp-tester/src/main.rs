//! Stress and QA harness for the RISK: Global Power engine.
//!
//! Validates sequential throughput, concurrent session isolation, and
//! deterministic replay of both the setup pipeline and the consequence
//! extraction core.

mod report;
mod scenarios;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use report::ReportDocument;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// N isolated full-pipeline runs, timed
    Sequential,
    /// M pipelines at once in separate state dirs
    Concurrent,
    /// Pinned-seed replay, byte-compared artifacts
    Determinism,
    /// Everything above
    All,
}

#[derive(Debug, Parser)]
#[command(name = "riskgp-tester", version)]
#[command(about = "Stress testing for RISK: Global Power - throughput, concurrency, determinism")]
struct Args {
    /// Scenario to run
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Sequential runs
    #[arg(long, default_value_t = 20)]
    runs: usize,

    /// Concurrent sessions
    #[arg(long, default_value_t = 8)]
    sessions: usize,

    /// Seats per session
    #[arg(long, default_value_t = 4)]
    seats: u32,

    /// Also write the report as JSON to this path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut results = Vec::new();
    if matches!(args.scenario, Scenario::Sequential | Scenario::All) {
        results.push(scenarios::sequential(args.runs, args.seats));
    }
    if matches!(args.scenario, Scenario::Concurrent | Scenario::All) {
        results.push(scenarios::concurrent(args.sessions, args.seats).await);
    }
    if matches!(args.scenario, Scenario::Determinism | Scenario::All) {
        results.push(scenarios::determinism(args.seats));
    }

    let document = ReportDocument::new(results);
    document.print_console();
    if let Some(path) = &args.out {
        document.write_json(path)?;
        println!("Report written to {}", path.display());
    }

    if document.passed {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
