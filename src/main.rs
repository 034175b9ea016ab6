use anyhow::{Context, Result};
use cams_xirr::cli::{formatters, Cli};
use cams_xirr::{config, importers, reports};
use clap::Parser;
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so table/JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let app_config = config::load_config(cli.config.as_deref())?;
    let source = cli.statement_source()?;

    let statement = importers::load_statement(&source)?;
    let valuations = statement
        .valuation_set()
        .context("Statement has no usable market values")?;

    info!(
        "Computing XIRR over {} transactions and {} funds",
        statement.transactions.len(),
        valuations.len()
    );

    let report = reports::compute_returns(
        &statement.transactions,
        &valuations,
        &app_config.solver.to_solver_config(),
    )
    .context("Failed to build cash-flow series")?;

    if cli.json {
        println!("{}", formatters::format_report_json(&report, &app_config.display));
    } else {
        print!("{}", formatters::format_report_table(&report, &app_config.display));
    }

    Ok(())
}
