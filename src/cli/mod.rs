use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::importers::StatementSource;

pub mod formatters;

#[derive(Parser, Debug)]
#[command(name = "cams-xirr")]
#[command(version, about = "Compute XIRR from a CAS mutual fund statement")]
#[command(
    long_about = "Reads a password-protected consolidated account statement (CAS), extracts purchases, redemptions and current market values, and prints the annualized return (XIRR) of the whole portfolio and of every fund."
)]
pub struct Cli {
    /// Path to the CAS PDF
    #[arg(long, value_name = "PATH", conflicts_with = "text", requires = "password")]
    pub pdf: Option<PathBuf>,

    /// PDF password
    #[arg(long)]
    pub password: Option<String>,

    /// Path to statement text already extracted from a CAS PDF
    #[arg(long, value_name = "PATH")]
    pub text: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json")]
    pub json: bool,
}

impl Cli {
    /// Where to read the statement from
    pub fn statement_source(&self) -> Result<StatementSource> {
        match (&self.pdf, &self.password, &self.text) {
            (Some(path), Some(password), None) => Ok(StatementSource::Pdf {
                path: path.clone(),
                password: password.clone(),
            }),
            (None, _, Some(path)) => Ok(StatementSource::Text { path: path.clone() }),
            (Some(_), None, _) => Err(anyhow!("--pdf requires --password")),
            _ => Err(anyhow!("Provide a statement with --pdf <PATH> --password <PASSWORD> or --text <PATH>")),
        }
    }
}
