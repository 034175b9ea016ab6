// Import module - CAS statement readers

pub mod cas_pdf;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub use cas_pdf::{
    parse_amount, parse_statement_text, read_statement_pdf, read_statement_text, Statement,
};

/// Where a statement comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementSource {
    /// Encrypted CAS PDF
    Pdf { path: PathBuf, password: String },
    /// Text already extracted from a CAS PDF
    Text { path: PathBuf },
}

impl StatementSource {
    pub fn path(&self) -> &Path {
        match self {
            StatementSource::Pdf { path, .. } | StatementSource::Text { path } => path,
        }
    }
}

/// Read a statement from its source
pub fn load_statement(source: &StatementSource) -> Result<Statement> {
    let path = source.path();
    if !path.exists() {
        return Err(anyhow!("Statement file not found: {:?}", path));
    }

    info!("Loading statement from {:?}", path);

    match source {
        StatementSource::Pdf { path, password } => read_statement_pdf(path, password),
        StatementSource::Text { path } => read_statement_text(path),
    }
}
