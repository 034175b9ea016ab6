//! Configuration loading
//!
//! Settings come from `--config <PATH>` when given, otherwise from
//! `<config dir>/cams-xirr/config.toml` if present, otherwise defaults.
//!
//! ```toml
//! [solver]
//! tolerance = 1.48e-8
//! max_iterations = 50
//!
//! [display]
//! currency = "INR"
//! decimals = 2
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::returns::solver::{SolverConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverSettings {
    pub fn to_solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.tolerance, self.max_iterations)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    /// Currency label printed before amounts
    pub currency: String,
    /// Decimal places for amounts and percentages
    pub decimals: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            decimals: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub solver: SolverSettings,
    pub display: DisplaySettings,
}

impl AppConfig {
    fn validate(self) -> Result<Self> {
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return Err(anyhow!(
                "solver.tolerance must be a positive number, got {}",
                self.solver.tolerance
            ));
        }
        if self.solver.max_iterations == 0 {
            return Err(anyhow!("solver.max_iterations must be at least 1"));
        }
        if self.display.decimals > 8 {
            return Err(anyhow!(
                "display.decimals must be at most 8, got {}",
                self.display.decimals
            ));
        }
        Ok(self)
    }
}

/// Parse configuration from TOML text
pub fn parse_config(text: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(text).context("Invalid configuration")?;
    config.validate()
}

/// Default config file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("cams-xirr").join("config.toml"))
}

/// Load configuration, falling back to defaults when no file exists.
///
/// An explicitly given path must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(AppConfig::default());
            }
        },
    };

    info!("Loading config from {:?}", path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    parse_config(&text).with_context(|| format!("Invalid config file {:?}", path))
}
