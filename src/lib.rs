//! cams-xirr - annualized returns from mutual fund statements
//!
//! This library reads consolidated account statements (CAS), turns their
//! transactions and market values into dated cash-flow series, and computes
//! the XIRR of the whole portfolio and of every fund.

pub mod cli;
pub mod config;
pub mod error;
pub mod importers;
pub mod models;
pub mod reports;
pub mod returns;
pub mod utils;

pub use error::{StatementError, XirrError};
pub use models::{CashFlow, CashFlowSeries, FundIdentity, Transaction, ValuationPoint};
pub use reports::{compute_returns, ReturnsReport};
pub use returns::{xirr, xnpv};
