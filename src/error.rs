//! Error handling for cams-xirr
//!
//! Defines the typed errors of the statement pipeline and of the XIRR
//! solver. The importer and CLI layers wrap them with anyhow context.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::FundIdentity;

/// Errors raised while turning statement records into cash-flow series.
///
/// Every variant is fatal for the run: the portfolio total cannot be
/// trusted once any of these is hit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatementError {
    #[error("no valuation found for fund '{fund}'")]
    MissingValuation { fund: FundIdentity },

    #[error(
        "portfolio valuation {portfolio} does not match the sum of fund valuations {funds}"
    )]
    ValuationMismatch { portfolio: Decimal, funds: Decimal },

    #[error("transaction for '{fund}' on {date} is after the valuation date {valuation_date}")]
    TransactionAfterValuation {
        fund: FundIdentity,
        date: NaiveDate,
        valuation_date: NaiveDate,
    },

    #[error("valuation for '{fund}' is negative: {value}")]
    NegativeValuation { fund: FundIdentity, value: Decimal },

    #[error("fund '{fund}' is valued on both {first} and {second}")]
    InconsistentValuationDates {
        fund: FundIdentity,
        first: NaiveDate,
        second: NaiveDate,
    },

    #[error("statement contains no market valuations")]
    NoValuations,

    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Reasons the XIRR root-finder could not produce a rate for a series.
///
/// These are recoverable per series: the report keeps going for the other
/// funds and marks this one as failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XirrError {
    #[error("at least two cash flows are required, got {count}")]
    TooFewCashFlows { count: usize },

    #[error("cash flows never change sign, no rate exists")]
    NoSignChange,

    #[error("derivative vanished at rate {rate}")]
    DerivativeVanished { rate: f64 },

    #[error("no convergence after {iterations} iterations (last rate {last_rate})")]
    NoConvergence { iterations: u32, last_rate: f64 },
}
