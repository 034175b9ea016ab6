use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{StatementError, XirrError};
use crate::models::{FundIdentity, Transaction};
use crate::returns::{assemble, xirr_with_config, SolverConfig, ValuationSet};

/// Outcome of solving one series. A failure stays a failure all the way to
/// the output; it is never shown as a number.
pub type RateOutcome = Result<f64, XirrError>;

#[derive(Debug, Clone)]
pub struct FundReturn {
    pub fund: FundIdentity,
    pub valuation_date: NaiveDate,
    pub market_value: Decimal,
    pub flow_count: usize,
    pub xirr: RateOutcome,
}

impl FundReturn {
    /// XIRR as a percentage, if the solver converged
    pub fn xirr_pct(&self) -> Option<f64> {
        self.xirr.as_ref().ok().map(|r| r * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct ReturnsReport {
    pub valuation_date: NaiveDate,
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_redeemed: Decimal,
    pub flow_count: usize,
    pub total_xirr: RateOutcome,
    pub funds: Vec<FundReturn>,
}

impl ReturnsReport {
    /// Portfolio XIRR as a percentage, if the solver converged
    pub fn total_xirr_pct(&self) -> Option<f64> {
        self.total_xirr.as_ref().ok().map(|r| r * 100.0)
    }

    /// Number of series (portfolio included) whose rate could not be found
    pub fn failed_count(&self) -> usize {
        let portfolio = usize::from(self.total_xirr.is_err());
        portfolio + self.funds.iter().filter(|f| f.xirr.is_err()).count()
    }
}

/// Assemble every series and solve each one independently.
///
/// Assembly errors (missing valuation, inconsistent totals) abort the run.
/// Solver errors are kept per series.
pub fn compute_returns(
    transactions: &[Transaction],
    valuations: &ValuationSet,
    config: &SolverConfig,
) -> Result<ReturnsReport, StatementError> {
    let assembled = assemble(transactions, valuations)?;

    let total_xirr = xirr_with_config(&assembled.portfolio, config);
    if let Err(ref e) = total_xirr {
        warn!("Portfolio XIRR failed: {}", e);
    }

    let funds = assembled
        .funds
        .iter()
        .map(|fs| {
            let xirr = xirr_with_config(&fs.series, config);
            if let Err(ref e) = xirr {
                warn!("XIRR failed for {}: {}", fs.fund, e);
            }
            FundReturn {
                fund: fs.fund.clone(),
                valuation_date: fs.valuation.date,
                market_value: fs.valuation.value,
                flow_count: fs.series.len(),
                xirr,
            }
        })
        .collect::<Vec<_>>();

    let total_invested: Decimal = transactions
        .iter()
        .filter(|tx| tx.is_purchase())
        .map(|tx| tx.amount)
        .sum();
    let total_redeemed: Decimal = transactions
        .iter()
        .filter(|tx| !tx.is_purchase())
        .map(|tx| -tx.amount)
        .sum();

    let report = ReturnsReport {
        valuation_date: assembled.portfolio_date,
        total_value: assembled.portfolio_value,
        total_invested,
        total_redeemed,
        flow_count: assembled.portfolio.len(),
        total_xirr,
        funds,
    };

    info!(
        "Computed returns for {} funds ({} series failed)",
        report.funds.len(),
        report.failed_count()
    );

    Ok(report)
}
