//! Cash-flow assembly: statement transactions and valuations -> solver series.
//!
//! Statement amounts are "amount paid", so they are negated here: purchases
//! become negative flows and redemptions positive ones. Every series is
//! closed with its terminal valuation.

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::StatementError;
use crate::models::{CashFlow, CashFlowSeries, FundIdentity, Transaction, ValuationPoint};

/// Terminal valuations keyed by fund, in statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSet {
    points: Vec<ValuationPoint>,
    index: HashMap<FundIdentity, usize>,
}

impl ValuationSet {
    /// Builds the set, merging repeated entries for the same fund (one scheme
    /// held in several folios) by summing their values.
    pub fn new(points: impl IntoIterator<Item = ValuationPoint>) -> Result<Self, StatementError> {
        let mut merged: Vec<ValuationPoint> = Vec::new();
        let mut index = HashMap::new();

        for point in points {
            if point.value < Decimal::ZERO {
                return Err(StatementError::NegativeValuation {
                    fund: point.fund,
                    value: point.value,
                });
            }

            match index.get(&point.fund) {
                Some(&i) => {
                    let existing: &mut ValuationPoint = &mut merged[i];
                    if existing.date != point.date {
                        return Err(StatementError::InconsistentValuationDates {
                            fund: point.fund,
                            first: existing.date,
                            second: point.date,
                        });
                    }
                    debug!(fund = %point.fund, value = %point.value, "merging repeated valuation");
                    existing.value += point.value;
                }
                None => {
                    index.insert(point.fund.clone(), merged.len());
                    merged.push(point);
                }
            }
        }

        if merged.is_empty() {
            return Err(StatementError::NoValuations);
        }

        Ok(Self {
            points: merged,
            index,
        })
    }

    pub fn get(&self, fund: &FundIdentity) -> Option<&ValuationPoint> {
        self.index.get(fund).map(|&i| &self.points[i])
    }

    /// Like [`get`](Self::get), but a missing fund is a lookup failure.
    pub fn require(&self, fund: &FundIdentity) -> Result<&ValuationPoint, StatementError> {
        self.get(fund)
            .ok_or_else(|| StatementError::MissingValuation { fund: fund.clone() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValuationPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the first-listed valuation; used to close the portfolio series.
    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn total_value(&self) -> Decimal {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// A fund and its closed cash-flow series.
#[derive(Debug, Clone, PartialEq)]
pub struct FundSeries {
    pub fund: FundIdentity,
    pub valuation: ValuationPoint,
    pub series: CashFlowSeries,
}

/// Everything the solver needs for one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSeries {
    pub portfolio_value: Decimal,
    pub portfolio_date: NaiveDate,
    pub portfolio: CashFlowSeries,
    pub funds: Vec<FundSeries>,
}

fn close_series<'a>(
    label: &FundIdentity,
    transactions: impl Iterator<Item = &'a Transaction>,
    terminal_value: Decimal,
    terminal_date: NaiveDate,
) -> Result<CashFlowSeries, StatementError> {
    if terminal_value < Decimal::ZERO {
        return Err(StatementError::NegativeValuation {
            fund: label.clone(),
            value: terminal_value,
        });
    }

    let mut flows = Vec::new();
    for tx in transactions {
        if tx.date > terminal_date {
            return Err(StatementError::TransactionAfterValuation {
                fund: tx.fund.clone(),
                date: tx.date,
                valuation_date: terminal_date,
            });
        }
        flows.push(CashFlow::new(tx.date, -tx.amount));
    }
    flows.push(CashFlow::new(terminal_date, terminal_value));

    Ok(CashFlowSeries::new(flows))
}

/// Series for the whole portfolio: every transaction negated, closed by the
/// total market value on `terminal_date`.
pub fn build_portfolio_series(
    transactions: &[Transaction],
    terminal_value: Decimal,
    terminal_date: NaiveDate,
) -> Result<CashFlowSeries, StatementError> {
    close_series(
        &FundIdentity::portfolio(),
        transactions.iter(),
        terminal_value,
        terminal_date,
    )
}

/// Series for one fund: its transactions negated, closed by its own valuation.
pub fn build_fund_series(
    fund: &FundIdentity,
    transactions: &[Transaction],
    terminal_value: Decimal,
    terminal_date: NaiveDate,
) -> Result<CashFlowSeries, StatementError> {
    close_series(
        fund,
        transactions.iter().filter(|tx| &tx.fund == fund),
        terminal_value,
        terminal_date,
    )
}

/// Checks that the fund terminals add up to the portfolio terminal.
pub fn verify_terminal_consistency(
    portfolio: &CashFlowSeries,
    funds: &[FundSeries],
) -> Result<(), StatementError> {
    let portfolio_value = portfolio
        .terminal()
        .map(|cf| cf.amount)
        .unwrap_or(Decimal::ZERO);
    let funds_value: Decimal = funds
        .iter()
        .filter_map(|f| f.series.terminal())
        .map(|cf| cf.amount)
        .sum();

    if portfolio_value != funds_value {
        return Err(StatementError::ValuationMismatch {
            portfolio: portfolio_value,
            funds: funds_value,
        });
    }
    Ok(())
}

/// Builds the portfolio series and one series per fund.
///
/// Funds appear in the order they first show up in `transactions`, followed
/// by funds that only have a valuation. A transaction whose fund has no
/// valuation aborts the whole assembly.
pub fn assemble(
    transactions: &[Transaction],
    valuations: &ValuationSet,
) -> Result<AssembledSeries, StatementError> {
    let traded: Vec<&FundIdentity> = transactions.iter().map(|tx| &tx.fund).unique().collect();
    for fund in &traded {
        valuations.require(fund)?;
    }

    let valuation_only = valuations
        .iter()
        .map(|p| &p.fund)
        .filter(|fund| !traded.contains(fund));

    let mut funds = Vec::new();
    for fund in traded.iter().copied().chain(valuation_only) {
        let valuation = valuations.require(fund)?;
        let series = build_fund_series(fund, transactions, valuation.value, valuation.date)?;
        debug!(fund = %fund, flows = series.len(), "assembled fund series");
        funds.push(FundSeries {
            fund: fund.clone(),
            valuation: valuation.clone(),
            series,
        });
    }

    let portfolio_value = valuations.total_value();
    let portfolio_date = valuations.first_date();
    let portfolio = build_portfolio_series(transactions, portfolio_value, portfolio_date)?;

    verify_terminal_consistency(&portfolio, &funds)?;

    info!(
        "Assembled portfolio series with {} flows and {} fund series",
        portfolio.len(),
        funds.len()
    );

    Ok(AssembledSeries {
        portfolio_value,
        portfolio_date,
        portfolio,
        funds,
    })
}
