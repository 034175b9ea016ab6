use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping key for one holding: the scheme name line of the statement
/// (e.g. `B205RG-Aditya Birla Sun Life Frontline Equity Fund`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundIdentity(String);

impl FundIdentity {
    /// Returns None for blank names.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Label used for the aggregate series.
    pub fn portfolio() -> Self {
        Self("Portfolio".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FundIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dated, signed amount.
///
/// Negative amounts are money the investor put in, positive amounts are
/// money returned or the current value of the holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self { date, amount }
    }
}

/// Cash flows of one fund or of the whole portfolio, ready for the solver.
///
/// The flows are kept in date order and cannot be changed once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowSeries {
    flows: Vec<CashFlow>,
}

impl CashFlowSeries {
    /// Builds a series, ordering the flows by date. The sort is stable so
    /// an entry pushed last stays last among flows on the same day.
    pub fn new(mut flows: Vec<CashFlow>) -> Self {
        flows.sort_by_key(|cf| cf.date);
        Self { flows }
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Time origin of the series (earliest date).
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.flows.first().map(|cf| cf.date)
    }

    /// The closing valuation entry.
    pub fn terminal(&self) -> Option<&CashFlow> {
        self.flows.last()
    }

    /// Undiscounted sum of all amounts.
    pub fn total(&self) -> Decimal {
        self.flows.iter().map(|cf| cf.amount).sum()
    }

    pub fn has_sign_change(&self) -> bool {
        let has_negative = self.flows.iter().any(|cf| cf.amount < Decimal::ZERO);
        let has_positive = self.flows.iter().any(|cf| cf.amount > Decimal::ZERO);
        has_negative && has_positive
    }
}

/// Current market value of a holding as printed on the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub fund: FundIdentity,
    pub date: NaiveDate,
    pub value: Decimal,
}

/// One transaction row of the statement.
///
/// `amount` is the "amount paid" column: positive for purchases, negative
/// for redemptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub fund: FundIdentity,
    pub folio: Option<String>,
    pub isin: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub units: Option<Decimal>,
    pub price: Option<Decimal>,
    pub unit_balance: Option<Decimal>,
}

impl Transaction {
    /// Transaction carrying only what the return calculation needs.
    pub fn new(fund: FundIdentity, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            fund,
            folio: None,
            isin: None,
            date,
            description: String::new(),
            amount,
            units: None,
            price: None,
            unit_balance: None,
        }
    }

    pub fn is_purchase(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}
