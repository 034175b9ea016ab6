// CAS PDF Parser - Extract transactions and market values from a
// consolidated account statement of mutual fund holdings.
//
// The statement lists, per scheme: a scheme name line, the folio number,
// an ISIN line, the transaction rows and a closing "Market Value on" line.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::StatementError;
use crate::models::{FundIdentity, Transaction, ValuationPoint};
use crate::returns::ValuationSet;

const DATE_FORMAT: &str = "%d-%b-%Y";

/// Typed records read from one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    /// Sorted by date; rows on the same date keep statement order.
    pub transactions: Vec<Transaction>,
    /// In statement order.
    pub valuations: Vec<ValuationPoint>,
}

impl Statement {
    pub fn valuation_set(&self) -> Result<ValuationSet, StatementError> {
        ValuationSet::new(self.valuations.iter().cloned())
    }

    pub fn total_market_value(&self) -> Decimal {
        self.valuations.iter().map(|v| v.value).sum()
    }
}

/// Compiled line patterns; built once per statement.
struct LinePatterns {
    fund_name: Regex,
    folio: Regex,
    isin: Regex,
    market_value: Regex,
    transaction: Regex,
}

impl LinePatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // "B205RG-Aditya Birla Sun Life Frontline Equity Fund - Growth ..."
            fund_name: Regex::new(r"(?i)^([a-z0-9]{3,})-(.*?FUND)")?,
            // "Folio No: 1234567 / 89  PAN: ..."
            folio: Regex::new(r"(?i)^Folio No:(\s\d+)(?:\s.*)")?,
            // "... ISIN: INF209K01YN0(Advisor: ARN-0000) Registrar : CAMS"
            isin: Regex::new(r"(?i)^(.*)(ISIN.+?)(.*?)(?:Reg|\()")?,
            market_value: Regex::new(
                r"Market Value on (\d{2}-[A-Za-z]{3}-\d{4}): INR ([\d,]+\.\d{2})",
            )?,
            // date, description, amount, units, price, unit balance
            transaction: Regex::new(
                r"^(\d{2}-\w{3}-\d{4})\s(.+?)\s([\d(]+[,.]\d+[.\d)]+)\s([\d(,.)]+)\s([\d,.]+)\s([\d,.]+)",
            )?,
        })
    }
}

/// What a single line contributed.
#[derive(Debug, Clone, PartialEq)]
enum LineRecord {
    Transaction(Transaction),
    Valuation(ValuationPoint),
}

/// Scheme context carried forward from line to line.
#[derive(Debug, Clone, Default, PartialEq)]
struct ScanState {
    fund: Option<FundIdentity>,
    folio: Option<String>,
    isin: Option<String>,
}

impl ScanState {
    /// Update the context from `line` and return the record it holds, if any.
    fn feed(
        &mut self,
        patterns: &LinePatterns,
        line_no: usize,
        line: &str,
    ) -> Result<Option<LineRecord>, StatementError> {
        if let Some(m) = patterns.fund_name.find(line) {
            self.fund = FundIdentity::new(m.as_str());
        }
        if let Some(caps) = patterns.folio.captures(line) {
            self.folio = caps.get(1).map(|m| m.as_str().trim().to_string());
        }
        if let Some(caps) = patterns.isin.captures(line) {
            self.isin = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
        }

        if let Some(caps) = patterns.market_value.captures(line) {
            let fund = self.current_fund(line_no, "market value")?;
            let date = parse_date(&caps[1], line_no)?;
            let value = parse_amount(&caps[2], line_no)?;
            return Ok(Some(LineRecord::Valuation(ValuationPoint { fund, date, value })));
        }

        if let Some(caps) = patterns.transaction.captures(line) {
            let fund = self.current_fund(line_no, "transaction")?;
            let date = parse_date(&caps[1], line_no)?;
            return Ok(Some(LineRecord::Transaction(Transaction {
                fund,
                folio: self.folio.clone(),
                isin: self.isin.clone(),
                date,
                description: caps[2].trim().to_string(),
                amount: parse_amount(&caps[3], line_no)?,
                units: Some(parse_amount(&caps[4], line_no)?),
                price: Some(parse_amount(&caps[5], line_no)?),
                unit_balance: Some(parse_amount(&caps[6], line_no)?),
            })));
        }

        Ok(None)
    }

    fn current_fund(&self, line_no: usize, what: &str) -> Result<FundIdentity, StatementError> {
        self.fund.clone().ok_or_else(|| StatementError::Parse {
            line: line_no,
            reason: format!("{} line appears before any fund name", what),
        })
    }
}

fn parse_date(s: &str, line_no: usize) -> Result<NaiveDate, StatementError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| StatementError::Parse {
        line: line_no,
        reason: format!("invalid date '{}': {}", s, e),
    })
}

/// Parse a statement number: thousands separators are dropped and a value
/// in parentheses is negative ("(1,234.50)" -> -1234.50).
pub fn parse_amount(s: &str, line_no: usize) -> Result<Decimal, StatementError> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != ')')
        .map(|c| if c == '(' { '-' } else { c })
        .collect();

    Decimal::from_str(&cleaned).map_err(|e| StatementError::Parse {
        line: line_no,
        reason: format!("invalid amount '{}': {}", s, e),
    })
}

/// Parse already-extracted statement text.
pub fn parse_statement_text(text: &str) -> Result<Statement, StatementError> {
    let patterns = LinePatterns::new().map_err(|e| StatementError::Parse {
        line: 0,
        reason: format!("invalid line pattern: {}", e),
    })?;

    let mut state = ScanState::default();
    let mut statement = Statement::default();

    for (idx, line) in text.lines().enumerate() {
        match state.feed(&patterns, idx + 1, line)? {
            Some(LineRecord::Transaction(tx)) => {
                debug!(fund = %tx.fund, date = %tx.date, amount = %tx.amount, "transaction");
                statement.transactions.push(tx);
            }
            Some(LineRecord::Valuation(v)) => {
                debug!(fund = %v.fund, date = %v.date, value = %v.value, "market value");
                statement.valuations.push(v);
            }
            None => {}
        }
    }

    statement.transactions.sort_by_key(|tx| tx.date);

    info!(
        "Extracted {} transactions and {} market values",
        statement.transactions.len(),
        statement.valuations.len()
    );
    if statement.valuations.is_empty() {
        warn!("No market values found. Check that this is a CAS statement.");
    }

    Ok(statement)
}

/// Decrypt and parse a password-protected CAS PDF
pub fn read_statement_pdf<P: AsRef<Path>>(path: P, password: &str) -> Result<Statement> {
    let path = path.as_ref();
    info!("Parsing CAS PDF: {:?}", path);

    let text = pdf_extract::extract_text_encrypted(path, password)
        .context("Failed to extract text from PDF (wrong password?)")?;

    parse_statement_text(&text).with_context(|| format!("Failed to parse {:?}", path))
}

/// Parse a statement whose text was extracted beforehand
pub fn read_statement_text<P: AsRef<Path>>(path: P) -> Result<Statement> {
    let path = path.as_ref();
    info!("Parsing CAS text: {:?}", path);

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read statement text {:?}", path))?;

    parse_statement_text(&text).with_context(|| format!("Failed to parse {:?}", path))
}
