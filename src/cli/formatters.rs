//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of return calculation from presentation.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::config::DisplaySettings;
use crate::reports::{RateOutcome, ReturnsReport};
use crate::utils::{format_amount_with, format_percent, round_to};

fn amount(display: &DisplaySettings, value: rust_decimal::Decimal) -> String {
    format_amount_with(value, display.decimals, Some(&display.currency))
}

fn colored_rate(display: &DisplaySettings, outcome: &RateOutcome) -> String {
    match outcome {
        Ok(rate) => {
            let text = format_percent(rate * 100.0, display.decimals);
            if *rate >= 0.0 {
                text.green().to_string()
            } else {
                text.red().to_string()
            }
        }
        Err(_) => "FAILED".red().bold().to_string(),
    }
}

/// Format a returns report for JSON output
pub fn format_report_json(report: &ReturnsReport, display: &DisplaySettings) -> String {
    #[derive(Serialize)]
    struct JsonFund {
        fund: String,
        valuation_date: String,
        market_value: String,
        cash_flows: usize,
        xirr_pct: Option<f64>,
        error: Option<String>,
    }

    #[derive(Serialize)]
    struct JsonReport {
        valuation_date: String,
        total_market_value: String,
        total_invested: String,
        total_redeemed: String,
        cash_flows: usize,
        total_xirr_pct: Option<f64>,
        total_xirr_error: Option<String>,
        funds: Vec<JsonFund>,
    }

    let dp = display.decimals;
    let funds = report
        .funds
        .iter()
        .map(|f| JsonFund {
            fund: f.fund.to_string(),
            valuation_date: f.valuation_date.to_string(),
            market_value: f.market_value.to_string(),
            cash_flows: f.flow_count,
            xirr_pct: f.xirr_pct().map(|p| round_to(p, dp)),
            error: f.xirr.as_ref().err().map(|e| e.to_string()),
        })
        .collect();

    let json_report = JsonReport {
        valuation_date: report.valuation_date.to_string(),
        total_market_value: report.total_value.to_string(),
        total_invested: report.total_invested.to_string(),
        total_redeemed: report.total_redeemed.to_string(),
        cash_flows: report.flow_count,
        total_xirr_pct: report.total_xirr_pct().map(|p| round_to(p, dp)),
        total_xirr_error: report.total_xirr.as_ref().err().map(|e| e.to_string()),
        funds,
    };

    serde_json::to_string_pretty(&json_report)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format a returns report for terminal output
pub fn format_report_table(report: &ReturnsReport, display: &DisplaySettings) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} {}\n",
        "Total Market Value:".bold(),
        amount(display, report.total_value)
    ));
    output.push_str(&format!(
        "{} {}\n",
        "Total XIRR:".bold(),
        colored_rate(display, &report.total_xirr)
    ));
    if let Err(e) = &report.total_xirr {
        output.push_str(&format!("  {} {}\n", "✗".red(), e));
    }

    if report.funds.is_empty() {
        return output;
    }

    output.push_str(&format!("\n{}\n\n", "Fund-wise XIRR:".cyan().bold()));

    #[derive(Tabled)]
    struct FundRow {
        #[tabled(rename = "Fund")]
        fund: String,
        #[tabled(rename = "Market Value")]
        market_value: String,
        #[tabled(rename = "XIRR (%)")]
        xirr: String,
    }

    let rows: Vec<FundRow> = report
        .funds
        .iter()
        .map(|f| FundRow {
            fund: f.fund.to_string(),
            market_value: amount(display, f.market_value),
            xirr: colored_rate(display, &f.xirr),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    let failures: Vec<String> = report
        .funds
        .iter()
        .filter_map(|f| f.xirr.as_ref().err().map(|e| format!("  {} {}: {}", "✗".red(), f.fund, e)))
        .collect();
    if !failures.is_empty() {
        output.push_str(&format!(
            "\n{} XIRR could not be computed for {} fund(s):\n",
            "⚠".yellow().bold(),
            failures.len()
        ));
        for line in failures {
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}
