//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of currency amounts and rates throughout the application.

use rust_decimal::{Decimal, RoundingStrategy};

/// Formats a Decimal with `,` thousands separators and `.` as the decimal
/// point, rounded half away from zero, optionally prefixed by a currency
/// label.
///
/// # Examples
/// ```
/// use cams_xirr::utils::format_amount_with;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with(dec!(1234567.891), 2, Some("INR")), "INR 1,234,567.89");
/// assert_eq!(format_amount_with(dec!(-500), 0, None), "-500");
/// ```
pub fn format_amount_with(value: Decimal, decimals: u32, currency: Option<&str>) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.*}", decimals as usize, rounded.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let number = match decimal_part {
        Some(d) => format!("{}{}.{}", sign, with_separators, d),
        None => format!("{}{}", sign, with_separators),
    };

    match currency {
        Some(label) if !label.is_empty() => format!("{} {}", label, number),
        _ => number,
    }
}

/// Format a percentage value (already multiplied by 100): "12.34%"
///
/// # Examples
/// ```
/// use cams_xirr::utils::format_percent;
///
/// assert_eq!(format_percent(12.3456, 2), "12.35%");
/// assert_eq!(format_percent(-0.5, 1), "-0.5%");
/// ```
pub fn format_percent(pct: f64, decimals: u32) -> String {
    format!("{:.*}%", decimals as usize, pct)
}

/// Round a rate to `decimals` places for display and JSON output
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
