//! XNPV and XIRR for irregular cash flows.
//!
//! Discounting uses actual days / 365.0 from the earliest date of the
//! series. XIRR runs Newton's method with the analytic derivative from a
//! fixed starting guess of 10%, so a given series always yields the same
//! rate. Once two trial rates straddle the root, steps that leave that
//! bracket or stall fall back to bisection.

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, trace};

use crate::error::XirrError;
use crate::models::CashFlowSeries;

/// Starting rate for the root-finder.
pub const INITIAL_GUESS: f64 = 0.10;

/// Day-count denominator (actual/365, no leap-year adjustment).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Default step tolerance for convergence.
pub const DEFAULT_TOLERANCE: f64 = 1.48e-8;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Once the root is bracketed, a Newton step that fails to cut the NPV by at
/// least this factor is replaced by bisection.
const STALL_RATIO: f64 = 0.5;

const MIN_DERIVATIVE: f64 = 1e-15;

/// Convergence limits of the root-finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Stop once a Newton step moves the rate by less than this.
    pub tolerance: f64,
    /// Give up after this many Newton steps.
    pub max_iterations: u32,
}

impl SolverConfig {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_MAX_ITERATIONS)
    }
}

/// (year fraction from the origin, amount) pairs
fn discount_points(series: &CashFlowSeries) -> Vec<(f64, f64)> {
    let Some(origin) = series.flows().iter().map(|cf| cf.date).min() else {
        return Vec::new();
    };

    series
        .flows()
        .iter()
        .map(|cf| {
            let years = (cf.date - origin).num_days() as f64 / DAYS_PER_YEAR;
            (years, cf.amount.to_f64().unwrap_or(f64::NAN))
        })
        .collect()
}

fn npv_at(points: &[(f64, f64)], rate: f64) -> f64 {
    if rate <= -1.0 {
        return f64::INFINITY;
    }
    points
        .iter()
        .map(|(years, amount)| amount / (1.0 + rate).powf(*years))
        .sum()
}

/// d/dr [amount * (1+r)^(-t)] = -t * amount * (1+r)^(-t-1)
fn npv_derivative_at(points: &[(f64, f64)], rate: f64) -> f64 {
    points
        .iter()
        .map(|(years, amount)| -years * amount * (1.0 + rate).powf(-years - 1.0))
        .sum()
}

/// Net present value of `series` at `rate`.
///
/// Returns positive infinity for `rate <= -1.0`, where the discount base
/// is zero or negative. The root-finder treats that value as "rate too
/// extreme" and steps back.
pub fn xnpv(rate: f64, series: &CashFlowSeries) -> f64 {
    npv_at(&discount_points(series), rate)
}

/// Annualized rate making the XNPV of `series` zero, with the default
/// tolerance and iteration cap.
///
/// # Examples
/// ```
/// use cams_xirr::models::{CashFlow, CashFlowSeries};
/// use cams_xirr::returns::xirr;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let series = CashFlowSeries::new(vec![
///     CashFlow::new(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), dec!(-100)),
///     CashFlow::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(110)),
/// ]);
/// let rate = xirr(&series).unwrap();
/// assert!((rate - 0.10).abs() < 1e-4);
/// ```
pub fn xirr(series: &CashFlowSeries) -> Result<f64, XirrError> {
    xirr_with_config(series, &SolverConfig::default())
}

/// Same as [`xirr`] with explicit convergence limits.
pub fn xirr_with_config(series: &CashFlowSeries, config: &SolverConfig) -> Result<f64, XirrError> {
    if series.len() < 2 {
        return Err(XirrError::TooFewCashFlows {
            count: series.len(),
        });
    }
    if !series.has_sign_change() {
        return Err(XirrError::NoSignChange);
    }

    let points = discount_points(series);
    let mut rate = INITIAL_GUESS;
    let mut bracket = Bracket::default();
    let mut last_residual = f64::INFINITY;

    for iteration in 0..config.max_iterations {
        let npv = npv_at(&points, rate);
        if !npv.is_finite() {
            return Err(XirrError::NoConvergence {
                iterations: iteration,
                last_rate: rate,
            });
        }
        bracket.record(rate, npv);

        let slope = npv_derivative_at(&points, rate);
        let step = npv / slope;
        let usable = slope.is_finite() && slope.abs() >= MIN_DERIVATIVE && step.is_finite();

        let next = match bracket.bounds() {
            Some((low, high)) => {
                let newton = rate - step;
                // Bisect when Newton leaves the bracket or stalls
                if !usable
                    || newton <= low
                    || newton >= high
                    || npv.abs() > STALL_RATIO * last_residual
                {
                    (low + high) / 2.0
                } else {
                    newton
                }
            }
            None if !usable => return Err(XirrError::DerivativeVanished { rate }),
            None => step_into_domain(rate, step),
        };

        trace!(iteration, rate, npv, slope, next, "solver step");

        if (next - rate).abs() < config.tolerance {
            debug!(iterations = iteration + 1, rate = next, "xirr converged");
            return Ok(next);
        }
        last_residual = npv.abs();
        rate = next;
    }

    Err(XirrError::NoConvergence {
        iterations: config.max_iterations,
        last_rate: rate,
    })
}

/// Halves `step` until `rate - step` lands above -100%.
///
/// Terminates because `rate > -1` holds on entry and `step` is finite.
fn step_into_domain(rate: f64, mut step: f64) -> f64 {
    let mut next = rate - step;
    while next <= -1.0 {
        step /= 2.0;
        next = rate - step;
    }
    next
}

/// Latest rates seen with a positive and a negative NPV.
#[derive(Debug, Default, Clone, Copy)]
struct Bracket {
    positive: Option<f64>,
    negative: Option<f64>,
}

impl Bracket {
    fn record(&mut self, rate: f64, npv: f64) {
        if npv > 0.0 {
            self.positive = Some(rate);
        } else if npv < 0.0 {
            self.negative = Some(rate);
        }
    }

    /// (low, high) once a sign change has been seen
    fn bounds(&self) -> Option<(f64, f64)> {
        let (a, b) = (self.positive?, self.negative?);
        Some((a.min(b), a.max(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CashFlow;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(flows: &[(NaiveDate, Decimal)]) -> CashFlowSeries {
        CashFlowSeries::new(flows.iter().map(|(d, a)| CashFlow::new(*d, *a)).collect())
    }

    #[test]
    fn test_ten_percent_over_one_year() {
        let s = series(&[(date(2023, 1, 1), dec!(-100)), (date(2024, 1, 1), dec!(110))]);
        let rate = xirr(&s).unwrap();
        assert!((rate - 0.10).abs() < 1e-4, "got {}", rate);
    }

    #[test]
    fn test_break_even_is_zero() {
        let s = series(&[(date(2023, 1, 1), dec!(-1000)), (date(2024, 1, 1), dec!(1000))]);
        let rate = xirr(&s).unwrap();
        assert!(rate.abs() < 1e-6, "got {}", rate);
    }

    #[test]
    fn test_negative_return() {
        let s = series(&[(date(2023, 1, 1), dec!(-1000)), (date(2024, 1, 1), dec!(900))]);
        let rate = xirr(&s).unwrap();
        assert!((rate + 0.10).abs() < 1e-4, "got {}", rate);
    }

    #[test]
    fn test_multiple_contributions() {
        let s = series(&[
            (date(2023, 1, 1), dec!(-1000)),
            (date(2023, 6, 1), dec!(-500)),
            (date(2024, 1, 1), dec!(1700)),
        ]);
        let rate = xirr(&s).unwrap();
        assert!(rate > 0.10 && rate < 0.20, "got {}", rate);
        assert!(xnpv(rate, &s).abs() < 1e-4);
    }

    #[test]
    fn test_overshooting_step_is_pulled_back_into_domain() {
        // The first Newton step from 10% lands near -122%.
        let s = series(&[(date(2023, 1, 1), dec!(-1000)), (date(2024, 1, 1), dec!(500))]);
        let rate = xirr(&s).unwrap();
        assert!((rate + 0.5).abs() < 1e-6, "got {}", rate);
    }

    #[test]
    fn test_deep_loss_over_decades_converges() {
        // Newton alone crawls along the steep branch left of the root here.
        let s = series(&[(date(2020, 1, 1), dec!(-100)), (date(2050, 1, 1), dec!(1))]);
        let years = (date(2050, 1, 1) - date(2020, 1, 1)).num_days() as f64 / 365.0;
        let expected = 0.01_f64.powf(1.0 / years) - 1.0;

        let rate = xirr(&s).unwrap();
        assert!((rate - expected).abs() < 1e-6, "got {}", rate);
        assert!((rate + 0.1422).abs() < 1e-3);
    }

    #[test]
    fn test_same_day_flows_have_flat_npv() {
        // No time elapses, so NPV is 10 at every rate.
        let s = series(&[(date(2020, 1, 1), dec!(-100)), (date(2020, 1, 1), dec!(110))]);
        assert_eq!(xirr(&s), Err(XirrError::DerivativeVanished { rate: INITIAL_GUESS }));
    }

    #[test]
    fn test_step_into_domain_stays_above_minus_one() {
        assert!((step_into_domain(0.1, 640.0) + 0.525).abs() < 1e-12);
        assert_eq!(step_into_domain(0.1, 0.05), 0.05);
        assert!(step_into_domain(-0.999, 1e300) > -1.0);
    }

    #[test]
    fn test_bracket_needs_both_signs() {
        let mut bracket = Bracket::default();
        bracket.record(0.1, -5.0);
        assert_eq!(bracket.bounds(), None);
        bracket.record(-0.5, 20.0);
        assert_eq!(bracket.bounds(), Some((-0.5, 0.1)));
        bracket.record(-0.2, -1.0);
        assert_eq!(bracket.bounds(), Some((-0.5, -0.2)));
    }

    #[test]
    fn test_xnpv_guard_below_minus_one() {
        let s = series(&[(date(2023, 1, 1), dec!(-100)), (date(2024, 1, 1), dec!(110))]);
        assert_eq!(xnpv(-1.0, &s), f64::INFINITY);
        assert_eq!(xnpv(-2.5, &s), f64::INFINITY);
    }

    #[test]
    fn test_xnpv_at_zero_is_plain_sum() {
        let s = series(&[
            (date(2020, 3, 1), dec!(-250.5)),
            (date(2021, 7, 9), dec!(-100)),
            (date(2022, 2, 28), dec!(75.25)),
            (date(2023, 1, 1), dec!(400)),
        ]);
        assert!((xnpv(0.0, &s) - 124.75).abs() < 1e-9);
    }

    #[test]
    fn test_day_count_is_actual_over_365() {
        // 2020 is a leap year: 366 days elapse, so one year and a day.
        let s = series(&[(date(2020, 1, 1), dec!(-100)), (date(2021, 1, 1), dec!(110))]);
        let expected = -100.0 + 110.0 / 1.1_f64.powf(366.0 / 365.0);
        assert!((xnpv(0.1, &s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_flow_is_rejected() {
        let s = series(&[(date(2023, 1, 1), dec!(100))]);
        assert_eq!(xirr(&s), Err(XirrError::TooFewCashFlows { count: 1 }));
    }

    #[test]
    fn test_same_sign_flows_are_rejected() {
        let positive = series(&[(date(2023, 1, 1), dec!(100)), (date(2024, 1, 1), dec!(50))]);
        assert_eq!(xirr(&positive), Err(XirrError::NoSignChange));

        let negative = series(&[(date(2023, 1, 1), dec!(-100)), (date(2024, 1, 1), dec!(-50))]);
        assert_eq!(xirr(&negative), Err(XirrError::NoSignChange));
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let s = series(&[
            (date(2020, 1, 1), dec!(-1000)),
            (date(2021, 1, 1), dec!(200)),
            (date(2022, 1, 1), dec!(1000)),
        ]);
        let config = SolverConfig::new(1e-300, 3);
        match xirr_with_config(&s, &config) {
            Err(XirrError::NoConvergence { iterations, .. }) => assert_eq!(iterations, 3),
            other => panic!("expected NoConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_result_is_deterministic() {
        let s = series(&[
            (date(2019, 4, 10), dec!(-5000)),
            (date(2020, 9, 15), dec!(-2500)),
            (date(2021, 11, 30), dec!(1200)),
            (date(2024, 3, 31), dec!(9100)),
        ]);
        let first = xirr(&s).unwrap();
        let second = xirr(&s).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
