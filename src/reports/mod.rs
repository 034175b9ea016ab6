// Reports module - portfolio and per-fund return reports

pub mod returns;

pub use returns::{compute_returns, FundReturn, RateOutcome, ReturnsReport};
