// Returns module - cash-flow assembly and the XIRR solver

pub mod assembler;
pub mod solver;

pub use assembler::{
    assemble, build_fund_series, build_portfolio_series, verify_terminal_consistency,
    AssembledSeries, FundSeries, ValuationSet,
};
pub use solver::{xirr, xirr_with_config, xnpv, SolverConfig};
