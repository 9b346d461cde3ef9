//! Internal rate of return
//!
//! The formula engine has no `IRR`; the rate is solved here from the
//! evaluated cash-flow rows with Newton-Raphson on
//! `NPV(r) = sum(CF[t] / (1 + r)^t)`.

use serde::{Deserialize, Serialize};

/// Below this slope a Newton step is meaningless
const MIN_DERIVATIVE: f64 = 1e-15;

/// Solver parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IrrConfig {
    /// Starting rate
    pub guess: f64,
    /// Converged once successive rates differ by less than this
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Rates below this give up
    pub lower_bound: f64,
    /// Rates above this give up
    pub upper_bound: f64,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            guess: 0.10,
            tolerance: 1e-7,
            max_iterations: 100,
            lower_bound: -1.0,
            upper_bound: 10.0,
        }
    }
}

/// Newton-Raphson IRR solver
#[derive(Debug, Clone, Copy, Default)]
pub struct IrrSolver {
    config: IrrConfig,
}

impl IrrSolver {
    pub fn new(config: IrrConfig) -> Self {
        Self { config }
    }

    /// Rate at which the net present value of `cash_flows` is zero
    ///
    /// `cash_flows[0]` is the year-0 outlay. Returns `None` unless the series
    /// has both a negative and a positive value, and when the iteration
    /// stalls, leaves the configured bounds or runs out of iterations.
    pub fn solve(&self, cash_flows: &[f64]) -> Option<f64> {
        let has_negative = cash_flows.iter().any(|v| *v < 0.0);
        let has_positive = cash_flows.iter().any(|v| *v > 0.0);
        if !has_negative || !has_positive {
            return None;
        }

        let config = &self.config;
        let mut rate = config.guess;

        for _ in 0..config.max_iterations {
            let (npv, slope) = npv_with_derivative(cash_flows, rate);

            if slope.abs() < MIN_DERIVATIVE {
                log::debug!("IRR stalled at rate {} (flat NPV)", rate);
                return None;
            }

            let next = rate - npv / slope;
            if !next.is_finite() {
                return None;
            }
            if (next - rate).abs() < config.tolerance {
                return Some(next);
            }

            rate = next;
            if rate < config.lower_bound || rate > config.upper_bound {
                log::debug!("IRR diverged to {}", rate);
                return None;
            }
        }

        log::debug!(
            "IRR did not converge within {} iterations",
            config.max_iterations
        );
        None
    }
}

/// IRR with the default solver parameters
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    IrrSolver::default().solve(cash_flows)
}

/// `(NPV(r), NPV'(r))`
fn npv_with_derivative(cash_flows: &[f64], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut slope = 0.0;
    let mut discount = 1.0; // (1 + r)^t

    for (t, cf) in cash_flows.iter().enumerate() {
        npv += cf / discount;
        slope -= t as f64 * cf / (discount * base);
        discount *= base;
    }

    (npv, slope)
}
