//! Fixed-rate mortgage amortization.
//!
//! Standard annuity math: constant per-period payment, interest accrued on
//! the outstanding balance, remainder of each payment retiring principal.
//!
//! Implementation choices:
//! - the whole schedule is materialized (a 30-year monthly loan is 360 small
//!   structs), which keeps year-1 and horizon paydown queries trivial
//! - the final balance is snapped to zero once it falls below rounding noise,
//!   so callers can rely on the schedule ending at (numerically) zero
//! - an all-cash purchase is representable as an empty schedule with zero
//!   payment, constructed via [`AmortizationSchedule::empty`], never via
//!   `amortize` (a zero principal is an input error there)

use crate::error::{EngineError, Result};

/// One period's split of the constant payment.
#[derive(Debug, Clone, Copy)]
pub struct AmortPeriod {
    pub principal: f64,
    pub interest: f64,
    /// Outstanding balance after this period's payment.
    pub balance: f64,
}

/// A complete loan schedule: one constant payment and the per-period splits.
#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    pub payment: f64,
    pub periods: Vec<AmortPeriod>,
}

impl AmortizationSchedule {
    /// Schedule for a purchase with no financing.
    pub fn empty() -> Self {
        Self {
            payment: 0.0,
            periods: Vec::new(),
        }
    }

    /// Principal retired over the first `n` periods, clamped to the schedule
    /// length (a loan can be shorter than the query horizon).
    pub fn principal_paid_through(&self, n: usize) -> f64 {
        self.periods.iter().take(n).map(|p| p.principal).sum()
    }
}

/// Build the amortization schedule for a fixed-rate, fixed-term loan.
///
/// `annual_rate` is a fraction (0.065 = 6.5%). Zero is allowed and degrades
/// to straight-line principal repayment. Fails with `InvalidInput` for a
/// non-positive principal, negative or non-finite rate, or a zero term.
pub fn amortize(
    principal: f64,
    annual_rate: f64,
    term_years: u32,
    periods_per_year: u32,
) -> Result<AmortizationSchedule> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "loan principal must be positive, got {principal}"
        )));
    }
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "interest rate must be non-negative, got {annual_rate}"
        )));
    }
    if term_years == 0 {
        return Err(EngineError::InvalidInput(
            "loan term must be at least one year".to_string(),
        ));
    }
    if periods_per_year == 0 {
        return Err(EngineError::InvalidInput(
            "periods per year must be at least 1".to_string(),
        ));
    }

    let n = term_years as usize * periods_per_year as usize;
    if n > 100_000 {
        return Err(EngineError::InvalidInput(format!(
            "schedule of {n} periods is not supported"
        )));
    }
    let rate = annual_rate / periods_per_year as f64;

    let payment = if rate > 0.0 {
        let factor = (1.0 + rate).powi(n as i32);
        principal * rate * factor / (factor - 1.0)
    } else {
        principal / n as f64
    };

    let mut periods = Vec::with_capacity(n);
    let mut balance = principal;
    for _ in 0..n {
        let interest = balance * rate;
        let principal_part = payment - interest;
        balance -= principal_part;
        if balance.abs() < 1e-8 {
            balance = 0.0;
        }
        periods.push(AmortPeriod {
            principal: principal_part,
            interest,
            balance,
        });
    }

    Ok(AmortizationSchedule { payment, periods })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_matches_annuity_table() {
        // $240k at 6.5% over 30 years is the textbook $1,516.96/mo.
        let schedule = amortize(240_000.0, 0.065, 30, 12).unwrap();
        assert!((schedule.payment - 1516.96).abs() < 0.01);
        assert_eq!(schedule.periods.len(), 360);
    }

    #[test]
    fn principal_components_sum_to_principal() {
        let schedule = amortize(300_000.0, 0.07, 30, 12).unwrap();
        let total: f64 = schedule.periods.iter().map(|p| p.principal).sum();
        assert!((total - 300_000.0).abs() < 1e-4);
        assert!(schedule.periods.last().unwrap().balance.abs() < 1e-6);
    }

    #[test]
    fn balance_decreases_monotonically() {
        let schedule = amortize(100_000.0, 0.06, 15, 12).unwrap();
        let mut prev = 100_000.0;
        for p in &schedule.periods {
            assert!(p.balance < prev);
            prev = p.balance;
        }
    }

    #[test]
    fn zero_rate_degrades_to_straight_line() {
        let schedule = amortize(120_000.0, 0.0, 10, 12).unwrap();
        assert!((schedule.payment - 1000.0).abs() < 1e-9);
        for p in &schedule.periods {
            assert_eq!(p.interest, 0.0);
            assert!((p.principal - 1000.0).abs() < 1e-9);
        }
        assert_eq!(schedule.periods.last().unwrap().balance, 0.0);
    }

    #[test]
    fn early_periods_are_mostly_interest() {
        let schedule = amortize(240_000.0, 0.065, 30, 12).unwrap();
        let first = &schedule.periods[0];
        assert!(first.interest > first.principal);
        let last = schedule.periods.last().unwrap();
        assert!(last.principal > last.interest);
    }

    #[test]
    fn paid_through_clamps_at_schedule_end() {
        let schedule = amortize(50_000.0, 0.05, 1, 12).unwrap();
        let all = schedule.principal_paid_through(600);
        assert!((all - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(amortize(0.0, 0.05, 30, 12).is_err());
        assert!(amortize(-5.0, 0.05, 30, 12).is_err());
        assert!(amortize(100.0, -0.01, 30, 12).is_err());
        assert!(amortize(100.0, f64::NAN, 30, 12).is_err());
        assert!(amortize(100.0, 0.05, 0, 12).is_err());
        assert!(amortize(100.0, 0.05, 30, 0).is_err());
    }

    #[test]
    fn empty_schedule_pays_nothing() {
        let schedule = AmortizationSchedule::empty();
        assert_eq!(schedule.payment, 0.0);
        assert_eq!(schedule.principal_paid_through(12), 0.0);
    }
}
