//! Return decomposition for a single property.
//!
//! Combines financing, operating costs, tax effects, and appreciation into a
//! [`ReturnResult`]. The composition runs in a fixed order because later
//! figures consume earlier ones:
//!
//! 1. cash invested (down payment + closing costs)
//! 2. loan amount and amortization schedule
//! 3. vacancy-adjusted effective rent
//! 4. monthly operating costs
//! 5. monthly / annual cash flow (after debt service)
//! 6. cash-on-cash
//! 7. depreciation tax shield and year-1 principal paydown
//! 8. first-year ROI
//! 9. horizon totals (appreciation, cash flow, shield, paydown)
//!
//! A loss-making deal is a valid result, not an error: negative cash flow
//! must reach the caller so bad deals are visible.

use crate::domain::{Assumptions, ReturnResult};
use crate::error::{EngineError, Result};
use crate::finance::amortize::{AmortizationSchedule, amortize};

/// Evaluate one property at one assumption set.
///
/// `monthly_rent` is gross scheduled rent; vacancy is applied here. Fails
/// with `InvalidInput` for a non-positive price or rent, invalid assumptions,
/// or a deal with zero cash invested (100% financing has no return base).
pub fn evaluate(
    home_price: f64,
    monthly_rent: f64,
    assumptions: &Assumptions,
) -> Result<ReturnResult> {
    assumptions.validate()?;
    if !home_price.is_finite() || home_price <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "home price must be positive, got {home_price}"
        )));
    }
    if !monthly_rent.is_finite() || monthly_rent <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "monthly rent must be positive, got {monthly_rent}"
        )));
    }

    let cash_invested =
        home_price * assumptions.down_payment_pct + home_price * assumptions.closing_cost_pct;
    if cash_invested <= 0.0 {
        return Err(EngineError::InvalidInput(
            "cash invested must be positive; fully financed deals are not supported".to_string(),
        ));
    }

    let loan_amount = home_price * (1.0 - assumptions.down_payment_pct);
    let schedule = if loan_amount > 0.0 {
        amortize(
            loan_amount,
            assumptions.interest_rate,
            assumptions.loan_term_years,
            12,
        )?
    } else {
        AmortizationSchedule::empty()
    };
    let monthly_payment = schedule.payment;

    let effective_rent = monthly_rent * (1.0 - assumptions.vacancy_rate);

    let operating_costs = home_price * assumptions.maintenance_pct / 12.0
        + assumptions.insurance_annual / 12.0
        + home_price * assumptions.property_tax_pct / 12.0
        + effective_rent * assumptions.management_pct
        + assumptions.capex_monthly;

    let monthly_cash_flow = effective_rent - operating_costs - monthly_payment;
    let annual_cash_flow = monthly_cash_flow * 12.0;
    let cash_on_cash = annual_cash_flow / cash_invested;

    let tax_shield_annual = home_price * assumptions.structure_value_pct
        / assumptions.depreciation_years
        * assumptions.marginal_tax_pct;
    let principal_paydown_year1 = schedule.principal_paid_through(12);

    let first_year_roi =
        (annual_cash_flow + tax_shield_annual + principal_paydown_year1) / cash_invested;

    let horizon = assumptions.horizon_years;
    let growth = (1.0 + assumptions.appreciation_pct).powi(horizon as i32);
    let appreciation_gain = home_price * (growth - 1.0);
    // Annual cash flow is held flat over the horizon; no rent growth model
    // is layered in.
    let cumulative_cash_flow = annual_cash_flow * horizon as f64;
    let cumulative_tax_shield = tax_shield_annual * horizon as f64;
    let cumulative_paydown = schedule.principal_paid_through(horizon as usize * 12);

    let total_return =
        appreciation_gain + cumulative_cash_flow + cumulative_tax_shield + cumulative_paydown;
    let total_return_pct = total_return / cash_invested;

    Ok(ReturnResult {
        cash_invested,
        loan_amount,
        monthly_payment,
        effective_rent,
        operating_costs,
        monthly_cash_flow,
        annual_cash_flow,
        cash_on_cash,
        tax_shield_annual,
        principal_paydown_year1,
        first_year_roi,
        appreciation_gain,
        cumulative_cash_flow,
        cumulative_tax_shield,
        cumulative_paydown,
        total_return,
        total_return_pct,
    })
}
