//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the projection and fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{Assumptions, Granularity, MarketDataset, MarketSegment, ProjectionRow, RankMetric};
use crate::project::{DealAnalysis, RentSource};
use crate::rent::{RentModel, one_percent_rent};
use crate::report::{RentRankings, RentResidual};

/// Format the run header: dataset coverage plus the fitted model.
pub fn format_model_summary(dataset: &MarketDataset, model: &RentModel) -> String {
    let mut out = String::new();

    out.push_str("=== roi - Rental ROI Projection ===\n");
    out.push_str(&format!(
        "As-of: {} ({} data)\n",
        dataset.asof,
        granularity_name(dataset.granularity)
    ));
    out.push_str(&format!(
        "Segments: {} usable | {} skipped\n",
        dataset.len(),
        dataset.skipped.len()
    ));
    for skip in dataset.skipped.iter().take(5) {
        out.push_str(&format!("  (skipped {}) {}\n", skip.zip, skip.reason));
    }
    if dataset.skipped.len() > 5 {
        out.push_str(&format!("  ... and {} more\n", dataset.skipped.len() - 5));
    }

    out.push_str("\nRent model:\n");
    out.push_str(&format!(
        "- ln(rent) = {:.4} + {:.4} ln(price)\n",
        model.intercept, model.slope
    ));
    out.push_str(&format!(
        "- R^2={:.3} on n={} segments\n",
        model.r_squared, model.n_samples
    ));

    out
}

/// Model summary plus the assumption set, for projection and deal runs.
pub fn format_run_summary(dataset: &MarketDataset, model: &RentModel, assumptions: &Assumptions) -> String {
    let mut out = format_model_summary(dataset, model);

    out.push_str("\nAssumptions:\n");
    out.push_str(&format!(
        "- financing: {} down @ {} for {}y, closing {}\n",
        fmt_pct(assumptions.down_payment_pct),
        fmt_pct(assumptions.interest_rate),
        assumptions.loan_term_years,
        fmt_pct(assumptions.closing_cost_pct),
    ));
    out.push_str(&format!(
        "- operations: vacancy {}, maintenance {}, management {}, capex ${:.0}/mo\n",
        fmt_pct(assumptions.vacancy_rate),
        fmt_pct(assumptions.maintenance_pct),
        fmt_pct(assumptions.management_pct),
        assumptions.capex_monthly,
    ));
    out.push_str(&format!(
        "- horizon: {}y @ {} appreciation, marginal tax {}\n",
        assumptions.horizon_years,
        fmt_pct(assumptions.appreciation_pct),
        fmt_pct(assumptions.marginal_tax_pct),
    ));
    out.push('\n');

    out
}

/// Format the ranked projection table, best segment first.
pub fn format_projection_rankings(ranked: &[ProjectionRow], metric: RankMetric) -> String {
    let mut out = String::new();
    out.push_str(&format!("Top {} by {}:\n", ranked.len(), metric.display_name()));

    out.push_str(&format!(
        "{:<6} {:<18} {:>10} {:>8} {:>10} {:>8} {:>8} {:>8}\n",
        "zip", "label", "value", "rent", "cf/mo", "coc", "roi-1y", "total"
    ));
    out.push_str(&format!(
        "{:-<6} {:-<18} {:-<10} {:-<8} {:-<10} {:-<8} {:-<8} {:-<8}\n",
        "", "", "", "", "", "", "", ""
    ));

    for row in ranked {
        let r = &row.result;
        out.push_str(&format!(
            "{:<6} {:<18} {:>10.0} {:>8.0} {:>10.2} {:>8} {:>8} {:>8}\n",
            row.zip,
            truncate(row.label.as_deref().unwrap_or(""), 18),
            row.home_value,
            row.rent,
            r.monthly_cash_flow,
            fmt_pct(r.cash_on_cash),
            fmt_pct(r.first_year_roi),
            fmt_pct(r.total_return_pct),
        ));
    }

    out
}

/// Format the above/below-model rent tables.
pub fn format_rent_rankings(rankings: &RentRankings) -> String {
    let mut out = String::new();

    out.push_str("Rent above model (strongest earners):\n");
    out.push_str(&rent_table(&rankings.above));
    out.push('\n');

    out.push_str("Rent below model (weakest earners):\n");
    out.push_str(&rent_table(&rankings.below));

    out
}

fn rent_table(rows: &[RentResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<18} {:>10} {:>8} {:>8} {:>8}\n",
        "zip", "label", "value", "rent", "fit", "gap"
    ));
    out.push_str(&format!(
        "{:-<6} {:-<18} {:-<10} {:-<8} {:-<8} {:-<8}\n",
        "", "", "", "", "", ""
    ));
    for r in rows {
        out.push_str(&format!(
            "{:<6} {:<18} {:>10.0} {:>8.0} {:>8.0} {:>8.0}\n",
            r.zip,
            truncate(r.label.as_deref().unwrap_or(""), 18),
            r.home_value,
            r.rent_obs,
            r.rent_fit,
            r.residual,
        ));
    }
    out
}

/// Format a single-deal card: rent resolution, financing, full decomposition.
pub fn format_deal(deal: &DealAnalysis, assumptions: &Assumptions) -> String {
    let r = &deal.result;
    let mut out = String::new();

    match &deal.zip {
        Some(zip) => out.push_str(&format!("Deal: ${:.0} in {}\n", deal.price, zip)),
        None => out.push_str(&format!("Deal: ${:.0} (no segment)\n", deal.price)),
    }
    out.push_str(&format!(
        "- rent: ${:.2}/mo ({}); one-percent target ${:.2}/mo\n",
        deal.rent,
        rent_source_name(deal.rent_source),
        deal.one_percent_rent
    ));
    out.push_str(&format!(
        "- cash in: ${:.2} | loan ${:.2} @ ${:.2}/mo\n",
        r.cash_invested, r.loan_amount, r.monthly_payment
    ));
    out.push_str(&format!(
        "- cash flow: ${:.2}/mo (${:.2}/yr) | cash-on-cash {}\n",
        r.monthly_cash_flow,
        r.annual_cash_flow,
        fmt_pct(r.cash_on_cash)
    ));
    out.push_str(&format!(
        "- year one: ROI {} (cash flow + shield ${:.2} + paydown ${:.2})\n",
        fmt_pct(r.first_year_roi),
        r.tax_shield_annual,
        r.principal_paydown_year1
    ));
    out.push_str(&format!(
        "- {}y total: ${:.2} ({} of cash), incl. appreciation ${:.2}\n",
        assumptions.horizon_years,
        r.total_return,
        fmt_pct(r.total_return_pct),
        r.appreciation_gain
    ));

    out
}

/// Format a one-segment drilldown: current levels, trailing rent, model gap.
pub fn format_segment_detail(segment: &MarketSegment, model: &RentModel, granularity: Granularity) -> String {
    let mut out = String::new();
    match &segment.label {
        Some(label) => out.push_str(&format!("Segment {} ({label}):\n", segment.zip)),
        None => out.push_str(&format!("Segment {}:\n", segment.zip)),
    }

    if let Some(value) = segment.current_home_value() {
        out.push_str(&format!("- home value: ${value:.0}\n"));
    }
    if let Some(rent) = segment.current_rent() {
        out.push_str(&format!("- rent: ${rent:.2}/mo"));
        // one year of observations, whatever the spacing
        if let Some(avg) = segment.trailing_average_rent(granularity.periods_per_year()) {
            out.push_str(&format!(" (trailing-year avg ${avg:.2}/mo)"));
        }
        out.push('\n');
    }
    if let Ok(gap) = model.residual(segment) {
        out.push_str(&format!("- vs model: {gap:+.2}/mo\n"));
    }
    out.push_str(&format!(
        "- observations: {} home value, {} rent\n",
        segment.home_values.len(),
        segment.rents.len()
    ));

    out
}

/// Format an ad-hoc price quote against the model and the one-percent rule.
pub fn format_price_estimate(price: f64, predicted: f64) -> String {
    format!(
        "Model rent at ${price:.0}: ${predicted:.2}/mo | one-percent target ${:.2}/mo\n",
        one_percent_rent(price)
    )
}

fn rent_source_name(source: RentSource) -> &'static str {
    match source {
        RentSource::Override => "caller override",
        RentSource::ModelAdjusted => "model, segment-adjusted",
        RentSource::Model => "model, national fit",
    }
}

fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn granularity_name(g: Granularity) -> &'static str {
    match g {
        Granularity::Monthly => "monthly",
        Granularity::Annual => "annual",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
