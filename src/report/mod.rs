//! Reporting utilities: rent residuals, rankings, and formatted output.

use crate::domain::{MarketDataset, ProjectionRow, RankMetric};
use crate::error::AppError;
use crate::rent::RentModel;

pub mod format;

pub use format::*;

/// One segment's observed rent against the model's prediction.
#[derive(Debug, Clone)]
pub struct RentResidual {
    pub zip: String,
    pub label: Option<String>,
    pub home_value: f64,
    pub rent_obs: f64,
    pub rent_fit: f64,
    /// Observed minus fitted, in dollars per month.
    pub residual: f64,
}

/// Above/below-model rent rankings (top-N each side).
#[derive(Debug, Clone)]
pub struct RentRankings {
    pub above: Vec<RentResidual>,
    pub below: Vec<RentResidual>,
}

/// Compute observed-vs-fitted rent for every segment in the dataset.
///
/// Segments the model cannot price (non-positive home value) are skipped
/// here; projection reports those same segments as failures.
pub fn compute_rent_residuals(
    dataset: &MarketDataset,
    model: &RentModel,
) -> Result<Vec<RentResidual>, AppError> {
    let mut out = Vec::with_capacity(dataset.len());
    for seg in &dataset.segments {
        let (Some(home_value), Some(rent_obs)) = (seg.current_home_value(), seg.current_rent())
        else {
            continue;
        };
        let residual = match model.residual(seg) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !residual.is_finite() {
            return Err(AppError::new(
                4,
                "Non-finite model prediction during residual computation.",
            ));
        }
        out.push(RentResidual {
            zip: seg.zip.clone(),
            label: seg.label.clone(),
            home_value,
            rent_obs,
            rent_fit: rent_obs - residual,
            residual,
        });
    }
    Ok(out)
}

/// Rank the segments whose rent runs furthest above and below the model.
pub fn rank_rent_gaps(residuals: &[RentResidual], top_n: usize) -> RentRankings {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.partial_cmp(&a.residual).unwrap_or(std::cmp::Ordering::Equal));
    let above = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_below = residuals.to_vec();
    sorted_below.sort_by(|a, b| a.residual.partial_cmp(&b.residual).unwrap_or(std::cmp::Ordering::Equal));
    let below = sorted_below.iter().take(top_n).cloned().collect();

    RentRankings { above, below }
}

/// Top-N projection rows by the chosen metric, best first.
pub fn rank_projections(rows: &[ProjectionRow], metric: RankMetric, top_n: usize) -> Vec<ProjectionRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        metric_value(b, metric)
            .partial_cmp(&metric_value(a, metric))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

pub fn metric_value(row: &ProjectionRow, metric: RankMetric) -> f64 {
    match metric {
        RankMetric::CashOnCash => row.result.cash_on_cash,
        RankMetric::FirstYearRoi => row.result.first_year_roi,
        RankMetric::TotalReturn => row.result.total_return_pct,
    }
}
