//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and projection
//! - exported to JSON/CSV
//! - reloaded later for comparisons across assumption sets

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Period spacing of a market time series.
///
/// Inferred from the data, never configured: both the home-value and rent
/// series of a dataset must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Annual,
}

impl Granularity {
    /// Number of observations per year at this spacing.
    pub fn periods_per_year(self) -> usize {
        match self {
            Granularity::Monthly => 12,
            Granularity::Annual => 1,
        }
    }
}

/// Which return metric to rank segments by in reports and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RankMetric {
    /// Annual cash flow over cash invested (year one, cash only).
    CashOnCash,
    /// Cash flow plus tax shield plus principal paydown over cash invested.
    FirstYearRoi,
    /// Horizon total return over cash invested.
    TotalReturn,
}

impl RankMetric {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            RankMetric::CashOnCash => "cash-on-cash",
            RankMetric::FirstYearRoi => "first-year ROI",
            RankMetric::TotalReturn => "total return",
        }
    }
}

/// One parsed observation from a value table: a segment, a period, a value.
///
/// This is the already-tabular form ingestion produces; the dataset loader
/// groups and aligns these rows by segment.
#[derive(Debug, Clone)]
pub struct ValueRow {
    /// 5-digit ZIP, zero-padded.
    pub zip: String,
    pub period: NaiveDate,
    pub value: f64,
}

/// A single observation in a segment's time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub period: NaiveDate,
    pub value: f64,
}

/// Optional human label for a segment (e.g. a neighborhood name).
#[derive(Debug, Clone)]
pub struct SegmentLabel {
    pub zip: String,
    pub label: String,
}

/// One geographic market segment (a ZIP code) with its aligned history.
///
/// Invariants maintained by the dataset loader:
/// - both series are sorted ascending by period and truncated to the
///   dataset's as-of period
/// - both series are non-empty; the last entry of each is "current"
///
/// Segments are immutable once loaded.
#[derive(Debug, Clone)]
pub struct MarketSegment {
    pub zip: String,
    pub label: Option<String>,
    pub home_values: Vec<SeriesPoint>,
    pub rents: Vec<SeriesPoint>,
}

impl MarketSegment {
    /// Latest observed home value, if the series has any observation.
    pub fn current_home_value(&self) -> Option<f64> {
        self.home_values.last().map(|p| p.value)
    }

    /// Latest observed monthly rent, if the series has any observation.
    pub fn current_rent(&self) -> Option<f64> {
        self.rents.last().map(|p| p.value)
    }

    /// Mean rent over the last `periods` observations (fewer if the series
    /// is shorter). `None` for an empty series.
    pub fn trailing_average_rent(&self, periods: usize) -> Option<f64> {
        if self.rents.is_empty() || periods == 0 {
            return None;
        }
        let start = self.rents.len().saturating_sub(periods);
        let window = &self.rents[start..];
        let sum: f64 = window.iter().map(|p| p.value).sum();
        Some(sum / window.len() as f64)
    }
}

/// Why a segment was dropped while building a dataset.
///
/// The loader never fails the whole dataset over one bad segment; it records
/// the reason here so callers can report coverage.
#[derive(Debug, Clone)]
pub struct SegmentSkip {
    pub zip: String,
    pub reason: String,
}

/// An aligned collection of market segments sharing one as-of period.
#[derive(Debug, Clone)]
pub struct MarketDataset {
    /// Stable input order; projection output preserves it.
    pub segments: Vec<MarketSegment>,
    /// Latest period present in both the home-value and rent inputs.
    pub asof: NaiveDate,
    pub granularity: Granularity,
    /// Segments dropped during alignment, with reasons.
    pub skipped: Vec<SegmentSkip>,
}

impl MarketDataset {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, zip: &str) -> Option<&MarketSegment> {
        self.segments.iter().find(|s| s.zip == zip)
    }
}

/// Global financial assumptions for a projection run.
///
/// Plain `Copy` data passed by value: there is no ambient assumption state,
/// and two runs with different assumptions can proceed concurrently over the
/// same dataset. All `_pct` fields are fractions (0.07 = 7%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Assumptions {
    pub down_payment_pct: f64,
    /// Annual mortgage interest rate.
    pub interest_rate: f64,
    pub closing_cost_pct: f64,
    /// Annual maintenance as a share of home value.
    pub maintenance_pct: f64,
    /// Annual insurance premium in dollars.
    pub insurance_annual: f64,
    pub vacancy_rate: f64,
    /// Annual property tax as a share of home value.
    pub property_tax_pct: f64,
    /// Management fee as a share of collected (vacancy-adjusted) rent.
    pub management_pct: f64,
    /// Capital-expenditure reserve in dollars per month.
    pub capex_monthly: f64,
    /// Marginal income tax rate applied to the depreciation shield.
    pub marginal_tax_pct: f64,
    /// Share of the purchase price attributed to the structure (land does
    /// not depreciate).
    pub structure_value_pct: f64,
    /// Annual home-price appreciation, compounded over the horizon.
    pub appreciation_pct: f64,
    /// Holding period in years.
    pub horizon_years: u32,
    pub loan_term_years: u32,
    /// Depreciation recovery period in years (27.5 for US residential).
    pub depreciation_years: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            down_payment_pct: 0.20,
            interest_rate: 0.07,
            closing_cost_pct: 0.02,
            maintenance_pct: 0.015,
            insurance_annual: 1300.0,
            vacancy_rate: 0.05,
            property_tax_pct: 0.0041,
            management_pct: 0.08,
            capex_monthly: 300.0,
            marginal_tax_pct: 0.24,
            structure_value_pct: 0.85,
            appreciation_pct: 0.03,
            horizon_years: 5,
            loan_term_years: 30,
            depreciation_years: 27.5,
        }
    }
}

impl Assumptions {
    /// Check every field against its admissible range.
    ///
    /// Called once at the entry of batch operations so per-segment work can
    /// assume a valid parameter set.
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("down_payment_pct", self.down_payment_pct),
            ("interest_rate", self.interest_rate),
            ("closing_cost_pct", self.closing_cost_pct),
            ("maintenance_pct", self.maintenance_pct),
            ("property_tax_pct", self.property_tax_pct),
            ("management_pct", self.management_pct),
            ("marginal_tax_pct", self.marginal_tax_pct),
            ("structure_value_pct", self.structure_value_pct),
            ("appreciation_pct", self.appreciation_pct),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidInput(format!(
                    "{name} must be a fraction in [0, 1], got {value}"
                )));
            }
        }
        if !self.vacancy_rate.is_finite() || !(0.0..1.0).contains(&self.vacancy_rate) {
            return Err(EngineError::InvalidInput(format!(
                "vacancy_rate must be in [0, 1), got {}",
                self.vacancy_rate
            )));
        }
        let dollars = [
            ("insurance_annual", self.insurance_annual),
            ("capex_monthly", self.capex_monthly),
        ];
        for (name, value) in dollars {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "{name} must be a non-negative dollar amount, got {value}"
                )));
            }
        }
        if self.horizon_years == 0 {
            return Err(EngineError::InvalidInput(
                "horizon_years must be at least 1".to_string(),
            ));
        }
        if self.loan_term_years == 0 {
            return Err(EngineError::InvalidInput(
                "loan_term_years must be at least 1".to_string(),
            ));
        }
        if !self.depreciation_years.is_finite() || self.depreciation_years <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "depreciation_years must be positive, got {}",
                self.depreciation_years
            )));
        }
        Ok(())
    }
}

/// A per-segment projection result (used for ranking and exports).
#[derive(Debug, Clone)]
pub struct ProjectionRow {
    pub zip: String,
    pub label: Option<String>,
    /// Current home value the projection was evaluated at.
    pub home_value: f64,
    /// Current monthly rent the projection was evaluated at.
    pub rent: f64,
    pub result: ReturnResult,
}

/// Full return decomposition for one property at one assumption set.
///
/// Dollar figures are dollars; `cash_on_cash`, `first_year_roi`, and
/// `total_return_pct` are fractions of cash invested (the report layer
/// renders percent).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReturnResult {
    pub cash_invested: f64,
    pub loan_amount: f64,
    pub monthly_payment: f64,
    /// Vacancy-adjusted monthly rent.
    pub effective_rent: f64,
    /// Monthly operating costs excluding debt service.
    pub operating_costs: f64,
    pub monthly_cash_flow: f64,
    pub annual_cash_flow: f64,
    pub cash_on_cash: f64,
    pub tax_shield_annual: f64,
    pub principal_paydown_year1: f64,
    pub first_year_roi: f64,
    /// Appreciation gain over the full horizon.
    pub appreciation_gain: f64,
    pub cumulative_cash_flow: f64,
    pub cumulative_tax_shield: f64,
    pub cumulative_paydown: f64,
    /// Sum of the four cumulative components, in dollars.
    pub total_return: f64,
    pub total_return_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn segment_with_rents(values: &[f64]) -> MarketSegment {
        let rents = values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint {
                period: date(2024, 1 + i as u32, 1),
                value: v,
            })
            .collect();
        MarketSegment {
            zip: "80301".to_string(),
            label: None,
            home_values: vec![SeriesPoint {
                period: date(2024, 1, 1),
                value: 300_000.0,
            }],
            rents,
        }
    }

    #[test]
    fn trailing_average_uses_last_n_points() {
        let seg = segment_with_rents(&[1000.0, 2000.0, 3000.0, 4000.0]);
        let avg = seg.trailing_average_rent(2).unwrap();
        assert!((avg - 3500.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_average_tolerates_short_series() {
        let seg = segment_with_rents(&[1800.0, 1900.0]);
        let avg = seg.trailing_average_rent(12).unwrap();
        assert!((avg - 1850.0).abs() < 1e-9);
    }

    #[test]
    fn default_assumptions_validate() {
        assert!(Assumptions::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_fraction() {
        let a = Assumptions {
            down_payment_pct: 1.2,
            ..Assumptions::default()
        };
        let err = a.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(err.to_string().contains("down_payment_pct"));
    }

    #[test]
    fn validate_rejects_full_vacancy() {
        let a = Assumptions {
            vacancy_rate: 1.0,
            ..Assumptions::default()
        };
        assert!(a.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_horizon() {
        let a = Assumptions {
            horizon_years: 0,
            ..Assumptions::default()
        };
        assert!(a.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_dollars() {
        let a = Assumptions {
            insurance_annual: f64::NAN,
            ..Assumptions::default()
        };
        assert!(a.validate().is_err());
    }

    #[test]
    fn granularity_periods_per_year() {
        assert_eq!(Granularity::Monthly.periods_per_year(), 12);
        assert_eq!(Granularity::Annual.periods_per_year(), 1);
    }
}
