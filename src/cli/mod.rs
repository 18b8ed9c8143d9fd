//! Command-line parsing for the rental ROI projector.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/finance code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Assumptions, RankMetric};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "roi", version, about = "Rental ROI projector (ZIP-level market data)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the rent model, project returns for every segment, and rank them.
    Project(ProjectArgs),
    /// Fit the rent model and show segments earning above/below it.
    Rent(RentArgs),
    /// Evaluate one candidate purchase against the fitted model.
    Deal(DealArgs),
}

/// Options for batch projection.
#[derive(Debug, Parser, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Show top-N segments.
    #[arg(long, default_value_t = 15)]
    pub top: usize,

    /// Metric to rank segments by.
    #[arg(long, value_enum, default_value_t = RankMetric::CashOnCash)]
    pub rank: RankMetric,

    /// Export per-segment results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the fitted rent model to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

/// Options for the rent-model view.
#[derive(Debug, Parser, Clone)]
pub struct RentArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Show top-N segments above and below the model.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Show detail for one segment (current and trailing-average rent).
    #[arg(long)]
    pub zip: Option<String>,

    /// Predict rent for an ad-hoc price (with the one-percent-rule figure).
    #[arg(long)]
    pub price: Option<f64>,

    /// Export the fitted rent model to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

/// Options for single-deal evaluation.
#[derive(Debug, Parser, Clone)]
pub struct DealArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Purchase price to evaluate.
    #[arg(long)]
    pub price: f64,

    /// Anchor the rent estimate to this segment's observed level.
    #[arg(long)]
    pub zip: Option<String>,

    /// Use this monthly rent instead of the model estimate.
    #[arg(long = "rent-override")]
    pub rent_override: Option<f64>,
}

/// Where market data comes from: a pair of wide CSVs, or a generated demo.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Wide-format home-value CSV (Zillow ZHVI style).
    #[arg(long, value_name = "CSV")]
    pub home: Option<PathBuf>,

    /// Wide-format rent CSV (Zillow ZORI style).
    #[arg(long, value_name = "CSV")]
    pub rent: Option<PathBuf>,

    /// Optional `zip,label` CSV restricting projection to named segments.
    #[arg(long, value_name = "CSV")]
    pub labels: Option<PathBuf>,

    /// Generate a deterministic demo market instead of reading CSVs.
    #[arg(long)]
    pub demo: bool,

    /// Demo: number of segments.
    #[arg(long, default_value_t = 48)]
    pub demo_segments: usize,

    /// Demo: months of history per segment.
    #[arg(long, default_value_t = 24)]
    pub demo_months: usize,

    /// Demo: random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Demo: as-of date.
    #[arg(long, default_value = "2025-06-30")]
    pub asof: NaiveDate,
}

/// Financial assumptions, all overridable per run.
///
/// Defaults mirror `Assumptions::default()`; `default_flags_match_defaults`
/// keeps the two in sync.
#[derive(Debug, Args, Clone)]
pub struct AssumptionArgs {
    /// Down payment as a fraction of price.
    #[arg(long, default_value_t = 0.20)]
    pub down: f64,

    /// Annual mortgage rate.
    #[arg(long, default_value_t = 0.07)]
    pub rate: f64,

    /// Closing costs as a fraction of price.
    #[arg(long, default_value_t = 0.02)]
    pub closing: f64,

    /// Annual maintenance as a fraction of home value.
    #[arg(long, default_value_t = 0.015)]
    pub maintenance: f64,

    /// Annual insurance premium in dollars.
    #[arg(long, default_value_t = 1300.0)]
    pub insurance: f64,

    /// Vacancy rate as a fraction of the year.
    #[arg(long, default_value_t = 0.05)]
    pub vacancy: f64,

    /// Annual property tax as a fraction of home value.
    #[arg(long = "property-tax", default_value_t = 0.0041)]
    pub property_tax: f64,

    /// Management fee as a fraction of collected rent.
    #[arg(long, default_value_t = 0.08)]
    pub management: f64,

    /// Capital-expenditure reserve in dollars per month.
    #[arg(long, default_value_t = 300.0)]
    pub capex: f64,

    /// Marginal income tax rate.
    #[arg(long = "marginal-tax", default_value_t = 0.24)]
    pub marginal_tax: f64,

    /// Structure share of the purchase price (land does not depreciate).
    #[arg(long = "structure-share", default_value_t = 0.85)]
    pub structure_share: f64,

    /// Annual home-price appreciation.
    #[arg(long, default_value_t = 0.03)]
    pub appreciation: f64,

    /// Holding period in years.
    #[arg(long, default_value_t = 5)]
    pub horizon: u32,

    /// Loan term in years.
    #[arg(long = "loan-term", default_value_t = 30)]
    pub loan_term: u32,

    /// Depreciation recovery period in years.
    #[arg(long = "depreciation-years", default_value_t = 27.5)]
    pub depreciation_years: f64,
}

impl AssumptionArgs {
    pub fn to_assumptions(&self) -> Assumptions {
        Assumptions {
            down_payment_pct: self.down,
            interest_rate: self.rate,
            closing_cost_pct: self.closing,
            maintenance_pct: self.maintenance,
            insurance_annual: self.insurance,
            vacancy_rate: self.vacancy,
            property_tax_pct: self.property_tax,
            management_pct: self.management,
            capex_monthly: self.capex,
            marginal_tax_pct: self.marginal_tax,
            structure_value_pct: self.structure_share,
            appreciation_pct: self.appreciation,
            horizon_years: self.horizon,
            loan_term_years: self.loan_term,
            depreciation_years: self.depreciation_years,
        }
    }
}
