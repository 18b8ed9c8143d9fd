//! Shared pipeline logic used by every CLI subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (CSV pair or demo) -> align dataset -> fit rent model -> restrict
//!
//! Subcommands then layer projection, residual, or deal analysis on top.

use crate::cli::DataArgs;
use crate::data::{DemoConfig, generate_demo_market};
use crate::domain::{MarketDataset, load_market_dataset};
use crate::error::AppError;
use crate::io::ingest::{RowError, read_labels, read_value_rows};
use crate::rent::{RentModel, fit_rent_model};

/// Loaded inputs and the fitted model, shared by all subcommands.
#[derive(Debug)]
pub struct MarketRun {
    pub dataset: MarketDataset,
    pub model: RentModel,
    /// Ingest-side problems worth surfacing (bad cells, bad label rows).
    pub row_errors: Vec<RowError>,
}

/// Load market data per `DataArgs`, align it, and fit the rent model.
///
/// The model is always fit on every usable segment; a `--labels` file
/// narrows which segments get projected and reported, not the fit.
pub fn load_market(data: &DataArgs) -> Result<MarketRun, AppError> {
    // 1) Collect long-form value rows from the demo generator or the CSV pair.
    let (home_rows, rent_rows, mut row_errors) = if data.demo {
        let demo = generate_demo_market(&DemoConfig {
            segments: data.demo_segments,
            months: data.demo_months,
            seed: data.seed,
            asof: data.asof,
        })?;
        (demo.home_rows, demo.rent_rows, Vec::new())
    } else {
        let (Some(home), Some(rent)) = (&data.home, &data.rent) else {
            return Err(AppError::new(
                2,
                "Provide --home and --rent CSVs, or use --demo.",
            ));
        };
        let home_in = read_value_rows(home)?;
        let rent_in = read_value_rows(rent)?;
        let mut errors = home_in.row_errors;
        errors.extend(rent_in.row_errors);
        (home_in.rows, rent_in.rows, errors)
    };

    // 2) Align the two panels into one dataset.
    let dataset = load_market_dataset(&home_rows, &rent_rows)?;

    // 3) Fit the cross-segment rent model on the full dataset.
    let model = fit_rent_model(&dataset)?;

    // 4) Optionally restrict to labeled segments.
    let dataset = match &data.labels {
        Some(path) => {
            let ingest = read_labels(path)?;
            row_errors.extend(ingest.row_errors);
            dataset.restrict_to(&ingest.labels)
        }
        None => dataset,
    };
    if dataset.is_empty() {
        return Err(AppError::new(
            3,
            "No segments remain after applying --labels.",
        ));
    }

    Ok(MarketRun {
        dataset,
        model,
        row_errors,
    })
}
