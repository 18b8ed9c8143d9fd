//! Projection aggregator: run the return calculator across segments.
//!
//! Responsibilities:
//!
//! - evaluate one segment at its actual current price and rent
//! - map the whole dataset in parallel, keeping input order and isolating
//!   per-segment failures instead of aborting the batch
//! - evaluate an ad-hoc deal, resolving its rent from an override or from
//!   the fitted model (anchored to a segment when one is named)
//!
//! Per-segment work is small and bounded, so a plain parallel map over the
//! segment list is the whole concurrency story; no queues or shared state.

use rayon::prelude::*;

use crate::domain::{Assumptions, MarketDataset, MarketSegment, ProjectionRow, ReturnResult};
use crate::error::{EngineError, Result};
use crate::finance::evaluate;
use crate::rent::{RentModel, one_percent_rent};

/// Batch output: successful rows in input segment order, failures isolated.
#[derive(Debug, Clone)]
pub struct ProjectionSet {
    pub rows: Vec<ProjectionRow>,
    /// One `SegmentEvaluation` per failed segment.
    pub failures: Vec<EngineError>,
}

/// Where the rent figure for a deal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentSource {
    /// Caller-supplied figure, model not consulted.
    Override,
    /// Model prediction anchored to a named segment's observed level.
    ModelAdjusted,
    /// Plain cross-segment model prediction.
    Model,
}

/// An ad-hoc deal evaluation with its rent provenance.
#[derive(Debug, Clone)]
pub struct DealAnalysis {
    pub price: f64,
    pub zip: Option<String>,
    /// Monthly rent the projection used.
    pub rent: f64,
    pub rent_source: RentSource,
    /// The 1% screening figure for this price, for side-by-side display.
    pub one_percent_rent: f64,
    pub result: ReturnResult,
}

/// Evaluate one segment at its current observed values.
pub fn evaluate_segment(
    segment: &MarketSegment,
    assumptions: &Assumptions,
) -> Result<ReturnResult> {
    project_segment(segment, assumptions).map(|row| row.result)
}

/// Evaluate every segment under one assumption set.
///
/// Fails fast only for invalid assumptions; anything that goes wrong inside
/// a single segment becomes a recorded [`EngineError::SegmentEvaluation`] in
/// the failure channel while the rest of the batch completes.
pub fn project_all(dataset: &MarketDataset, assumptions: &Assumptions) -> Result<ProjectionSet> {
    assumptions.validate()?;

    let evaluated: Vec<Result<ProjectionRow>> = dataset
        .segments
        .par_iter()
        .map(|segment| {
            project_segment(segment, assumptions).map_err(|source| {
                EngineError::SegmentEvaluation {
                    zip: segment.zip.clone(),
                    source: Box::new(source),
                }
            })
        })
        .collect();

    let mut rows = Vec::with_capacity(evaluated.len());
    let mut failures = Vec::new();
    for item in evaluated {
        match item {
            Ok(row) => rows.push(row),
            Err(err) => failures.push(err),
        }
    }
    Ok(ProjectionSet { rows, failures })
}

/// Evaluate a property that need not be in the dataset.
///
/// Rent resolution order: explicit override first, else the model prediction,
/// anchored to `zip`'s segment when one is named. A named ZIP must exist in
/// the dataset; prefer omitting it over guessing.
pub fn evaluate_deal(
    model: &RentModel,
    dataset: &MarketDataset,
    price: f64,
    zip: Option<&str>,
    assumptions: &Assumptions,
    rent_override: Option<f64>,
) -> Result<DealAnalysis> {
    let segment = match zip {
        Some(z) => Some(dataset.segment(z).ok_or_else(|| {
            EngineError::InvalidInput(format!("zip {z} is not in the dataset"))
        })?),
        None => None,
    };

    let (rent, rent_source) = match (rent_override, segment) {
        (Some(rent), _) => (rent, RentSource::Override),
        (None, Some(seg)) => (model.predict_adjusted(price, seg)?, RentSource::ModelAdjusted),
        (None, None) => (model.predict(price)?, RentSource::Model),
    };

    let result = evaluate(price, rent, assumptions)?;
    Ok(DealAnalysis {
        price,
        zip: zip.map(str::to_string),
        rent,
        rent_source,
        one_percent_rent: one_percent_rent(price),
        result,
    })
}

fn project_segment(segment: &MarketSegment, assumptions: &Assumptions) -> Result<ProjectionRow> {
    let home_value = segment.current_home_value().ok_or_else(|| {
        EngineError::InsufficientData(format!("segment {} has no home value", segment.zip))
    })?;
    let rent = segment.current_rent().ok_or_else(|| {
        EngineError::InsufficientData(format!("segment {} has no rent", segment.zip))
    })?;
    let result = evaluate(home_value, rent, assumptions)?;
    Ok(ProjectionRow {
        zip: segment.zip.clone(),
        label: segment.label.clone(),
        home_value,
        rent,
        result,
    })
}
