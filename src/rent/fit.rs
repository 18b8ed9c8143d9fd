//! Fit the log-log rent regression.
//!
//! Given cross-segment samples of (home price, monthly rent) we solve an
//! ordinary least squares problem in log space:
//!
//! ```text
//! minimize Σ (ln(rent_i) - intercept - slope·ln(price_i))^2
//! ```
//!
//! Non-positive pairs are dropped before the transform (log undefined), and
//! the fit refuses to run when the slope is unidentifiable (fewer than two
//! distinct prices).

use nalgebra::{DMatrix, DVector};

use crate::domain::MarketDataset;
use crate::error::{EngineError, Result};
use crate::math::solve_least_squares;
use crate::rent::model::RentModel;

/// Fit over raw (price, rent) samples.
pub fn fit(samples: &[(f64, f64)]) -> Result<RentModel> {
    let usable: Vec<(f64, f64)> = samples
        .iter()
        .copied()
        .filter(|(p, r)| p.is_finite() && r.is_finite() && *p > 0.0 && *r > 0.0)
        .collect();

    let n = usable.len();
    if n < 2 {
        return Err(EngineError::InsufficientData(format!(
            "need at least 2 positive (price, rent) samples, got {n}"
        )));
    }
    let first_price = usable[0].0;
    if usable.iter().all(|(p, _)| *p == first_price) {
        return Err(EngineError::InsufficientData(
            "all sample prices are identical; the price slope is unidentifiable".to_string(),
        ));
    }

    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut y = DVector::<f64>::zeros(n);
    for (i, (price, rent)) in usable.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = price.ln();
        y[i] = rent.ln();
    }

    let beta = solve_least_squares(&x, &y).ok_or_else(|| {
        EngineError::InsufficientData("rent regression system is degenerate".to_string())
    })?;
    let intercept = beta[0];
    let slope = beta[1];

    // R² on the log scale. A flat target series (zero total variance) is
    // either fit perfectly or not at all.
    let y_bar = y.mean();
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..n {
        let fitted = intercept + slope * x[(i, 1)];
        ss_res += (y[i] - fitted) * (y[i] - fitted);
        ss_tot += (y[i] - y_bar) * (y[i] - y_bar);
    }
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res < 1e-12 {
        1.0
    } else {
        0.0
    };

    Ok(RentModel {
        slope,
        intercept,
        r_squared,
        n_samples: n,
    })
}

/// Fit over every segment's current (price, rent) pair.
///
/// This is the whole-dataset fit: the model should be trained on the full
/// cross-segment sample even when projection later narrows to a subset.
pub fn fit_rent_model(dataset: &MarketDataset) -> Result<RentModel> {
    let samples: Vec<(f64, f64)> = dataset
        .segments
        .iter()
        .filter_map(|s| Some((s.current_home_value()?, s.current_rent()?)))
        .collect();
    fit(&samples)
}
