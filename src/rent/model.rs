//! Fitted rent model: prediction, residuals, and the shared read handle.
//!
//! The model is a two-parameter power law estimated in log space:
//!
//! ```text
//! ln(rent) = intercept + slope * ln(price)
//! ```
//!
//! Prediction inverts it via exponentiation, so a valid model always predicts
//! a positive rent. The model is fit once per dataset and then only read;
//! [`SharedRentModel`] provides the copy-on-write handle for callers that
//! refit while predictions are in flight.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::domain::MarketSegment;
use crate::error::{EngineError, Result};

/// Fitted log-log relationship between home price and monthly rent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentModel {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination on the log scale (how the model quality
    /// is quoted alongside the equation).
    pub r_squared: f64,
    pub n_samples: usize,
}

impl RentModel {
    /// Estimated monthly rent for a home price.
    ///
    /// Fails with `InvalidInput` for a non-positive or non-finite price
    /// (the log transform is undefined there).
    pub fn predict(&self, price: f64) -> Result<f64> {
        if !price.is_finite() || price <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "price must be positive to predict rent, got {price}"
            )));
        }
        Ok((self.intercept + self.slope * price.ln()).exp())
    }

    /// Actual current rent minus predicted rent at the segment's current
    /// price. Positive means the segment out-earns the cross-segment trend.
    pub fn residual(&self, segment: &MarketSegment) -> Result<f64> {
        let price = segment.current_home_value().ok_or_else(|| {
            EngineError::InsufficientData(format!("segment {} has no home value", segment.zip))
        })?;
        let rent = segment.current_rent().ok_or_else(|| {
            EngineError::InsufficientData(format!("segment {} has no rent", segment.zip))
        })?;
        Ok(rent - self.predict(price)?)
    }

    /// Prediction anchored to one segment's observed level.
    ///
    /// Scales the fitted estimate by the segment's actual/predicted ratio, so
    /// a market that runs 10% above the cross-segment trend lifts the
    /// estimate for any price by the same 10%.
    pub fn predict_adjusted(&self, price: f64, segment: &MarketSegment) -> Result<f64> {
        let seg_price = segment.current_home_value().ok_or_else(|| {
            EngineError::InsufficientData(format!("segment {} has no home value", segment.zip))
        })?;
        let seg_rent = segment.current_rent().ok_or_else(|| {
            EngineError::InsufficientData(format!("segment {} has no rent", segment.zip))
        })?;
        if !seg_rent.is_finite() || seg_rent <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "segment {} rent must be positive to anchor a prediction, got {seg_rent}",
                segment.zip
            )));
        }
        let expected = self.predict(seg_price)?;
        let ratio = seg_rent / expected;
        Ok(self.predict(price)? * ratio)
    }
}

/// The "1% rule" screening figure: one percent of the purchase price as
/// monthly rent. A manual cross-check reported next to the regression
/// estimate, never blended into it.
pub fn one_percent_rent(price: f64) -> f64 {
    rent_for_yield(price, 0.01)
}

/// Generalization of the 1% rule to an arbitrary monthly yield
/// (`rent_for_yield(price, 0.01)` is the classic rule).
pub fn rent_for_yield(price: f64, monthly_yield: f64) -> f64 {
    price * monthly_yield
}

/// Copy-on-write handle for the fit-once / read-many model lifecycle.
///
/// Readers take an `Arc` snapshot and keep using it for however long their
/// request lasts; `replace` swaps the whole model under the lock, so no
/// reader ever observes a half-updated slope/intercept pair.
#[derive(Debug)]
pub struct SharedRentModel {
    inner: RwLock<Arc<RentModel>>,
}

impl SharedRentModel {
    pub fn new(model: RentModel) -> Self {
        Self {
            inner: RwLock::new(Arc::new(model)),
        }
    }

    /// Current model snapshot. Cheap (one atomic increment).
    pub fn snapshot(&self) -> Arc<RentModel> {
        // A poisoned lock means some writer panicked, but the stored Arc is
        // always a complete model, so recover it rather than propagate.
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a freshly fitted model.
    pub fn replace(&self, model: RentModel) {
        let next = Arc::new(model);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;
    use chrono::NaiveDate;

    fn model() -> RentModel {
        // Calibrated so that a $300k home predicts exactly $1800/mo.
        let slope = 0.62;
        let intercept = 1800.0_f64.ln() - slope * 300_000.0_f64.ln();
        RentModel {
            slope,
            intercept,
            r_squared: 0.81,
            n_samples: 120,
        }
    }

    fn segment(zip: &str, price: f64, rent: f64) -> MarketSegment {
        let period = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        MarketSegment {
            zip: zip.to_string(),
            label: None,
            home_values: vec![SeriesPoint {
                period,
                value: price,
            }],
            rents: vec![SeriesPoint {
                period,
                value: rent,
            }],
        }
    }

    #[test]
    fn predict_inverts_the_log_relationship() {
        let m = model();
        let rent = m.predict(300_000.0).unwrap();
        assert!((rent - 1800.0).abs() < 1e-9);
        // Doubling price on a 0.62 power law scales rent sub-linearly.
        let double = m.predict(600_000.0).unwrap();
        assert!((double / rent - 2.0_f64.powf(0.62)).abs() < 1e-9);
    }

    #[test]
    fn predict_rejects_non_positive_price() {
        let m = model();
        assert!(m.predict(0.0).is_err());
        assert!(m.predict(-1.0).is_err());
        assert!(m.predict(f64::NAN).is_err());
    }

    #[test]
    fn residual_sign_tracks_over_performance() {
        let m = model();
        let hot = segment("80301", 300_000.0, 2000.0);
        let cold = segment("80302", 300_000.0, 1500.0);
        assert!(m.residual(&hot).unwrap() > 0.0);
        assert!(m.residual(&cold).unwrap() < 0.0);
        assert!((m.residual(&hot).unwrap() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn adjusted_prediction_scales_by_segment_ratio() {
        let m = model();
        // This segment earns 10% above the fitted line at its own price.
        let seg = segment("80301", 300_000.0, 1980.0);
        let base = m.predict(450_000.0).unwrap();
        let adjusted = m.predict_adjusted(450_000.0, &seg).unwrap();
        assert!((adjusted / base - 1.1).abs() < 1e-9);
    }

    #[test]
    fn yield_rules() {
        assert!((one_percent_rent(300_000.0) - 3000.0).abs() < 1e-9);
        assert!((rent_for_yield(300_000.0, 0.007) - 2100.0).abs() < 1e-9);
        assert!((rent_for_yield(300_000.0, 0.01) - one_percent_rent(300_000.0)).abs() < 1e-12);
    }

    #[test]
    fn shared_model_snapshots_are_isolated_from_refits() {
        let shared = SharedRentModel::new(model());
        let before = shared.snapshot();

        let mut refit = model();
        refit.slope = 0.70;
        refit.n_samples = 240;
        shared.replace(refit);

        // The old snapshot still answers with the old coefficients.
        assert!((before.slope - 0.62).abs() < 1e-12);
        let after = shared.snapshot();
        assert!((after.slope - 0.70).abs() < 1e-12);
        assert_eq!(after.n_samples, 240);
    }
}
