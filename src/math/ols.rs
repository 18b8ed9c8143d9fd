//! Least squares solver.
//!
//! The rent model is a single linear regression in log space:
//!
//! ```text
//! minimize Σ (ln(rent_i) - x_i^T β)^2    with x_i = [1, ln(price_i)]
//! ```
//!
//! Implementation choices:
//! - SVD solves the least-squares problem robustly even though the design
//!   matrix is tall (many segments, two columns). (Nalgebra's `QR::solve` is
//!   intended for square systems and will panic for non-square matrices.)
//! - Market data can make the two columns nearly collinear (prices clustered
//!   in a narrow band), so the solve tolerance is progressive rather than
//!   fixed.
//! - The parameter dimension is tiny, so SVD cost is irrelevant next to
//!   ingest.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance level yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
