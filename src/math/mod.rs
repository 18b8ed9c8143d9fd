//! Mathematical utilities: least squares on small design matrices.

pub mod ols;

pub use ols::*;
