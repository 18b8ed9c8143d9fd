//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - market observations and aligned segments (`ValueRow`, `MarketSegment`)
//! - the dataset builder (`load_market_dataset`)
//! - financial assumptions and return decompositions (`Assumptions`,
//!   `ReturnResult`)

pub mod dataset;
pub mod types;

pub use dataset::*;
pub use types::*;
