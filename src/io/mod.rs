//! Input/output helpers.
//!
//! - wide-format CSV ingest + validation (`ingest`)
//! - result exports and model JSON read/write (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
