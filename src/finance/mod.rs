//! Financing and return math: amortization schedules and the per-property
//! return decomposition.

pub mod amortize;
pub mod returns;

pub use amortize::*;
pub use returns::*;
