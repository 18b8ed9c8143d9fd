//! Rent estimation: the cross-segment log-log regression and its fitted model.

pub mod fit;
pub mod model;

pub use fit::*;
pub use model::*;
