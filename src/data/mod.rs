//! Data sources: the seeded synthetic demo market.

pub mod sample;

pub use sample::*;
