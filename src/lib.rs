//! `rental-roi` library crate.
//!
//! The binary (`roi`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future dashboard/daemon, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod finance;
pub mod io;
pub mod math;
pub mod project;
pub mod rent;
pub mod report;
