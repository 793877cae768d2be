//! Core domain logic for validator yield analysis.
//!
//! This crate provides:
//! - Domain types (`types` module)
//! - Fixed-point reward and APY arithmetic (`reward` module)
//! - Ranking by yield (`rank` module)
//! - Display rows for printing (`display` module)
//! - Run configuration (`config` module)

pub mod config;
pub mod display;
pub mod rank;
pub mod reward;
pub mod types;

pub use config::{ConfigError, RunConfig};
pub use display::*;
pub use rank::*;
pub use reward::*;
pub use types::*;
