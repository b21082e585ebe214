//! Reconstruction of daily COVID-19 testing series.
//!
//! Two pipelines share the [`frame`] model:
//!
//! - extraction: [`dates`] → [`fetch`] → [`parser`], driven over a range by [`backfill`]
//! - normalization: [`analyzers`] align, aggregate and resample date-indexed frames

pub mod analyzers;
pub mod backfill;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod frame;
pub mod input;
pub mod output;
pub mod parser;
pub mod telemetry;

pub use error::{Error, Result};
