//! Date-series normalization and aggregation.
//!
//! Raw frames are aligned onto a gap-free calendar, renamed to canonical
//! measure names, optionally rolled up by month, and resampled into
//! two-week incidence rates.

pub mod aggregate;
pub mod align;
pub mod country;
pub mod incidence;
pub mod month;
pub mod types;
pub mod utility;
