//! Conversion-funnel aggregation and insight synthesis.
//!
//! This module groups normalized events by categorical dimensions, computes
//! cohort-windowed conversion rates, and derives the best/worst-segment
//! insights and projections included in the result bundle.

pub mod aggregate;
pub mod analyzer;
pub mod insights;
pub mod types;
pub mod utility;
pub mod window;
