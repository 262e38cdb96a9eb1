//! Comment eligibility pipeline.
//!
//! Every fetched comment flows through:
//! 1. `EligibilityPipeline::evaluate()` — ordered filter chain (length,
//!    thread activity, author cooldown, keyword match)
//! 2. classification — question vs statement, for template selection
//!
//! Skips are deliberate policy outcomes, never errors.

pub mod filters;
pub mod types;

pub use filters::{EligibilityPipeline, classify, first_keyword};
pub use types::{Classification, SkipReason, Verdict};
