//! Plans drafted by the generation backend

pub mod extractor;
mod types;

pub use extractor::{extract, PARSE_ERROR, PLAN_MARKER};
pub use types::{Plan, PlanFailure, PlanStep};
