//! Plan checks run before execution
//!
//! Sentinel detection (`missing`) runs first; a plan with `NOT_PROVIDED`
//! values gets a clarification request rather than a validation error.

pub mod missing;
pub mod validator;

pub use missing::{detect, MissingParameter, MissingValueReport};
pub use validator::{
    is_sentinel, validate, validate_plan_steps, validate_step, ParameterViolation, StepViolation,
    ValidationOutcome, SENTINEL,
};
