//! Parameter validation for plan steps
//!
//! Checks run in the query's declared parameter order and stop at the first
//! violation, so the reported message is deterministic.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::catalog::{Catalog, ParamType, QueryDefinition};
use crate::plan::PlanStep;

/// Value the backend uses when it could not determine a parameter
pub const SENTINEL: &str = "NOT_PROVIDED";

/// `YYYY-MM-DD` shape; calendar validity is checked separately
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("literal date pattern compiles"));

// =============================================================================
// ERROR TYPES
// =============================================================================

/// First rule a step's parameters break
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterViolation {
    #[error("Missing or empty required parameter '{parameter}'")]
    Missing { parameter: String },

    #[error("Parameter '{parameter}' must be a number, got '{value}'")]
    NotANumber { parameter: String, value: String },

    #[error("Parameter '{parameter}' must be a valid date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { parameter: String, value: String },

    #[error("Parameter '{parameter}' must be one of [{}], got '{value}'", .options.join(", "))]
    NotAnOption {
        parameter: String,
        value: String,
        options: Vec<String>,
    },

    #[error("Unknown query '{query}'")]
    UnknownQuery { query: String },
}

impl ParameterViolation {
    /// Parameter the violation is about, if any
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ParameterViolation::Missing { parameter }
            | ParameterViolation::NotANumber { parameter, .. }
            | ParameterViolation::InvalidDate { parameter, .. }
            | ParameterViolation::NotAnOption { parameter, .. } => Some(parameter),
            ParameterViolation::UnknownQuery { .. } => None,
        }
    }
}

/// `(valid, message)` view of a validation result; message is empty when valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
}

impl From<Result<(), ParameterViolation>> for ValidationOutcome {
    fn from(result: Result<(), ParameterViolation>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                message: String::new(),
            },
            Err(violation) => Self {
                valid: false,
                message: violation.to_string(),
            },
        }
    }
}

/// A step that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepViolation {
    pub query: String,
    pub message: String,
    #[serde(skip)]
    pub violation: ParameterViolation,
}

// =============================================================================
// SCALAR HELPERS
// =============================================================================

/// Text form of a provided value; strings verbatim, other JSON via its text.
/// `null` is treated as absent.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// True when the value is the `NOT_PROVIDED` sentinel (trimmed, any case)
pub fn is_sentinel(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case(SENTINEL))
}

fn is_calendar_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
        && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validate provided parameters against a query's declarations
pub fn validate(
    query: &QueryDefinition,
    provided: &Map<String, Value>,
) -> Result<(), ParameterViolation> {
    for spec in &query.parameters {
        let text = provided.get(&spec.name).and_then(scalar_text);
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            if spec.required {
                return Err(ParameterViolation::Missing {
                    parameter: spec.name.clone(),
                });
            }
            continue;
        };

        if text.trim().eq_ignore_ascii_case(SENTINEL) {
            continue;
        }

        match &spec.param_type {
            ParamType::Number => {
                if text.trim().parse::<f64>().is_err() {
                    return Err(ParameterViolation::NotANumber {
                        parameter: spec.name.clone(),
                        value: text,
                    });
                }
            }
            ParamType::Date => {
                if !is_calendar_date(text.trim()) {
                    return Err(ParameterViolation::InvalidDate {
                        parameter: spec.name.clone(),
                        value: text,
                    });
                }
            }
            ParamType::Select => {
                let options = spec.options();
                if !options.is_empty() && !options.iter().any(|o| *o == text) {
                    return Err(ParameterViolation::NotAnOption {
                        parameter: spec.name.clone(),
                        value: text,
                        options: options.to_vec(),
                    });
                }
            }
            ParamType::String | ParamType::Other(_) => {}
        }
    }

    Ok(())
}

/// Validate one step against the catalog.
///
/// Steps naming a query that is not in the catalog pass unless `strict`.
pub fn validate_step(
    catalog: &Catalog,
    step: &PlanStep,
    strict: bool,
) -> Result<(), ParameterViolation> {
    match catalog.get(&step.name) {
        Some(query) => validate(query, &step.parameters),
        None if strict => Err(ParameterViolation::UnknownQuery {
            query: step.name.clone(),
        }),
        None => {
            warn!(query = %step.name, "Plan step names a query not in the catalog, skipping validation");
            Ok(())
        }
    }
}

/// Validate steps in order, stopping at the first failure
pub fn validate_plan_steps(
    catalog: &Catalog,
    steps: &[PlanStep],
    strict: bool,
) -> Result<(), StepViolation> {
    for step in steps {
        if let Err(violation) = validate_step(catalog, step, strict) {
            return Err(StepViolation {
                query: step.name.clone(),
                message: violation.to_string(),
                violation,
            });
        }
    }
    Ok(())
}
