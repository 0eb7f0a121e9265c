//! Sentinel detection
//!
//! The backend is told to write `NOT_PROVIDED` for values it cannot infer
//! from the request. Those are not validation failures: the service asks
//! the user for them instead.

use serde::Serialize;

use super::validator::is_sentinel;
use crate::catalog::Catalog;
use crate::plan::Plan;

/// Type reported when the query or parameter is not in the catalog
pub const UNKNOWN_TYPE: &str = "value";

const CLARIFICATION_LEAD: &str =
    "I need a few more details before I can run this. Please provide:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingParameter {
    pub query: String,
    pub parameter: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingValueReport {
    pub entries: Vec<MissingParameter>,
}

impl MissingValueReport {
    pub fn has_missing(&self) -> bool {
        !self.entries.is_empty()
    }

    /// One bullet per entry, underscores in parameter names shown as spaces
    pub fn clarification(&self) -> String {
        let mut message = String::from(CLARIFICATION_LEAD);
        for entry in &self.entries {
            message.push_str(&format!(
                "\n- {} ({}) for '{}'",
                entry.parameter.replace('_', " "),
                entry.param_type,
                entry.query
            ));
        }
        message
    }
}

/// Collect sentinel values in step order, then parameter order
pub fn detect(plan: &Plan, catalog: &Catalog) -> MissingValueReport {
    let Some(steps) = plan.steps() else {
        return MissingValueReport::default();
    };

    let entries = steps
        .iter()
        .flat_map(|step| {
            let query = catalog.get(&step.name);
            step.parameters
                .iter()
                .filter(|(_, value)| is_sentinel(value))
                .map(move |(parameter, _)| MissingParameter {
                    query: step.name.clone(),
                    parameter: parameter.clone(),
                    param_type: query
                        .and_then(|q| q.parameter(parameter))
                        .map(|p| p.param_type.to_string())
                        .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
                })
        })
        .collect();

    MissingValueReport { entries }
}
