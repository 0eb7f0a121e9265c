use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One step of a drafted plan.
///
/// Shape is not validated on extraction: absent fields take their defaults
/// and loosely typed values are coerced (see the `lenient_*` helpers).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default, deserialize_with = "lenient_step")]
    pub step: i64,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_parameters")]
    pub parameters: Map<String, Value>,
    /// Human-readable note on diagnostic steps
    #[serde(
        default,
        deserialize_with = "lenient_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

/// Integer, integral float or numeric string; anything else is 0
fn lenient_step<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let step = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    Ok(step.unwrap_or_default())
}

/// Strings verbatim, `null` empty, other scalars by their JSON text
fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Non-object parameters (including `null`) become an empty map
fn lenient_parameters<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn lenient_message<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl PlanStep {
    pub fn new(step: i64, name: impl Into<String>) -> Self {
        Self {
            step,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Extraction failure, carried back to the caller instead of raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// A drafted plan: either steps or the reason there are none.
///
/// Untagged on the wire, so a plan is a JSON array and a failure is an
/// `{error, raw}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Plan {
    Steps(Vec<PlanStep>),
    Failed(PlanFailure),
}

impl Plan {
    pub fn failed(error: impl Into<String>, raw: Option<String>) -> Self {
        Plan::Failed(PlanFailure {
            error: error.into(),
            raw,
        })
    }

    pub fn steps(&self) -> Option<&[PlanStep]> {
        match self {
            Plan::Steps(steps) => Some(steps),
            Plan::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Plan::Failed(_))
    }
}

impl From<Vec<PlanStep>> for Plan {
    fn from(steps: Vec<PlanStep>) -> Self {
        Plan::Steps(steps)
    }
}
