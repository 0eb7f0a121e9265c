//! Canonical catalog types
//!
//! Everything downstream of the schema normalizer works with these shapes
//! only; legacy parameter layouts never leak past `normalizer`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declared type of a query parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    #[default]
    String,
    Number,
    Date,
    Select,
    /// Type name this service does not check (validated like `String`).
    /// Kept verbatim so the catalog round-trips.
    Other(String),
}

impl ParamType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "string" => ParamType::String,
            "number" => ParamType::Number,
            "date" => ParamType::Date,
            "select" => ParamType::Select,
            _ => ParamType::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Date => "date",
            ParamType::Select => "select",
            ParamType::Other(name) => name,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ParamType::parse(&name))
    }
}

/// Canonical parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, only meaningful for `select`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type,
            required,
            options: None,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Options as a slice; empty when none were declared
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }
}

/// A parameterized query available for planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl QueryDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
