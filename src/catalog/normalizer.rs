//! Parameter schema normalization
//!
//! Catalog files carry parameter declarations in one of two historical
//! layouts:
//!
//! ```yaml
//! # mapping shape: name -> spec, optional unless stated
//! parameters:
//!   agent_id: { type: string, required: true }
//!   region:   { type: select, options: [EAST, WEST] }
//!
//! # sequence shape: list of specs, required unless stated
//! parameters:
//!   - { name: agent_id, type: string }
//!   - { name: region, type: select, options: [EAST, WEST], required: false }
//! ```
//!
//! The shape is resolved exactly once here, into `Vec<ParameterSpec>`.

use serde_yaml::{Mapping, Value};

use super::types::{ParamType, ParameterSpec};

/// Raw parameter declaration as found in a catalog entry
#[derive(Debug)]
pub(crate) enum RawParameters<'a> {
    Absent,
    /// name -> spec object (`required` defaults to false)
    Mapping(&'a Mapping),
    /// list of spec objects (`required` defaults to true)
    Sequence(&'a [Value]),
    Unsupported,
}

impl<'a> RawParameters<'a> {
    pub(crate) fn classify(raw: Option<&'a Value>) -> Self {
        match raw {
            None | Some(Value::Null) => RawParameters::Absent,
            Some(Value::Mapping(map)) => RawParameters::Mapping(map),
            Some(Value::Sequence(items)) => RawParameters::Sequence(items),
            Some(Value::Tagged(tagged)) => RawParameters::classify(Some(&tagged.value)),
            Some(_) => RawParameters::Unsupported,
        }
    }
}

/// Normalize a raw parameter declaration into canonical, ordered specs.
///
/// Never fails: unsupported shapes and malformed entries are dropped.
pub fn normalize(raw: Option<&Value>) -> Vec<ParameterSpec> {
    match RawParameters::classify(raw) {
        RawParameters::Absent => Vec::new(),
        RawParameters::Mapping(map) => map
            .iter()
            .filter_map(|(key, spec)| {
                let name = scalar_text(key)?;
                Some(spec_from_fields(name, spec.as_mapping(), false))
            })
            .collect(),
        RawParameters::Sequence(items) => items
            .iter()
            .filter_map(|item| {
                let fields = item.as_mapping()?;
                let name = fields.get("name").and_then(scalar_text)?;
                Some(spec_from_fields(name, Some(fields), true))
            })
            .collect(),
        RawParameters::Unsupported => {
            tracing::debug!("Ignoring parameter declaration of unsupported shape");
            Vec::new()
        }
    }
}

fn spec_from_fields(name: String, fields: Option<&Mapping>, required_default: bool) -> ParameterSpec {
    let field = |key: &str| fields.and_then(|f| f.get(key));

    let param_type = field("type")
        .and_then(scalar_text)
        .map(|t| ParamType::parse(&t))
        .unwrap_or_default();

    let required = field("required")
        .and_then(Value::as_bool)
        .unwrap_or(required_default);

    let options = field("options")
        .and_then(Value::as_sequence)
        .map(|items| items.iter().filter_map(scalar_text).collect());

    ParameterSpec {
        name,
        param_type,
        required,
        options,
    }
}

/// Text of a YAML scalar; `None` for null, mappings and sequences
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_absent_parameters_yield_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn test_mapping_shape_defaults_to_optional() {
        let raw = yaml("a: { type: number }");
        let specs = normalize(Some(&raw));
        assert_eq!(specs, vec![ParameterSpec::new("a", ParamType::Number, false)]);
    }

    #[test]
    fn test_sequence_shape_defaults_to_required() {
        let raw = yaml("- { name: a, type: number }");
        let specs = normalize(Some(&raw));
        assert_eq!(specs, vec![ParameterSpec::new("a", ParamType::Number, true)]);
    }

    #[test]
    fn test_mapping_shape_preserves_insertion_order_and_options() {
        let raw = yaml(
            r#"
zeta: { type: string, required: true }
alpha: { type: select, options: [EAST, WEST] }
mid: { type: date }
"#,
        );
        let specs = normalize(Some(&raw));
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(specs[0].required);
        assert_eq!(specs[1].options(), &["EAST".to_string(), "WEST".to_string()][..]);
        assert!(specs[2].options.is_none());
    }

    #[test]
    fn test_sequence_shape_keeps_explicit_fields() {
        let raw = yaml(
            r#"
- { name: region, type: select, options: [EAST, WEST], required: false }
- { name: day, type: date }
"#,
        );
        let specs = normalize(Some(&raw));
        assert_eq!(specs.len(), 2);
        assert!(!specs[0].required);
        assert_eq!(specs[0].param_type, ParamType::Select);
        assert!(specs[1].required);
    }

    #[test]
    fn test_missing_type_defaults_to_string() {
        let raw = yaml("note: {}");
        assert_eq!(normalize(Some(&raw))[0].param_type, ParamType::String);
    }

    #[test]
    fn test_nameless_sequence_entries_are_skipped() {
        let raw = yaml(
            r#"
- { type: number }
- plain string entry
- { name: kept }
"#,
        );
        let specs = normalize(Some(&raw));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "kept");
    }

    #[test]
    fn test_unsupported_shapes_degrade_to_empty() {
        assert!(normalize(Some(&yaml("just a string"))).is_empty());
        assert!(normalize(Some(&yaml("42"))).is_empty());
    }

    #[test]
    fn test_numeric_options_become_text() {
        let raw = yaml("quarter: { type: select, options: [1, 2, 3, 4] }");
        assert_eq!(normalize(Some(&raw))[0].options().len(), 4);
        assert_eq!(normalize(Some(&raw))[0].options()[0], "1");
    }

    fn arb_spec() -> impl Strategy<Value = ParameterSpec> {
        let types = prop_oneof![
            Just(ParamType::String),
            Just(ParamType::Number),
            Just(ParamType::Date),
            Just(ParamType::Select),
        ];
        (
            types,
            any::<bool>(),
            proptest::option::of(proptest::collection::vec("[A-Z]{1,6}", 0..4)),
        )
            .prop_map(|(param_type, required, options)| ParameterSpec {
                name: String::new(),
                param_type,
                required,
                options,
            })
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(specs in proptest::collection::vec(arb_spec(), 0..6)) {
            let canonical: Vec<ParameterSpec> = specs
                .into_iter()
                .enumerate()
                .map(|(i, mut s)| { s.name = format!("param_{i}"); s })
                .collect();

            let once = normalize(Some(&serde_yaml::to_value(&canonical).unwrap()));
            let twice = normalize(Some(&serde_yaml::to_value(&once).unwrap()));

            prop_assert_eq!(&once, &canonical);
            prop_assert_eq!(once, twice);
        }
    }
}
