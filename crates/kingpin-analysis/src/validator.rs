//! The Option Validator's entry point (§4.3).

use serde_json::{Map, Value};

use crate::err::{Error, Result};
use crate::types::{OptionRequirement, OptionSchema};

/// Validates `input` against `schema`, returning the fully-resolved option
/// map (defaults filled in) on success.
///
/// Order, matching §4.3:
/// 1. Fill missing optional options with their declared defaults.
/// 2. Reject unknown option keys.
/// 3. Require every required option to be present with a non-null value.
/// 4. Run each option's type validator.
pub fn validate_options(schema: &OptionSchema, input: &Map<String, Value>) -> Result<Map<String, Value>> {
    for key in input.keys() {
        if !schema.contains_key(key.as_str()) {
            return Err(Error::UnknownOption { name: key.clone() });
        }
    }

    let mut resolved = Map::new();
    for (&name, spec) in schema {
        let provided = input.get(name);
        let value = match (provided, &spec.requirement) {
            (Some(v), _) if !v.is_null() => v.clone(),
            (None, OptionRequirement::Optional(default)) => default.clone(),
            (Some(Value::Null), OptionRequirement::Optional(default)) => default.clone(),
            (_, OptionRequirement::Required) => {
                return Err(Error::MissingRequiredOption { name: name.to_string() })
            }
        };
        spec.ty.validate(name, &value)?;
        resolved.insert(name.to_string(), value);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OptionSpec, OptionType};
    use serde_json::json;

    fn sample_schema() -> OptionSchema {
        let mut schema = OptionSchema::new();
        schema.insert("sleep", OptionSpec::required(OptionType::Number, "seconds to sleep"));
        schema.insert(
            "message",
            OptionSpec::optional(OptionType::String, json!(""), "note message"),
        );
        schema
    }

    #[test]
    fn fills_missing_optional_defaults() {
        let schema = sample_schema();
        let input: Map<String, Value> = json!({"sleep": 1.0}).as_object().unwrap().clone();
        let resolved = validate_options(&schema, &input).unwrap();
        assert_eq!(resolved["message"], json!(""));
    }

    #[test]
    fn rejects_unknown_key() {
        let schema = sample_schema();
        let input: Map<String, Value> = json!({"sleep": 1.0, "bogus": 1}).as_object().unwrap().clone();
        assert!(matches!(validate_options(&schema, &input), Err(Error::UnknownOption { .. })));
    }

    #[test]
    fn rejects_missing_required() {
        let schema = sample_schema();
        let input: Map<String, Value> = json!({"message": "hi"}).as_object().unwrap().clone();
        assert!(matches!(
            validate_options(&schema, &input),
            Err(Error::MissingRequiredOption { .. })
        ));
    }

    #[test]
    fn required_absent_is_error_not_silent_default() {
        let schema = sample_schema();
        let input: Map<String, Value> = json!({}).as_object().unwrap().clone();
        assert!(validate_options(&schema, &input).is_err());
    }

    #[test]
    fn rejects_wrong_type() {
        let schema = sample_schema();
        let input: Map<String, Value> = json!({"sleep": "not a number"}).as_object().unwrap().clone();
        assert!(validate_options(&schema, &input).is_err());
    }

    #[test]
    fn one_of_rejects_value_outside_set() {
        let mut schema = OptionSchema::new();
        schema.insert(
            "state",
            OptionSpec::required(OptionType::OneOf(vec!["present".into(), "absent".into()]), "desired state"),
        );
        let input: Map<String, Value> = json!({"state": "bogus"}).as_object().unwrap().clone();
        assert!(validate_options(&schema, &input).is_err());
    }
}
