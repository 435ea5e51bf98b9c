//! Option schema types: the declared shape each actor class publishes for
//! its `options` mapping (§4.3).

use std::collections::HashMap;

use serde_json::Value;

use crate::err::{Error, Result};

/// Whether an option must be supplied, and its default when it need not
/// be ("default-or-required-marker" in spec terms).
#[derive(Debug, Clone)]
pub enum OptionRequirement {
    /// Absence is a validation error, not a silent default.
    Required,
    /// Filled in with this value when the caller omits the option.
    Optional(Value),
}

/// A primitive or self-validating option type.
#[derive(Debug, Clone)]
pub enum OptionType {
    String,
    Integer,
    Number,
    Boolean,
    Mapping,
    Sequence,
    /// Self-validating: the value must be one of the given strings.
    OneOf(Vec<String>),
    /// Self-validating: the value must satisfy a JSON-Schema-like schema.
    JsonSchema(Value),
}

impl OptionType {
    /// Accepts or raises `InvalidOption` for `value`, per the type's own
    /// rules (§4.3 item 4).
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        let ok = match self {
            OptionType::String => value.is_string(),
            // Token substitution always yields strings, so a document is
            // free to write a numeric option as `5` or as `"%T%"` —
            // either a native JSON number or a string parseable as one
            // is accepted.
            OptionType::Integer => {
                value.is_i64() || value.is_u64() || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
            }
            OptionType::Number => value.is_number() || value.as_str().is_some_and(|s| s.parse::<f64>().is_ok()),
            OptionType::Boolean => value.is_boolean(),
            OptionType::Mapping => value.is_object(),
            OptionType::Sequence => value.is_array(),
            OptionType::OneOf(allowed) => {
                return match value.as_str() {
                    Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
                    Some(s) => Err(Error::InvalidOption {
                        name: name.to_string(),
                        message: format!("'{s}' is not one of {allowed:?}"),
                    }),
                    None => Err(Error::InvalidOption {
                        name: name.to_string(),
                        message: "expected a string".to_string(),
                    }),
                };
            }
            OptionType::JsonSchema(schema) => {
                return validate_against_schema(name, schema, value);
            }
        };

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidOption {
                name: name.to_string(),
                message: format!("value does not match declared type {self:?}"),
            })
        }
    }
}

fn validate_against_schema(name: &str, schema: &Value, value: &Value) -> Result<()> {
    let compiled = jsonschema::JSONSchema::compile(schema).map_err(|e| Error::InvalidOption {
        name: name.to_string(),
        message: format!("option declares an invalid schema: {e}"),
    })?;
    if let Err(errors) = compiled.validate(value) {
        let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
        return Err(Error::InvalidOption {
            name: name.to_string(),
            message,
        });
    }
    Ok(())
}

/// One actor class's declared option: `name → (type, default-or-required,
/// doc-string)` (§4.3).
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub ty: OptionType,
    pub requirement: OptionRequirement,
    pub doc: &'static str,
}

impl OptionSpec {
    pub fn required(ty: OptionType, doc: &'static str) -> Self {
        Self {
            ty,
            requirement: OptionRequirement::Required,
            doc,
        }
    }

    pub fn optional(ty: OptionType, default: Value, doc: &'static str) -> Self {
        Self {
            ty,
            requirement: OptionRequirement::Optional(default),
            doc,
        }
    }
}

/// An actor class's full declared option schema.
pub type OptionSchema = HashMap<&'static str, OptionSpec>;
