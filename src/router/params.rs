//! Schema validation and coercion for extracted route parameters
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;

use regex::Regex;

use crate::definitions::{ParamKind, ParamValue, ParamsSchema};

/// Validate raw extracted parameters against a schema and coerce them.
///
/// Every schema field must be present among the extracted parameters;
/// parameters the schema does not mention pass through as strings. The
/// returned reason string feeds `RouteError::InvalidParams`.
pub fn validate_params(
    raw: &BTreeMap<String, String>,
    schema: &ParamsSchema,
) -> Result<BTreeMap<String, ParamValue>, String> {
    let mut validated = BTreeMap::new();

    for (name, spec) in &schema.fields {
        let value = raw
            .get(name)
            .ok_or_else(|| format!("required param \"{name}\" is missing"))?;

        if let Some(pattern) = &spec.pattern {
            let regex = Regex::new(&anchored(pattern))
                .map_err(|e| format!("param \"{name}\" has an invalid pattern: {e}"))?;
            if !regex.is_match(value) {
                return Err(format!(
                    "param \"{name}\" value \"{value}\" does not match pattern {pattern}"
                ));
            }
        }

        let coerced = coerce(name, value, spec.kind)?;

        if let ParamValue::Integer(n) = coerced {
            if let Some(min) = spec.min {
                if n < min {
                    return Err(format!("param \"{name}\" must be at least {min}"));
                }
            }
            if let Some(max) = spec.max {
                if n > max {
                    return Err(format!("param \"{name}\" must be at most {max}"));
                }
            }
        }
        if let ParamValue::Number(n) = coerced {
            if let Some(min) = spec.min {
                if n < min as f64 {
                    return Err(format!("param \"{name}\" must be at least {min}"));
                }
            }
            if let Some(max) = spec.max {
                if n > max as f64 {
                    return Err(format!("param \"{name}\" must be at most {max}"));
                }
            }
        }

        validated.insert(name.clone(), coerced);
    }

    for (name, value) in raw {
        validated
            .entry(name.clone())
            .or_insert_with(|| ParamValue::String(value.clone()));
    }

    Ok(validated)
}

fn coerce(name: &str, value: &str, kind: ParamKind) -> Result<ParamValue, String> {
    match kind {
        ParamKind::String => Ok(ParamValue::String(value.to_string())),
        ParamKind::Integer => value
            .parse::<i64>()
            .map(ParamValue::Integer)
            .map_err(|_| format!("param \"{name}\" value \"{value}\" is not an integer")),
        ParamKind::Number => value
            .parse::<f64>()
            .map(ParamValue::Number)
            .map_err(|_| format!("param \"{name}\" value \"{value}\" is not a number")),
        ParamKind::Bool => match value {
            "true" | "1" => Ok(ParamValue::Bool(true)),
            "false" | "0" => Ok(ParamValue::Bool(false)),
            _ => Err(format!(
                "param \"{name}\" value \"{value}\" is not a boolean"
            )),
        },
    }
}

/// Patterns match the whole value, not a substring.
fn anchored(pattern: &str) -> String {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    let pattern = pattern.strip_suffix('$').unwrap_or(pattern);
    format!("^{pattern}$")
}
