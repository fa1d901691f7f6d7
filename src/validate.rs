//! Submission validation
//!
//! Checks an incoming payload against the schema and returns the list of
//! problems found (empty list means accepted). Two checks short-circuit, in
//! opposite directions: a missing gate answer fails immediately with a single
//! error, and a screened-out respondent passes immediately with no further
//! checks, since the gate answer is the only field they are shown. Every
//! other rule accumulates errors so the respondent sees all of them at once.

use crate::record::{is_answered, scale_value, selections};
use crate::schema::Schema;
use serde_json::{Map, Value};

/// Validate a payload against the schema.
pub fn validate(payload: &Map<String, Value>, schema: &Schema) -> Vec<String> {
    let mut errors = Vec::new();

    if !schema.has_gate_answer(payload) {
        errors.push(format!("missing screening answer {}", schema.gate_field));
        return errors;
    }

    if schema.is_screened_out(payload) {
        return errors;
    }

    for field in &schema.required_fields {
        if !payload.get(field).is_some_and(is_answered) {
            errors.push(format!("missing required field {}", field));
        }
    }

    for field in &schema.multi_value_fields {
        let empty = payload
            .get(field)
            .map(|v| selections(v).is_empty())
            .unwrap_or(true);
        if empty {
            errors.push(format!("field {} requires at least one selection", field));
        }
    }

    for field in &schema.scale_fields {
        let in_range = payload
            .get(field)
            .and_then(scale_value)
            .is_some_and(|v| v >= schema.scale_min as f64 && v <= schema.scale_max as f64);
        if !in_range {
            errors.push(format!(
                "field {} must be a rating between {} and {}",
                field, schema.scale_min, schema.scale_max
            ));
        }
    }

    errors
}
