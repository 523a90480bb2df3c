// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Runtime application of mapping transforms

use crate::error::FlowError;
use crate::types::{PortType, Transform, TransformKind};
use serde_json::{Number, Value};

/// Apply `transform` to a value travelling along a mapping
pub fn apply(transform: &Transform, value: Value) -> Result<Value, FlowError> {
    match transform.kind {
        TransformKind::Cast => cast(value, transform.config.to),
    }
}

/// Convert `value` to the target port type.
///
/// `null` (an unset or `any`-typed upstream value) becomes the target's zero value.
pub fn cast(value: Value, to: PortType) -> Result<Value, FlowError> {
    if value.is_null() {
        return Ok(to.zero_value());
    }

    let failed = |value: &Value| FlowError::TransformFailed {
        value: value.to_string(),
        to,
    };

    match to {
        PortType::Any => Ok(value),
        PortType::String => match value {
            Value::String(_) => Ok(value),
            other => Ok(Value::String(other.to_string())),
        },
        PortType::Number => match value {
            Value::Number(_) => Ok(value),
            Value::Bool(b) => Ok(Value::from(u8::from(b))),
            Value::Array(ref items) => Ok(Value::from(items.len())),
            Value::String(ref s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| failed(&value))
            }
            ref other => Err(failed(other)),
        },
        PortType::Boolean => Ok(Value::Bool(truthy(&value))),
        PortType::Array => match value {
            Value::Array(_) => Ok(value),
            other => Ok(Value::Array(vec![other])),
        },
        PortType::Object => match value {
            Value::Object(_) => Ok(value),
            Value::String(ref s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => Ok(parsed),
                _ => Err(failed(&value)),
            },
            ref other => Err(failed(other)),
        },
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
