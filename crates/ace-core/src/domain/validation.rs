//! Schema validation for provider replies.
//!
//! Every result type declares its field set as a static `FieldSpec` table.
//! A reply is checked against that table before it is deserialized, so the
//! error names the exact field path that is missing or mistyped. Extra
//! fields are ignored.

use serde_json::Value;

use super::error::ValidationError;
use super::results::StageRecord;
use super::stage_name::StageName;
use crate::provider::ResponseMap;

/// Expected shape of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
    /// Text restricted to a fixed vocabulary.
    OneOf(&'static [&'static str]),
    /// Array whose elements are objects with the given fields.
    ObjectList(&'static [FieldSpec]),
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::OneOf(_) => "string",
            FieldKind::TextList => "array of strings",
            FieldKind::ObjectList(_) => "array of objects",
        }
    }
}

/// `(field name, expected shape)`.
pub type FieldSpec = (&'static str, FieldKind);

/// JSON type name used in `WrongType` errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check `object` against `fields`. Field paths in errors are prefixed with `prefix`.
pub fn validate_fields(
    stage: StageName,
    object: &serde_json::Map<String, Value>,
    fields: &[FieldSpec],
    prefix: &str,
) -> Result<(), ValidationError> {
    for &(name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let value = object
            .get(name)
            .ok_or_else(|| ValidationError::MissingField {
                stage,
                field: path.clone(),
            })?;
        check_value(stage, &path, value, kind)?;
    }
    Ok(())
}

fn check_value(
    stage: StageName,
    path: &str,
    value: &Value,
    kind: FieldKind,
) -> Result<(), ValidationError> {
    let wrong_type = |field: String, expected: &'static str, found: &Value| {
        ValidationError::WrongType {
            stage,
            field,
            expected,
            found: json_type_name(found),
        }
    };

    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                return Err(wrong_type(path.to_string(), kind.expected(), value));
            }
        }
        FieldKind::OneOf(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| wrong_type(path.to_string(), kind.expected(), value))?;
            if !allowed.contains(&s) {
                return Err(ValidationError::InvalidValue {
                    stage,
                    field: path.to_string(),
                    reason: format!("expected one of {allowed:?}, found {s:?}"),
                });
            }
        }
        FieldKind::TextList => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type(path.to_string(), kind.expected(), value))?;
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(wrong_type(format!("{path}[{i}]"), "string", item));
                }
            }
        }
        FieldKind::ObjectList(fields) => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type(path.to_string(), kind.expected(), value))?;
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let object = item
                    .as_object()
                    .ok_or_else(|| wrong_type(item_path.clone(), "object", item))?;
                validate_fields(stage, object, fields, &item_path)?;
            }
        }
    }
    Ok(())
}

/// Validate `response` against `R::FIELDS` and build the typed record.
pub fn validate_record<R: StageRecord>(response: &ResponseMap) -> Result<R, ValidationError> {
    validate_fields(R::STAGE, response, R::FIELDS, "")?;
    serde_json::from_value(Value::Object(response.clone())).map_err(|e| {
        ValidationError::InvalidValue {
            stage: R::STAGE,
            field: "<record>".to_string(),
            reason: e.to_string(),
        }
    })
}
