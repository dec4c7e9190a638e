//! Change-plan contract enforcement
//!
//! Walks the recovered JSON explicitly instead of deriving `Deserialize`, so
//! every rejection names the offending field.

use crate::error::{Error, Result};
use crate::types::{ChangePlan, Patch, PatchChange, PatchOp};
use serde_json::{Map, Value};

/// Validate a parsed JSON value into a typed [`ChangePlan`]
///
/// An empty `patches` list is well-formed here; whether a plan is executable
/// is decided by the engine.
pub fn validate_plan(value: &Value) -> Result<ChangePlan> {
    let root = value
        .as_object()
        .ok_or_else(|| Error::schema("$", format!("expected object, found {}", type_name(value))))?;

    let summary = match root.get("summary") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(Error::schema(
                "summary",
                format!("expected string, found {}", type_name(other)),
            ));
        }
        None => return Err(Error::schema("summary", "missing")),
    };

    let patches = match root.get("patches") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| validate_patch(index, item))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(Error::schema(
                "patches",
                format!("expected array, found {}", type_name(other)),
            ));
        }
    };

    Ok(ChangePlan { summary, patches })
}

fn validate_patch(index: usize, item: &Value) -> Result<Patch> {
    let field = |name: &str| format!("patches[{index}].{name}");

    let obj = item.as_object().ok_or_else(|| {
        Error::schema(
            format!("patches[{index}]"),
            format!("expected object, found {}", type_name(item)),
        )
    })?;

    let path = match obj.get("path") {
        Some(Value::String(p)) if !p.trim().is_empty() => p.clone(),
        Some(Value::String(_)) => return Err(Error::schema(field("path"), "must not be empty")),
        Some(other) => {
            return Err(Error::schema(
                field("path"),
                format!("expected string, found {}", type_name(other)),
            ));
        }
        None => return Err(Error::schema(field("path"), "missing")),
    };

    let (op_key, op_value) = op_entry(obj).ok_or_else(|| Error::schema(field("op"), "missing"))?;
    let op = match op_value {
        Value::String(tag) => PatchOp::from_tag(tag).ok_or_else(|| {
            Error::schema(
                field(op_key),
                format!("unrecognized operation `{tag}` (expected create, update or delete)"),
            )
        })?,
        other => {
            return Err(Error::schema(
                field(op_key),
                format!("expected string, found {}", type_name(other)),
            ));
        }
    };

    let content = match obj.get("content") {
        None => String::new(),
        Some(Value::String(c)) => c.clone(),
        Some(other) => {
            return Err(Error::schema(
                field("content"),
                format!("expected string, found {}", type_name(other)),
            ));
        }
    };

    let change = match op {
        PatchOp::Create => PatchChange::Create { content },
        PatchOp::Update => PatchChange::Update { content },
        PatchOp::Delete => PatchChange::Delete,
    };

    Ok(Patch { path, change })
}

/// `op` is the wire key; `operation` is accepted as an alias
fn op_entry(obj: &Map<String, Value>) -> Option<(&'static str, &Value)> {
    obj.get("op")
        .map(|v| ("op", v))
        .or_else(|| obj.get("operation").map(|v| ("operation", v)))
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
