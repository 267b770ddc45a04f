//! Wire row decoding
//!
//! Cells arrive as strings and are converted to JSON values using the
//! declared wire type, so a whole row can be handed to serde and
//! deserialized into the caller's type. Timestamps arrive as fractional
//! epoch seconds and are emitted as RFC 3339 strings.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use quarry_ir::DataType;
use serde_json::{json, Map, Value};

use crate::service::{WireRow, WireSchema};
use crate::ClientError;

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Per-field overrides applied before the wire-declared type.
    pub type_overrides: HashMap<String, DataType>,
    /// Render timestamps in the local offset instead of UTC.
    pub utc_to_local: bool,
}

pub(crate) fn parse_rows(
    schema: &WireSchema,
    rows: &[WireRow],
    options: &ParseOptions,
) -> Result<Vec<Value>, ClientError> {
    rows.iter().map(|row| parse_row(schema, row, options)).collect()
}

fn parse_row(
    schema: &WireSchema,
    row: &WireRow,
    options: &ParseOptions,
) -> Result<Value, ClientError> {
    let mut object = Map::with_capacity(schema.fields.len());
    for (index, field) in schema.fields.iter().enumerate() {
        let raw = row.cells.get(index).and_then(|cell| cell.as_deref());
        let kind = options
            .type_overrides
            .get(&field.name)
            .copied()
            .unwrap_or_else(|| wire_kind(&field.kind));
        object.insert(field.name.clone(), parse_cell(&field.name, kind, raw, options)?);
    }
    Ok(Value::Object(object))
}

fn wire_kind(name: &str) -> DataType {
    match name {
        "STRING" => DataType::String,
        "INTEGER" => DataType::Int64,
        "FLOAT" => DataType::Float64,
        "BOOLEAN" => DataType::Bool,
        "TIMESTAMP" => DataType::Timestamp,
        "BYTES" => DataType::Bytes,
        _ => DataType::Unknown,
    }
}

fn parse_cell(
    field: &str,
    kind: DataType,
    raw: Option<&str>,
    options: &ParseOptions,
) -> Result<Value, ClientError> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    let malformed = |reason: String| ClientError::Parse {
        field: field.to_string(),
        reason,
    };
    match kind {
        DataType::Int64 => {
            let v: i64 = raw
                .parse()
                .map_err(|_| malformed(format!("not an integer: {raw}")))?;
            Ok(json!(v))
        }
        DataType::Float64 => {
            let v: f64 = raw
                .parse()
                .map_err(|_| malformed(format!("not a float: {raw}")))?;
            serde_json::Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| malformed(format!("non-finite float: {raw}")))
        }
        DataType::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(malformed(format!("not a boolean: {other}"))),
        },
        DataType::Timestamp => {
            let seconds: f64 = raw
                .parse()
                .map_err(|_| malformed(format!("not an epoch timestamp: {raw}")))?;
            let micros = (seconds * 1_000_000.0).round() as i64;
            let utc = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| malformed(format!("epoch out of range: {raw}")))?;
            let text = if options.utc_to_local {
                utc.with_timezone(&Local).to_rfc3339()
            } else {
                utc.to_rfc3339()
            };
            Ok(Value::String(text))
        }
        DataType::String | DataType::Bytes | DataType::Unknown => {
            Ok(Value::String(raw.to_string()))
        }
    }
}
