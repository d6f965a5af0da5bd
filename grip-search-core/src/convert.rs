//! Conversions between backend JSON records and `gripper` wire rows.
//!
//! Rows travel as `google.protobuf.Struct`. JSON numbers become doubles, as the `Struct`
//! type has no integer kind.
use crate::search::types::Record;
use gripper_proto::pb::Row;
use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};

pub fn json_to_value(value: serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(values) => Kind::ListValue(ListValue {
            values: values.into_iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(record_to_struct(map)),
    };

    Value { kind: Some(kind) }
}

pub fn record_to_struct(record: Record) -> Struct {
    Struct {
        fields: record
            .into_iter()
            .map(|(k, v)| (k, json_to_value(v)))
            .collect(),
    }
}

/// The string value of `record[primary_key]`, if present and a string.
pub fn row_id(record: &Record, primary_key: &str) -> Option<String> {
    record
        .get(primary_key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// Builds a wire row keyed by `record[primary_key]`.
///
/// Returns `None` when the key is missing or not a string; such records cannot be
/// addressed by id and are skipped by scans.
pub fn keyed_row(record: Record, primary_key: &str) -> Option<Row> {
    let id = row_id(&record, primary_key)?;

    Some(Row {
        id,
        data: Some(record_to_struct(record)),
        request_id: 0,
    })
}

/// The reply to a lookup request. A record without a usable key still travels, with an
/// empty id.
pub fn lookup_reply(record: Record, primary_key: &str, request_id: u64) -> Row {
    Row {
        id: row_id(&record, primary_key).unwrap_or_default(),
        data: Some(record_to_struct(record)),
        request_id,
    }
}

/// The reply to a lookup request that failed: empty id, empty data.
pub fn empty_reply(request_id: u64) -> Row {
    Row {
        id: String::new(),
        data: Some(Struct::default()),
        request_id,
    }
}
