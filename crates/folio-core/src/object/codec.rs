//! Conversion between property values and stored SQL values.
//!
//! Unsigned 64-bit integers are bit-cast into SQLite's signed integer and
//! back. Primitive blobs pack their elements little-endian.

use rusqlite::types::Value as SqlValue;

use crate::error::ValueError;
use crate::schema::{DataType, TableKind};

use super::{InstanceId, Value};

/// Encode a scalar column value. Null stays null.
pub(crate) fn encode_scalar(
    path: &str,
    data_type: DataType,
    is_blob: bool,
    value: &Value,
) -> Result<SqlValue, ValueError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Array(items) if is_blob => pack(path, data_type, items).map(SqlValue::Blob),
        _ if is_blob => Err(mismatch(path, format!("packed {data_type} array"), value)),
        _ => encode_value(path, data_type, value),
    }
}

/// Decode a scalar column value.
pub(crate) fn decode_scalar(
    path: &str,
    data_type: DataType,
    is_blob: bool,
    value: SqlValue,
) -> Result<Value, ValueError> {
    match value {
        SqlValue::Null => Ok(Value::Null),
        SqlValue::Blob(bytes) if is_blob => unpack(path, data_type, &bytes),
        other => decode_value(path, data_type, other),
    }
}

fn encode_value(path: &str, data_type: DataType, value: &Value) -> Result<SqlValue, ValueError> {
    let encoded = match (data_type, value) {
        (DataType::Int32, Value::Int32(v)) => SqlValue::Integer(i64::from(*v)),
        (DataType::Int64, Value::Int64(v)) => SqlValue::Integer(*v),
        (DataType::Uint32, Value::Uint32(v)) => SqlValue::Integer(i64::from(*v)),
        (DataType::Uint64, Value::Uint64(v)) => SqlValue::Integer(*v as i64),
        // SQLite reads a NaN REAL back as NULL.
        (DataType::Float, Value::Float(v)) if v.is_nan() => return Err(nan(path)),
        (DataType::Double, Value::Double(v)) if v.is_nan() => return Err(nan(path)),
        (DataType::Float, Value::Float(v)) => SqlValue::Real(f64::from(*v)),
        (DataType::Double, Value::Double(v)) => SqlValue::Real(*v),
        (DataType::String, Value::String(s)) => SqlValue::Text(s.clone()),
        (DataType::Blob, Value::Blob(b)) => SqlValue::Blob(b.clone()),
        (DataType::Reference, Value::Reference(id)) if id.is_valid() => {
            SqlValue::Text(id.to_string())
        }
        (DataType::Reference, Value::Reference(_)) => SqlValue::Null,
        _ => return Err(mismatch(path, data_type.to_string(), value)),
    };
    Ok(encoded)
}

fn decode_value(path: &str, data_type: DataType, value: SqlValue) -> Result<Value, ValueError> {
    let decoded = match (data_type, value) {
        (DataType::Int32, SqlValue::Integer(v)) => {
            Value::Int32(i32::try_from(v).map_err(|e| decode_error(path, e))?)
        }
        (DataType::Int64, SqlValue::Integer(v)) => Value::Int64(v),
        (DataType::Uint32, SqlValue::Integer(v)) => {
            Value::Uint32(u32::try_from(v).map_err(|e| decode_error(path, e))?)
        }
        (DataType::Uint64, SqlValue::Integer(v)) => Value::Uint64(v as u64),
        (DataType::Float, SqlValue::Real(v)) => Value::Float(v as f32),
        (DataType::Double, SqlValue::Real(v)) => Value::Double(v),
        (DataType::String, SqlValue::Text(s)) => Value::String(s),
        (DataType::Blob, SqlValue::Blob(b)) => Value::Blob(b),
        (DataType::Reference, SqlValue::Text(s)) => Value::Reference(
            s.parse::<InstanceId>()
                .map_err(|e| decode_error(path, e))?,
        ),
        (data_type, other) => {
            return Err(ValueError::Decode {
                property: path.to_string(),
                reason: format!("{data_type} cannot be read from {:?}", other.data_type()),
            })
        }
    };
    Ok(decoded)
}

/// Pack primitive elements little-endian.
fn pack(path: &str, data_type: DataType, items: &[Value]) -> Result<Vec<u8>, ValueError> {
    let width = data_type.byte_width().unwrap_or(0);
    let mut bytes = Vec::with_capacity(items.len() * width);
    for item in items {
        match (data_type, item) {
            (_, Value::Null) => {
                return Err(ValueError::NullElement {
                    property: path.to_string(),
                })
            }
            (DataType::Int32, Value::Int32(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (DataType::Int64, Value::Int64(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (DataType::Uint32, Value::Uint32(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (DataType::Uint64, Value::Uint64(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (DataType::Float, Value::Float(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (DataType::Double, Value::Double(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            _ => return Err(mismatch(path, format!("{data_type} element"), item)),
        }
    }
    Ok(bytes)
}

fn unpack(path: &str, data_type: DataType, bytes: &[u8]) -> Result<Value, ValueError> {
    let width = data_type.byte_width().ok_or_else(|| ValueError::Decode {
        property: path.to_string(),
        reason: format!("{data_type} cannot be packed"),
    })?;
    if bytes.len() % width != 0 {
        return Err(ValueError::Decode {
            property: path.to_string(),
            reason: format!("{} bytes is not a multiple of {width}", bytes.len()),
        });
    }

    let items = match width {
        4 => bytes
            .chunks_exact(4)
            .map(|chunk| {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(chunk);
                match data_type {
                    DataType::Int32 => Value::Int32(i32::from_le_bytes(buf)),
                    DataType::Uint32 => Value::Uint32(u32::from_le_bytes(buf)),
                    _ => Value::Float(f32::from_le_bytes(buf)),
                }
            })
            .collect(),
        _ => bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                match data_type {
                    DataType::Int64 => Value::Int64(i64::from_le_bytes(buf)),
                    DataType::Uint64 => Value::Uint64(u64::from_le_bytes(buf)),
                    _ => Value::Double(f64::from_le_bytes(buf)),
                }
            })
            .collect(),
    };
    Ok(Value::Array(items))
}

fn mismatch(path: &str, expected: String, found: &Value) -> ValueError {
    ValueError::Mismatch {
        property: path.to_string(),
        expected,
        found: found.kind_name(),
    }
}

fn nan(path: &str) -> ValueError {
    ValueError::Unrepresentable {
        property: path.to_string(),
        reason: "NaN",
    }
}

fn decode_error(path: &str, err: impl std::fmt::Display) -> ValueError {
    ValueError::Decode {
        property: path.to_string(),
        reason: err.to_string(),
    }
}

/// Element conversion of one array sub-table kind.
pub(crate) trait ElementCodec {
    /// Kind of sub-table this codec serves.
    const KIND: TableKind;

    /// Encode one element. Null elements are rejected.
    fn encode(path: &str, data_type: DataType, value: &Value) -> Result<SqlValue, ValueError>;

    /// Decode one stored element.
    fn decode(path: &str, data_type: DataType, value: SqlValue) -> Result<Value, ValueError> {
        decode_value(path, data_type, value)
    }
}

/// Primitive and string elements.
#[derive(Debug)]
pub(crate) struct PrimitiveCodec;

impl ElementCodec for PrimitiveCodec {
    const KIND: TableKind = TableKind::PrimitiveArray;

    fn encode(path: &str, data_type: DataType, value: &Value) -> Result<SqlValue, ValueError> {
        if value.is_null() {
            return Err(ValueError::NullElement {
                property: path.to_string(),
            });
        }
        encode_value(path, data_type, value)
    }
}

/// Binary elements.
#[derive(Debug)]
pub(crate) struct BlobCodec;

impl ElementCodec for BlobCodec {
    const KIND: TableKind = TableKind::BlobArray;

    fn encode(path: &str, _data_type: DataType, value: &Value) -> Result<SqlValue, ValueError> {
        match value {
            Value::Blob(bytes) => Ok(SqlValue::Blob(bytes.clone())),
            Value::Null => Err(ValueError::NullElement {
                property: path.to_string(),
            }),
            other => Err(mismatch(path, "blob element".to_string(), other)),
        }
    }
}

/// Reference elements. The nil id counts as a null element.
#[derive(Debug)]
pub(crate) struct ReferenceCodec;

impl ElementCodec for ReferenceCodec {
    const KIND: TableKind = TableKind::ReferenceArray;

    fn encode(path: &str, _data_type: DataType, value: &Value) -> Result<SqlValue, ValueError> {
        match value {
            Value::Reference(id) if id.is_valid() => Ok(SqlValue::Text(id.to_string())),
            Value::Reference(_) | Value::Null => Err(ValueError::NullElement {
                property: path.to_string(),
            }),
            other => Err(mismatch(path, "reference element".to_string(), other)),
        }
    }

    fn decode(path: &str, _data_type: DataType, value: SqlValue) -> Result<Value, ValueError> {
        decode_value(path, DataType::Reference, value)
    }
}
