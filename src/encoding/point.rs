//! Point record encoding and decoding.
//!
//! A point record is a fixed 12-byte header followed by a self-describing
//! body:
//!
//! Record: [series_id: u32 BE][timestamp: i64 BE, ns since Unix epoch][JSON body]
//!
//! The body is a JSON object mapping field names to scalar values. Field
//! order is not preserved; field names and values round-trip exactly.
//! Decoding is the exact inverse of encoding for any encoder output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length in bytes of the fixed record header.
pub const POINT_HEADER_LEN: usize = 12;

/// Field map of a point: field name to scalar value.
pub type Fields = BTreeMap<String, FieldValue>;

/// A dynamically-typed scalar sample value.
///
/// Integers and floats are kept distinct so that `i64` field values
/// round-trip without precision loss. The untagged representation keeps the
/// stored body a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = Error;

    /// Converts a dynamic JSON value into a scalar field value.
    ///
    /// Arrays, objects, and null are not recognized scalar kinds and fail
    /// with `UnsupportedValueType`.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(FieldValue::Bool(b)),
            serde_json::Value::String(s) => Ok(FieldValue::String(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(Error::UnsupportedValueType(format!(
                        "number out of range: {}",
                        n
                    )))
                }
            }
            other => Err(Error::UnsupportedValueType(format!(
                "expected scalar, got {}",
                kind_name(&other)
            ))),
        }
    }
}

fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Encodes a point record.
///
/// # Arguments
/// * `series_id` - The series identifier
/// * `timestamp` - Sample time in nanoseconds since the Unix epoch
/// * `values` - Field name to scalar value map
///
/// # Returns
/// Encoded record bytes: 12-byte header followed by the serialized body
pub fn encode_point(series_id: u32, timestamp: i64, values: &Fields) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(values)
        .map_err(|err| Error::InvalidInput(format!("unencodable value map: {}", err)))?;

    let mut record = Vec::with_capacity(POINT_HEADER_LEN + body.len());
    record.extend_from_slice(&series_id.to_be_bytes());
    record.extend_from_slice(&timestamp.to_be_bytes());
    record.extend_from_slice(&body);
    Ok(record)
}

/// Decodes a point record produced by [`encode_point`].
///
/// # Returns
/// Tuple of (series_id, timestamp, values)
///
/// Fails with `CorruptRecord` when fewer than 12 bytes are present or the
/// body does not parse as a value mapping, and with `UnsupportedValueType`
/// when the mapping contains a non-scalar value.
pub fn decode_point(data: &[u8]) -> Result<(u32, i64, Fields)> {
    if data.len() < POINT_HEADER_LEN {
        return Err(Error::CorruptRecord(format!(
            "record header truncated: {} bytes",
            data.len()
        )));
    }

    let series_id = u32::from_be_bytes(data[..4].try_into().unwrap());
    let timestamp = i64::from_be_bytes(data[4..POINT_HEADER_LEN].try_into().unwrap());

    let body: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&data[POINT_HEADER_LEN..])
            .map_err(|err| Error::CorruptRecord(format!("invalid value map body: {}", err)))?;

    let mut values = Fields::new();
    for (name, value) in body {
        values.insert(name, FieldValue::try_from(value)?);
    }

    Ok((series_id, timestamp, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Fields {
        Fields::from([
            ("value".to_string(), FieldValue::Integer(42)),
            ("load".to_string(), FieldValue::Float(0.25)),
            ("up".to_string(), FieldValue::Bool(true)),
            ("host".to_string(), FieldValue::from("db-01")),
        ])
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let fields = sample_fields();
        let encoded = encode_point(7, 1_704_067_201_000_000_000, &fields).unwrap();
        let (series_id, timestamp, decoded) = decode_point(&encoded).unwrap();

        assert_eq!(series_id, 7);
        assert_eq!(timestamp, 1_704_067_201_000_000_000);
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_header_is_big_endian() {
        let fields = Fields::from([("v".to_string(), FieldValue::Integer(1))]);
        let encoded = encode_point(0x0102_0304, 0x0506_0708_090A_0B0C, &fields).unwrap();

        assert_eq!(&encoded[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            &encoded[4..12],
            &[0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C]
        );
    }

    #[test]
    fn test_integers_and_floats_stay_distinct() {
        let fields = Fields::from([
            ("count".to_string(), FieldValue::Integer(42)),
            ("mean".to_string(), FieldValue::Float(42.0)),
        ]);
        let encoded = encode_point(1, 0, &fields).unwrap();
        let (_, _, decoded) = decode_point(&encoded).unwrap();

        assert_eq!(decoded["count"], FieldValue::Integer(42));
        assert_eq!(decoded["mean"], FieldValue::Float(42.0));
    }

    #[test]
    fn test_negative_timestamp_round_trip() {
        let fields = Fields::from([("v".to_string(), FieldValue::Integer(1))]);
        let encoded = encode_point(3, -1_000_000_000, &fields).unwrap();
        let (_, timestamp, _) = decode_point(&encoded).unwrap();
        assert_eq!(timestamp, -1_000_000_000);
    }

    #[test]
    fn test_truncated_record_is_corrupt() {
        let err = decode_point(&[0u8; 11]).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord(_)));
    }

    #[test]
    fn test_garbage_body_is_corrupt() {
        let mut record = Vec::from([0u8; POINT_HEADER_LEN]);
        record.extend_from_slice(b"not json");
        let err = decode_point(&record).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord(_)));
    }

    #[test]
    fn test_non_scalar_value_is_unsupported() {
        let mut record = Vec::from([0u8; POINT_HEADER_LEN]);
        record.extend_from_slice(br#"{"v": [1, 2, 3]}"#);
        let err = decode_point(&record).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(_)));
    }

    #[test]
    fn test_json_value_conversion() {
        assert_eq!(
            FieldValue::try_from(serde_json::json!(5)).unwrap(),
            FieldValue::Integer(5)
        );
        assert_eq!(
            FieldValue::try_from(serde_json::json!(2.5)).unwrap(),
            FieldValue::Float(2.5)
        );
        assert!(FieldValue::try_from(serde_json::json!(null)).is_err());
        assert!(FieldValue::try_from(serde_json::json!({"a": 1})).is_err());
    }
}
