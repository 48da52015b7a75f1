//! Record and cell value types.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::StoreError;

/// Scalar cell value.
///
/// The backing file carries no type information, so cells are inferred
/// on load: integer first, then float, otherwise string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Infers a value from a raw CSV cell.
    pub fn infer(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Str(raw.to_string())
    }

    /// Converts a JSON request value into a cell value.
    ///
    /// Only strings and numbers fit a CSV cell; anything else is a
    /// validation error naming the offending field.
    pub fn from_json(field: &str, value: &serde_json::Value) -> Result<Self, StoreError> {
        match value {
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(StoreError::UnsupportedValue {
                        field: field.to_string(),
                    })
                }
            }
            _ => Err(StoreError::UnsupportedValue {
                field: field.to_string(),
            }),
        }
    }

    /// Renders the value as the text of a CSV cell, unquoted.
    pub fn render(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
        }
    }
}

/// One row of the table: a unique id plus the remaining columns in
/// schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Identity, immutable after creation
    pub id: i64,
    /// (column name, value) pairs for every column except `id`
    pub fields: Vec<(String, Value)>,
}

impl Record {
    /// Returns the value of a named field, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

// Serialized as a JSON object with `id` first and the remaining
// fields in column order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_integer() {
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("-7"), Value::Int(-7));
    }

    #[test]
    fn test_infer_float() {
        assert_eq!(Value::infer("1.5"), Value::Float(1.5));
    }

    #[test]
    fn test_infer_string() {
        assert_eq!(Value::infer("Ross"), Value::Str("Ross".to_string()));
        assert_eq!(Value::infer(""), Value::Str(String::new()));
    }

    #[test]
    fn test_from_json_rejects_compound_values() {
        let result = Value::from_json("nicknames", &serde_json::json!(["Rossy"]));
        assert!(matches!(result, Err(StoreError::UnsupportedValue { .. })));
    }

    #[test]
    fn test_record_serializes_with_id_first() {
        let record = Record {
            id: 1,
            fields: vec![
                ("first_name".to_string(), Value::Str("Ross".to_string())),
                ("last_name".to_string(), Value::Str("Geller".to_string())),
            ],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"first_name":"Ross","last_name":"Geller"}"#
        );
    }
}
