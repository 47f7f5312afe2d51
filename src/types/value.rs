//! Typed result cells and column-aligned rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Single column value returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit integer
    Integer(i64),
    /// Floating point
    Real(f64),
    /// UTF-8 text (lossy for invalid bytes)
    Text(String),
    /// Raw bytes
    Blob(Vec<u8>),
}

impl Value {
    /// Integer view (reals are not truncated).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of integers and reals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for Value {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

/// Result row: values in column order.
///
/// Column names live once on the owning result set; a row is only meaningful
/// next to that shared column sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at a column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Value for a named column, resolved against the shared column sequence.
    pub fn get_named(&self, columns: &[String], name: &str) -> Option<&Value> {
        columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.0.get(i))
    }

    /// Pairs each column name with its value, in column order.
    pub fn entries<'a>(
        &'a self,
        columns: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a Value)> {
        columns.iter().map(String::as_str).zip(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_named_lookup() {
        let columns = vec!["store_name".to_string(), "avg_rating".to_string()];
        let row = Row::new(vec![Value::Text("Canal Walk".into()), Value::Real(2.5)]);

        assert_eq!(row.get_named(&columns, "avg_rating"), Some(&Value::Real(2.5)));
        assert_eq!(row.get_named(&columns, "missing"), None);

        let entries: Vec<_> = row.entries(&columns).collect();
        assert_eq!(entries[0].0, "store_name");
        assert_eq!(entries[1].1.as_f64(), Some(2.5));
    }

    #[test]
    fn test_value_json_is_untagged() {
        let row = Row::new(vec![Value::Null, Value::Integer(5), Value::Text("x".into())]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,5,"x"]"#);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::Blob(vec![1, 2]).to_string(), "<2 bytes>");
    }
}
