//! Tagged result values
//!
//! MySQL result cells are heterogeneous (null, integers, floats, text,
//! temporal types). `SqlValue` keeps that explicit so downstream formatting is
//! exhaustive and null handling is never implicit.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};
use std::fmt;
use tracing::debug;

/// A single cell of a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::UInt(u) => write!(f, "{}", u),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Date(d) => write!(f, "{}", d),
            SqlValue::Time(t) => write!(f, "{}", t),
            SqlValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

/// Decode one cell of a row by its reported column type.
///
/// Never fails: a cell that cannot be decoded under its reported type falls
/// back to raw text, and to `Null` as the last resort.
pub fn decode_cell(row: &MySqlRow, index: usize) -> SqlValue {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .map(|v| v.map(SqlValue::Bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .map(|v| v.map(SqlValue::Int)),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" | "BIT" => row
            .try_get::<Option<u64>, _>(index)
            .map(|v| v.map(SqlValue::UInt)),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .map(|v| v.map(SqlValue::Float)),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(SqlValue::Date)),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map(SqlValue::Time)),
        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(SqlValue::DateTime)),
        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map(|dt| SqlValue::DateTime(dt.naive_utc()))),
        // DECIMAL travels as digits on the wire; keep the exact text so
        // currency values are never reformatted through a float.
        "DECIMAL" => row
            .try_get_unchecked::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::Text)),
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
        | "SET" => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::Text)),
        _ => decode_other(row, index),
    };

    match decoded {
        Ok(Some(value)) => value,
        Ok(None) => SqlValue::Null,
        Err(e) => {
            debug!(
                column = column.name(),
                column_type = type_name,
                "falling back to raw text for undecodable cell: {}",
                e
            );
            match row.try_get_unchecked::<Option<String>, _>(index) {
                Ok(Some(text)) => SqlValue::Text(text),
                _ => SqlValue::Null,
            }
        }
    }
}

/// Blobs, JSON, GEOMETRY and anything else without a dedicated arm.
fn decode_other(row: &MySqlRow, index: usize) -> Result<Option<SqlValue>, sqlx::Error> {
    if let Ok(bytes) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Ok(bytes.map(|b| SqlValue::Text(String::from_utf8_lossy(&b).into_owned())));
    }
    row.try_get_unchecked::<Option<String>, _>(index)
        .map(|v| v.map(SqlValue::Text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_null_is_uppercase() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }

    #[test]
    fn test_display_plain_values() {
        assert_eq!(SqlValue::Int(-7).to_string(), "-7");
        assert_eq!(SqlValue::UInt(42).to_string(), "42");
        assert_eq!(SqlValue::Float(3.5).to_string(), "3.5");
        assert_eq!(SqlValue::Text("₹1,200".to_string()).to_string(), "₹1,200");
    }

    #[test]
    fn test_display_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(SqlValue::Date(date).to_string(), "2024-01-15");
        let dt = date.and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(SqlValue::DateTime(dt).to_string(), "2024-01-15 10:30:00");
    }

    #[test]
    fn test_serializes_untagged() {
        let row = vec![
            SqlValue::Null,
            SqlValue::Int(1),
            SqlValue::Text("a".to_string()),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,1,"a"]"#);
    }
}
