//! SQL output types and coercion of path results into them
//!
//! `JSON_VALUE` hands its single scalar item to a `TypeCoercion`, normally
//! `StandardCoercion`, which follows SQL `CAST` rules.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::item::{DateTimeValue, Item};
use crate::methods::parse_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Boolean,
    Integer,
    BigInt,
    Double,
    /// Optional maximum length in characters
    Varchar(Option<u32>),
    Date,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Boolean(bool),
    Integer(i32),
    BigInt(i64),
    Double(f64),
    Varchar(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: SqlType },

    #[error("value {value} out of range for {to}")]
    OutOfRange { value: String, to: SqlType },

    #[error("value of length {len} exceeds {to}")]
    TooLong { len: usize, to: SqlType },

    #[error("unknown SQL type: {0}")]
    UnknownType(String),
}

/// Converts a scalar path result to a SQL value
pub trait TypeCoercion {
    fn coerce(&self, item: &Item, target: &SqlType) -> Result<SqlValue, CoercionError>;
}

/// SQL `CAST` semantics
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCoercion;

impl TypeCoercion for StandardCoercion {
    fn coerce(&self, item: &Item, target: &SqlType) -> Result<SqlValue, CoercionError> {
        let invalid = || CoercionError::InvalidCast {
            from: describe(item),
            to: *target,
        };
        let out_of_range = |value: String| CoercionError::OutOfRange { value, to: *target };

        match (target, item) {
            (SqlType::Boolean, Item::Boolean(b)) => Ok(SqlValue::Boolean(*b)),
            (SqlType::Boolean, Item::Number(n)) => Ok(SqlValue::Boolean(n.as_f64() != 0.0)),
            (SqlType::Boolean, Item::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(SqlValue::Boolean(true)),
                "false" | "f" | "0" => Ok(SqlValue::Boolean(false)),
                _ => Err(invalid()),
            },

            (SqlType::Integer | SqlType::BigInt, Item::Boolean(b)) => {
                integer_value(*target, i64::from(*b)).ok_or_else(|| out_of_range(b.to_string()))
            }
            (SqlType::Integer | SqlType::BigInt, Item::Number(n)) => {
                let value = n.as_integral().ok_or_else(|| out_of_range(n.to_string()))?;
                integer_value(*target, value).ok_or_else(|| out_of_range(n.to_string()))
            }
            (SqlType::Integer | SqlType::BigInt, Item::String(s)) => {
                let value = s.trim().parse::<i64>().map_err(|_| invalid())?;
                integer_value(*target, value).ok_or_else(|| out_of_range(s.clone()))
            }

            (SqlType::Double, Item::Number(n)) => Ok(SqlValue::Double(n.as_f64())),
            (SqlType::Double, Item::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(SqlValue::Double(f)),
                _ => Err(invalid()),
            },

            (SqlType::Varchar(max), scalar) => {
                let text = match scalar {
                    Item::String(s) => s.clone(),
                    Item::Boolean(b) => b.to_string(),
                    Item::Number(n) => n.to_string(),
                    Item::DateTime(dt) => dt.to_string(),
                    _ => return Err(invalid()),
                };
                let len = text.chars().count();
                match max {
                    Some(max) if len > *max as usize => Err(CoercionError::TooLong {
                        len,
                        to: *target,
                    }),
                    _ => Ok(SqlValue::Varchar(text)),
                }
            }

            (SqlType::Date, Item::DateTime(dt)) => date_part(dt).ok_or_else(invalid),
            (SqlType::Date, Item::String(s)) => parse_iso(s.trim())
                .as_ref()
                .and_then(date_part)
                .ok_or_else(invalid),

            (SqlType::Timestamp, Item::DateTime(dt)) => timestamp_part(dt).ok_or_else(invalid),
            (SqlType::Timestamp, Item::String(s)) => parse_iso(s.trim())
                .as_ref()
                .and_then(timestamp_part)
                .ok_or_else(invalid),

            _ => Err(invalid()),
        }
    }
}

fn integer_value(target: SqlType, value: i64) -> Option<SqlValue> {
    match target {
        SqlType::Integer => i32::try_from(value).ok().map(SqlValue::Integer),
        _ => Some(SqlValue::BigInt(value)),
    }
}

fn date_part(dt: &DateTimeValue) -> Option<SqlValue> {
    match dt {
        DateTimeValue::Date(d) => Some(SqlValue::Date(*d)),
        DateTimeValue::Timestamp(ts) => Some(SqlValue::Date(ts.date())),
        DateTimeValue::TimestampTz(ts) => Some(SqlValue::Date(ts.naive_local().date())),
        DateTimeValue::Time(_) => None,
    }
}

fn timestamp_part(dt: &DateTimeValue) -> Option<SqlValue> {
    match dt {
        DateTimeValue::Date(d) => d.and_hms_opt(0, 0, 0).map(SqlValue::Timestamp),
        DateTimeValue::Timestamp(ts) => Some(SqlValue::Timestamp(*ts)),
        DateTimeValue::TimestampTz(ts) => Some(SqlValue::Timestamp(ts.naive_local())),
        DateTimeValue::Time(_) => None,
    }
}

fn describe(item: &Item) -> String {
    match item {
        Item::String(s) => format!("string '{s}'"),
        Item::Number(n) => format!("number {n}"),
        Item::Boolean(b) => format!("boolean {b}"),
        Item::DateTime(dt) => format!("{} {dt}", dt.type_name()),
        other => other.type_name().to_string(),
    }
}

impl SqlValue {
    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlValue::Boolean(_) => SqlType::Boolean,
            SqlValue::Integer(_) => SqlType::Integer,
            SqlValue::BigInt(_) => SqlType::BigInt,
            SqlValue::Double(_) => SqlType::Double,
            SqlValue::Varchar(_) => SqlType::Varchar(None),
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::Timestamp(_) => SqlType::Timestamp,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Boolean(b) => JsonValue::Bool(*b),
            SqlValue::Integer(n) => JsonValue::from(*n),
            SqlValue::BigInt(n) => JsonValue::from(*n),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            other => JsonValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Boolean(b) => write!(f, "{b}"),
            SqlValue::Integer(n) => write!(f, "{n}"),
            SqlValue::BigInt(n) => write!(f, "{n}"),
            SqlValue::Double(n) => write!(f, "{n}"),
            SqlValue::Varchar(s) => write!(f, "{s}"),
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Boolean => write!(f, "boolean"),
            SqlType::Integer => write!(f, "integer"),
            SqlType::BigInt => write!(f, "bigint"),
            SqlType::Double => write!(f, "double"),
            SqlType::Varchar(None) => write!(f, "varchar"),
            SqlType::Varchar(Some(n)) => write!(f, "varchar({n})"),
            SqlType::Date => write!(f, "date"),
            SqlType::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl FromStr for SqlType {
    type Err = CoercionError;

    /// Parse a SQL type name such as `bigint` or `varchar(20)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let unknown = || CoercionError::UnknownType(s.to_string());
        match name.as_str() {
            "boolean" | "bool" => Ok(SqlType::Boolean),
            "integer" | "int" => Ok(SqlType::Integer),
            "bigint" => Ok(SqlType::BigInt),
            "double" => Ok(SqlType::Double),
            "varchar" => Ok(SqlType::Varchar(None)),
            "date" => Ok(SqlType::Date),
            "timestamp" => Ok(SqlType::Timestamp),
            other => {
                let len = other
                    .strip_prefix("varchar(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(unknown)?;
                let len = len.trim().parse::<u32>().map_err(|_| unknown())?;
                Ok(SqlType::Varchar(Some(len)))
            }
        }
    }
}
