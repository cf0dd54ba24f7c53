//! JSON-like items that path evaluation produces and consumes
//!
//! Items are built from an already-parsed document (the JSON codec lives
//! outside this crate; `serde_json::Value` is the exchange format) or from
//! typed SQL parameter values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::ir::Literal;

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    DateTime(DateTimeValue),
    Array(Vec<Item>),
    Object(IndexMap<String, Item>),
    /// An upstream conversion already failed for this value. Never evaluated,
    /// only propagated.
    InputError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateTimeValue {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    /// The value as an exact integer, if it has no fractional part
    pub fn as_integral(self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(n),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
            Number::Float(_) => None,
        }
    }

    /// Numeric comparison with int -> float promotion
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

impl DateTimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DateTimeValue::Date(_) => "date",
            DateTimeValue::Time(_) => "time without time zone",
            DateTimeValue::Timestamp(_) => "timestamp without time zone",
            DateTimeValue::TimestampTz(_) => "timestamp with time zone",
        }
    }

    /// Ordering between values of the same kind; other pairs are incomparable
    pub fn compare(&self, other: &DateTimeValue) -> Option<Ordering> {
        match (self, other) {
            (DateTimeValue::Date(a), DateTimeValue::Date(b)) => Some(a.cmp(b)),
            (DateTimeValue::Time(a), DateTimeValue::Time(b)) => Some(a.cmp(b)),
            (DateTimeValue::Timestamp(a), DateTimeValue::Timestamp(b)) => Some(a.cmp(b)),
            (DateTimeValue::TimestampTz(a), DateTimeValue::TimestampTz(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateTimeValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            DateTimeValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
            DateTimeValue::TimestampTz(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl Item {
    pub fn int(n: i64) -> Self {
        Item::Number(Number::Int(n))
    }

    pub fn float(n: f64) -> Self {
        Item::Number(Number::Float(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Item::String(s.into())
    }

    /// Runtime JSON type, as reported by the `.type()` method
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Null => "null",
            Item::Boolean(_) => "boolean",
            Item::Number(_) => "number",
            Item::String(_) => "string",
            Item::DateTime(dt) => dt.type_name(),
            Item::Array(_) => "array",
            Item::Object(_) => "object",
            Item::InputError => "input error",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Item::Array(_))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Item::Array(_) | Item::Object(_))
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Item::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether the sentinel occurs at any depth
    pub fn contains_input_error(&self) -> bool {
        match self {
            Item::InputError => true,
            Item::Array(items) => items.iter().any(Item::contains_input_error),
            Item::Object(members) => members.values().any(Item::contains_input_error),
            Item::Null
            | Item::Boolean(_)
            | Item::Number(_)
            | Item::String(_)
            | Item::DateTime(_) => false,
        }
    }

    /// Convert to the JSON exchange format.
    ///
    /// Datetimes become ISO strings. Non-finite floats and the sentinel have no
    /// JSON form and become `null`; the function layer rejects the sentinel
    /// before evaluation, so it does not reach output.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Item::Null | Item::InputError => JsonValue::Null,
            Item::Boolean(b) => JsonValue::Bool(*b),
            Item::Number(Number::Int(n)) => JsonValue::from(*n),
            Item::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Item::String(s) => JsonValue::String(s.clone()),
            Item::DateTime(dt) => JsonValue::String(dt.to_string()),
            Item::Array(items) => JsonValue::Array(items.iter().map(Item::to_json).collect()),
            Item::Object(members) => JsonValue::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Item {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Item::Null,
            JsonValue::Bool(b) => Item::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Item::int(i),
                None => Item::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Item::String(s),
            JsonValue::Array(items) => Item::Array(items.into_iter().map(Item::from).collect()),
            JsonValue::Object(members) => {
                Item::Object(members.into_iter().map(|(k, v)| (k, Item::from(v))).collect())
            }
        }
    }
}

impl From<&Literal> for Item {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::String(s) => Item::String(s.clone()),
            Literal::Int(n) => Item::int(*n),
            Literal::Float(f) => Item::float(*f),
            Literal::Bool(b) => Item::Boolean(*b),
            Literal::Null => Item::Null,
        }
    }
}

impl From<bool> for Item {
    fn from(b: bool) -> Self {
        Item::Boolean(b)
    }
}

impl From<i64> for Item {
    fn from(n: i64) -> Self {
        Item::int(n)
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Self {
        Item::string(s)
    }
}
