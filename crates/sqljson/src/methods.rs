//! Item methods: `.type()`, `.size()`, `.double()`, `.ceiling()`, `.floor()`,
//! `.abs()`, `.keyvalue()`, `.datetime()`
//!
//! Methods apply to every item of the target sequence. Apart from `type` and
//! `size`, lax mode first unwraps array items.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::eval::{EvalError, Result};
use crate::ir::{Method, PathMode};
use crate::item::{DateTimeValue, Item, Number};
use crate::sequence::Sequence;

pub(crate) fn apply_method(method: &Method, input: Sequence, mode: PathMode) -> Result<Sequence> {
    match method {
        Method::Type => Ok(input
            .iter()
            .map(|item| Item::string(item.type_name()))
            .collect()),
        Method::Size => input.iter().map(|item| size(item, mode)).collect(),
        Method::Double => map_items(input, mode, double),
        Method::Ceiling => map_numbers(input, mode, "ceiling", |n| match n {
            Number::Int(i) => Ok(Number::Int(i)),
            Number::Float(f) => Ok(Number::Float(f.ceil())),
        }),
        Method::Floor => map_numbers(input, mode, "floor", |n| match n {
            Number::Int(i) => Ok(Number::Int(i)),
            Number::Float(f) => Ok(Number::Float(f.floor())),
        }),
        Method::Abs => map_numbers(input, mode, "abs", |n| match n {
            Number::Int(i) => i.checked_abs().map(Number::Int).ok_or_else(|| {
                EvalError::Arithmetic(format!("integer overflow in abs({i})"))
            }),
            Number::Float(f) => Ok(Number::Float(f.abs())),
        }),
        Method::KeyValue => keyvalue(input, mode),
        Method::Datetime(template) => map_items(input, mode, |item| {
            datetime(item, template.as_deref()).map(Item::DateTime)
        }),
    }
}

fn size(item: &Item, mode: PathMode) -> Result<Item> {
    match item {
        Item::Array(elements) => Ok(Item::int(elements.len() as i64)),
        _ if mode.is_lax() => Ok(Item::int(1)),
        other => Err(EvalError::Structural(format!(
            "size() applied to {}",
            other.type_name()
        ))),
    }
}

fn map_items(
    input: Sequence,
    mode: PathMode,
    f: impl Fn(Item) -> Result<Item>,
) -> Result<Sequence> {
    input.unwrap_arrays(mode).into_iter().map(f).collect()
}

fn map_numbers(
    input: Sequence,
    mode: PathMode,
    name: &str,
    f: impl Fn(Number) -> Result<Number>,
) -> Result<Sequence> {
    map_items(input, mode, |item| match item {
        Item::Number(n) => f(n).map(Item::Number),
        other => Err(EvalError::Type(format!(
            "{name}() expects a number, found {}",
            other.type_name()
        ))),
    })
}

fn double(item: Item) -> Result<Item> {
    let value = match item {
        Item::Number(n) => n.as_f64(),
        Item::String(s) => s.trim().parse::<f64>().map_err(|_| {
            EvalError::Type(format!("double() cannot convert string '{s}' to a number"))
        })?,
        other => {
            return Err(EvalError::Type(format!(
                "double() expects a number or string, found {}",
                other.type_name()
            )));
        }
    };
    if value.is_finite() {
        Ok(Item::float(value))
    } else {
        Err(EvalError::Arithmetic(format!(
            "double() result {value} is not finite"
        )))
    }
}

/// Expand objects into `{"key", "value", "id"}` items, `id` being the
/// position of the source object in the method's input.
fn keyvalue(input: Sequence, mode: PathMode) -> Result<Sequence> {
    let mut out = Sequence::empty();
    for (id, item) in input.unwrap_arrays(mode).into_iter().enumerate() {
        let members = match item {
            Item::Object(members) => members,
            other => {
                return Err(EvalError::Type(format!(
                    "keyvalue() expects an object, found {}",
                    other.type_name()
                )));
            }
        };
        for (key, value) in members {
            let mut entry = IndexMap::with_capacity(3);
            entry.insert("key".to_string(), Item::String(key));
            entry.insert("value".to_string(), value);
            entry.insert("id".to_string(), Item::int(id as i64));
            out.push(Item::Object(entry));
        }
    }
    Ok(out)
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const TIMESTAMP_TZ_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

fn datetime(item: Item, template: Option<&str>) -> Result<DateTimeValue> {
    let text = match item {
        Item::String(text) => text,
        other => {
            return Err(EvalError::Type(format!(
                "datetime() expects a string, found {}",
                other.type_name()
            )));
        }
    };
    let parsed = match template {
        Some(template) => parse_with_template(&text, template),
        None => parse_iso(&text),
    };
    parsed.ok_or_else(|| EvalError::Type(format!("datetime() cannot parse '{text}'")))
}

pub(crate) fn parse_iso(text: &str) -> Option<DateTimeValue> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(DateTimeValue::TimestampTz(ts));
    }
    for format in TIMESTAMP_TZ_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, format) {
            return Some(DateTimeValue::TimestampTz(ts));
        }
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(DateTimeValue::Timestamp(ts));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(DateTimeValue::Date(date));
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .ok()
        .map(DateTimeValue::Time)
}

/// Most specific kind the template can produce wins
fn parse_with_template(text: &str, template: &str) -> Option<DateTimeValue> {
    if let Ok(ts) = DateTime::parse_from_str(text, template) {
        return Some(DateTimeValue::TimestampTz(ts));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, template) {
        return Some(DateTimeValue::Timestamp(ts));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, template) {
        return Some(DateTimeValue::Date(date));
    }
    NaiveTime::parse_from_str(text, template)
        .ok()
        .map(DateTimeValue::Time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seq(doc: serde_json::Value) -> Sequence {
        Sequence::singleton(Item::from(doc))
    }

    fn apply(method: Method, doc: serde_json::Value, mode: PathMode) -> Result<Vec<Item>> {
        apply_method(&method, seq(doc), mode).map(Sequence::into_items)
    }

    #[test]
    fn size_of_scalar_depends_on_mode() {
        assert_eq!(apply(Method::Size, json!([1, 2, 3]), PathMode::Strict).unwrap(), vec![Item::int(3)]);
        assert_eq!(apply(Method::Size, json!("x"), PathMode::Lax).unwrap(), vec![Item::int(1)]);
        assert!(matches!(
            apply(Method::Size, json!("x"), PathMode::Strict),
            Err(EvalError::Structural(_))
        ));
    }

    #[test]
    fn type_names() {
        let input: Sequence = vec![
            Item::Null,
            Item::Boolean(true),
            Item::int(1),
            Item::string("s"),
            Item::Array(vec![]),
            Item::from(json!({})),
        ]
        .into();
        let names: Vec<Item> = apply_method(&Method::Type, input, PathMode::Lax)
            .unwrap()
            .into_items();
        let expected: Vec<Item> = ["null", "boolean", "number", "string", "array", "object"]
            .into_iter()
            .map(Item::from)
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn numeric_methods() {
        assert_eq!(
            apply(Method::Ceiling, json!(1.2), PathMode::Lax).unwrap(),
            vec![Item::float(2.0)]
        );
        assert_eq!(
            apply(Method::Floor, json!([-1.5, 3]), PathMode::Lax).unwrap(),
            vec![Item::float(-2.0), Item::int(3)]
        );
        assert_eq!(apply(Method::Abs, json!(-4), PathMode::Lax).unwrap(), vec![Item::int(4)]);
        assert!(matches!(
            apply(Method::Abs, json!(i64::MIN), PathMode::Lax),
            Err(EvalError::Arithmetic(_))
        ));
        assert!(matches!(
            apply(Method::Floor, json!("1"), PathMode::Lax),
            Err(EvalError::Type(_))
        ));
        assert!(matches!(
            apply(Method::Abs, json!([-1]), PathMode::Strict),
            Err(EvalError::Type(_))
        ));
    }

    #[test]
    fn double_accepts_numeric_strings() {
        assert_eq!(
            apply(Method::Double, json!(" 2.5 "), PathMode::Lax).unwrap(),
            vec![Item::float(2.5)]
        );
        assert_eq!(apply(Method::Double, json!(3), PathMode::Lax).unwrap(), vec![Item::float(3.0)]);
        assert!(matches!(
            apply(Method::Double, json!("abc"), PathMode::Lax),
            Err(EvalError::Type(_))
        ));
        assert!(matches!(
            apply(Method::Double, json!("NaN"), PathMode::Lax),
            Err(EvalError::Arithmetic(_))
        ));
    }

    #[test]
    fn keyvalue_triples() {
        let out = apply(Method::KeyValue, json!([{"a": 1, "b": 2}, {"c": 3}]), PathMode::Lax).unwrap();
        let as_json: Vec<_> = out.iter().map(Item::to_json).collect();
        assert_eq!(
            as_json,
            vec![
                json!({"key": "a", "value": 1, "id": 0}),
                json!({"key": "b", "value": 2, "id": 0}),
                json!({"key": "c", "value": 3, "id": 1}),
            ]
        );
        assert!(matches!(
            apply(Method::KeyValue, json!(1), PathMode::Lax),
            Err(EvalError::Type(_))
        ));
    }

    #[test]
    fn datetime_recognizes_iso_forms() {
        let kinds: Vec<&str> = [
            "2024-01-31",
            "12:30:00",
            "2024-01-31T12:30:00.5",
            "2024-01-31 12:30:00",
            "2024-01-31T12:30:00+02:00",
        ]
        .into_iter()
        .map(|text| {
            let out = apply(Method::Datetime(None), json!(text), PathMode::Lax).unwrap();
            out[0].type_name()
        })
        .collect();
        assert_eq!(
            kinds,
            [
                "date",
                "time without time zone",
                "timestamp without time zone",
                "timestamp without time zone",
                "timestamp with time zone",
            ]
        );
    }

    #[test]
    fn datetime_with_template() {
        let method = Method::Datetime(Some("%d/%m/%Y".to_string()));
        let out = apply(method, json!("31/01/2024"), PathMode::Lax).unwrap();
        assert_eq!(out[0].to_json(), json!("2024-01-31"));

        assert!(matches!(
            apply(Method::Datetime(None), json!("yesterday"), PathMode::Lax),
            Err(EvalError::Type(_))
        ));
        assert!(matches!(
            apply(Method::Datetime(None), json!(20240131), PathMode::Lax),
            Err(EvalError::Type(_))
        ));
    }
}
