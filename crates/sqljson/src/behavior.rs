//! ON ERROR / ON EMPTY behaviors and the resolver that applies them
//!
//! Each SQL/JSON function declares its behaviors with its own SQL-facing enum
//! (`ExistsBehavior`, `ValueBehavior`, `QueryBehavior`). All of them reduce to
//! a `Behavior<T>`, which `resolve_outcome` applies to an evaluation result.

use serde_json::Value as JsonValue;

use crate::coerce::SqlValue;

/// What to produce when an evaluation fails
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior<T> {
    /// SQL null
    Null,
    /// Re-raise the original error
    Error,
    /// A fixed fallback value
    Value(T),
}

impl<T: Clone> Behavior<T> {
    /// Apply the behavior to a failure
    pub fn fallback<E>(&self, error: E) -> Result<Option<T>, E> {
        match self {
            Behavior::Null => Ok(None),
            Behavior::Error => Err(error),
            Behavior::Value(value) => Ok(Some(value.clone())),
        }
    }

    pub fn raises(&self) -> bool {
        matches!(self, Behavior::Error)
    }
}

/// Map an evaluation outcome to the SQL-visible result.
///
/// Success passes through. A failure becomes null, the fallback value, or the
/// original error unchanged, depending on `behavior`.
pub fn resolve_outcome<T: Clone, E>(
    behavior: &Behavior<T>,
    outcome: Result<T, E>,
) -> Result<Option<T>, E> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(error) => behavior.fallback(error),
    }
}

/// `JSON_EXISTS ... { TRUE | FALSE | UNKNOWN | ERROR } ON ERROR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistsBehavior {
    #[default]
    False,
    True,
    Unknown,
    Error,
}

impl From<ExistsBehavior> for Behavior<bool> {
    fn from(behavior: ExistsBehavior) -> Self {
        match behavior {
            ExistsBehavior::False => Behavior::Value(false),
            ExistsBehavior::True => Behavior::Value(true),
            ExistsBehavior::Unknown => Behavior::Null,
            ExistsBehavior::Error => Behavior::Error,
        }
    }
}

/// `JSON_VALUE ... { NULL | ERROR | DEFAULT <value> } ON { EMPTY | ERROR }`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueBehavior {
    #[default]
    Null,
    Error,
    Default(SqlValue),
}

impl From<ValueBehavior> for Behavior<SqlValue> {
    fn from(behavior: ValueBehavior) -> Self {
        match behavior {
            ValueBehavior::Null => Behavior::Null,
            ValueBehavior::Error => Behavior::Error,
            ValueBehavior::Default(value) => Behavior::Value(value),
        }
    }
}

/// `JSON_QUERY ... { NULL | ERROR | EMPTY ARRAY | EMPTY OBJECT } ON { EMPTY | ERROR }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryBehavior {
    #[default]
    Null,
    Error,
    EmptyArray,
    EmptyObject,
}

impl From<QueryBehavior> for Behavior<JsonValue> {
    fn from(behavior: QueryBehavior) -> Self {
        match behavior {
            QueryBehavior::Null => Behavior::Null,
            QueryBehavior::Error => Behavior::Error,
            QueryBehavior::EmptyArray => Behavior::Value(JsonValue::Array(Vec::new())),
            QueryBehavior::EmptyObject => Behavior::Value(JsonValue::Object(Default::default())),
        }
    }
}
