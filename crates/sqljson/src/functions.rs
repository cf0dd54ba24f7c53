//! `JSON_EXISTS`, `JSON_VALUE` and `JSON_QUERY`
//!
//! Every function follows the same pipeline: reject inputs that already
//! failed an upstream conversion, bind the parameters row, evaluate the path,
//! then either convert the sequence to the SQL result or hand the failure to
//! the declared ON EMPTY / ON ERROR behavior.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::SqlJsonError;
use crate::behavior::{Behavior, ExistsBehavior, QueryBehavior, ValueBehavior, resolve_outcome};
use crate::bindings::{ParameterBindings, ParameterRow};
use crate::coerce::{SqlType, SqlValue};
use crate::eval::{EvalError, evaluate_prechecked};
use crate::ir::JsonPath;
use crate::item::Item;
use crate::sequence::Sequence;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlJsonFunction {
    Exists,
    Value,
    Query,
}

impl SqlJsonFunction {
    pub fn name(self) -> &'static str {
        match self {
            SqlJsonFunction::Exists => "JSON_EXISTS",
            SqlJsonFunction::Value => "JSON_VALUE",
            SqlJsonFunction::Query => "JSON_QUERY",
        }
    }
}

impl fmt::Display for SqlJsonFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `JSON_QUERY ... { WITHOUT | WITH CONDITIONAL | WITH UNCONDITIONAL } ARRAY WRAPPER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapperBehavior {
    #[default]
    Without,
    Conditional,
    Unconditional,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonValueOptions {
    /// `RETURNING` type. Falls back to the root node's declared type, then
    /// `VARCHAR`.
    pub returning: Option<SqlType>,
    pub on_empty: ValueBehavior,
    pub on_error: ValueBehavior,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonQueryOptions {
    pub wrapper: WrapperBehavior,
    pub on_empty: QueryBehavior,
    pub on_error: QueryBehavior,
}

/// `JSON_EXISTS(input, path PASSING parameters <on_error> ON ERROR)`.
///
/// `Ok(None)` is SQL null (`UNKNOWN ON ERROR`).
pub fn json_exists(
    input: &Item,
    path: &JsonPath,
    parameters: ParameterRow,
    on_error: ExistsBehavior,
) -> Result<Option<bool>, SqlJsonError> {
    const FUNCTION: SqlJsonFunction = SqlJsonFunction::Exists;

    let outcome = evaluate_for(FUNCTION, input, path, parameters)
        .map(|sequence| !sequence.is_empty())
        .map_err(SqlJsonError::from);
    on_error_behavior(FUNCTION, &on_error.into(), outcome)
}

/// `JSON_VALUE(input, path PASSING parameters RETURNING type ...)`.
///
/// Extracts one scalar. A JSON null result is SQL null.
pub fn json_value(
    input: &Item,
    path: &JsonPath,
    parameters: ParameterRow,
    options: &JsonValueOptions,
    session: &SessionContext,
) -> Result<Option<SqlValue>, SqlJsonError> {
    const FUNCTION: SqlJsonFunction = SqlJsonFunction::Value;
    let on_error: Behavior<SqlValue> = options.on_error.clone().into();

    let outcome = evaluate_for(FUNCTION, input, path, parameters)
        .and_then(|sequence| {
            if sequence.is_empty() {
                return Ok(None);
            }
            scalar_item(sequence).map(Some)
        })
        .map_err(SqlJsonError::from);

    let item = match outcome {
        Ok(Some(item)) => item,
        Ok(None) => return on_empty_behavior(FUNCTION, &options.on_empty.clone().into()),
        Err(error) => return on_error_behavior(FUNCTION, &on_error, Err(error)),
    };
    if item == Item::Null {
        return Ok(None);
    }

    let target = options
        .returning
        .or(path.root().declared_type)
        .unwrap_or(SqlType::Varchar(None));
    let coerced = session
        .coercion()
        .coerce(&item, &target)
        .map_err(SqlJsonError::from);
    on_error_behavior(FUNCTION, &on_error, coerced)
}

/// `JSON_QUERY(input, path PASSING parameters <wrapper> ...)`.
///
/// Returns the JSON result. Datetime items are rendered as ISO strings.
pub fn json_query(
    input: &Item,
    path: &JsonPath,
    parameters: ParameterRow,
    options: &JsonQueryOptions,
) -> Result<Option<JsonValue>, SqlJsonError> {
    const FUNCTION: SqlJsonFunction = SqlJsonFunction::Query;

    let outcome = evaluate_for(FUNCTION, input, path, parameters)
        .and_then(|sequence| {
            if sequence.is_empty() {
                return Ok(None);
            }
            wrap_result(options.wrapper, sequence).map(Some)
        })
        .map_err(SqlJsonError::from);

    match outcome {
        Ok(Some(json)) => Ok(Some(json)),
        Ok(None) => on_empty_behavior(FUNCTION, &options.on_empty.into()),
        Err(error) => on_error_behavior(FUNCTION, &options.on_error.into(), Err(error)),
    }
}

/// Sentinel checks, parameter binding and evaluation
fn evaluate_for(
    function: SqlJsonFunction,
    input: &Item,
    path: &JsonPath,
    parameters: ParameterRow,
) -> Result<Sequence, EvalError> {
    if input.contains_input_error() {
        return Err(EvalError::InputConversion(format!(
            "malformed input argument to {function} function"
        )));
    }
    if parameters
        .iter()
        .any(|(_, value)| value.contains_input_error())
    {
        return Err(EvalError::InputConversion(format!(
            "malformed JSON path parameter to {function} function"
        )));
    }
    let bindings = ParameterBindings::from_row(parameters)?;
    evaluate_prechecked(path.root(), input, &bindings, path.mode())
}

fn scalar_item(sequence: Sequence) -> Result<Item, EvalError> {
    let item = sequence.into_singleton().map_err(|sequence| {
        EvalError::Structural(format!(
            "singleton item required, path returned {} items",
            sequence.len()
        ))
    })?;
    if item.is_structured() {
        return Err(EvalError::Type(format!(
            "expected a scalar, path returned {}",
            item.type_name()
        )));
    }
    Ok(item)
}

fn wrap_result(wrapper: WrapperBehavior, sequence: Sequence) -> Result<JsonValue, EvalError> {
    match wrapper {
        WrapperBehavior::Without => sequence
            .into_singleton()
            .map(|item| item.to_json())
            .map_err(|sequence| {
                EvalError::Structural(format!(
                    "singleton item required without array wrapper, path returned {} items",
                    sequence.len()
                ))
            }),
        WrapperBehavior::Conditional => match sequence.into_singleton() {
            Ok(item) if item.is_structured() => Ok(item.to_json()),
            Ok(item) => Ok(JsonValue::Array(vec![item.to_json()])),
            Err(sequence) => Ok(sequence.wrap_into_array().to_json()),
        },
        WrapperBehavior::Unconditional => Ok(sequence.wrap_into_array().to_json()),
    }
}

fn on_error_behavior<T: Clone>(
    function: SqlJsonFunction,
    behavior: &Behavior<T>,
    outcome: Result<T, SqlJsonError>,
) -> Result<Option<T>, SqlJsonError> {
    if let Err(error) = &outcome
        && !behavior.raises()
    {
        log::debug!("{function}: {error}; applying ON ERROR behavior");
    }
    resolve_outcome(behavior, outcome)
}

fn on_empty_behavior<T: Clone>(
    function: SqlJsonFunction,
    behavior: &Behavior<T>,
) -> Result<Option<T>, SqlJsonError> {
    if !behavior.raises() {
        log::debug!("{function}: path returned no items; applying ON EMPTY behavior");
    }
    behavior.fallback(SqlJsonError::EmptyResult { function })
}
