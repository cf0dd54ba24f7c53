//! sqljson - SQL/JSON path execution core
//!
//! Evaluates pre-compiled SQL/JSON path expressions against JSON items and
//! implements the `JSON_EXISTS`, `JSON_VALUE` and `JSON_QUERY` functions on
//! top of the evaluator.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sqljson::{ExistsBehavior, Item, JsonPath, PathNode, json_exists};
//!
//! let doc = Item::from(serde_json::json!({"a": [1, 2, 3]}));
//! let path = JsonPath::lax(PathNode::context().member("a").index(2))?;
//!
//! assert_eq!(json_exists(&doc, &path, vec![], ExistsBehavior::False)?, Some(true));
//! ```
//!
//! ## Evaluating Paths Directly
//!
//! ```ignore
//! use sqljson::{ParameterBindings, PathMode, evaluate};
//!
//! let bindings = ParameterBindings::new().with_parameter("min", 2i64);
//! let path = PathNode::context()
//!     .member("a")
//!     .filter(PathNode::current().compare(ComparisonOp::GreaterThan, PathNode::variable("min")));
//!
//! let seq = evaluate(&path, &doc, &bindings, PathMode::Lax)?; // [3]
//! ```
//!
//! ## Modes
//!
//! - `lax`: arrays are unwrapped one level by consumers that expect
//!   non-arrays, non-arrays are wrapped by array accessors, and missing
//!   members are skipped
//! - `strict`: any shape mismatch is a structural error

mod behavior;
mod bindings;
mod coerce;
mod eval;
mod functions;
pub mod ir;
mod item;
mod methods;
mod predicate;
mod pretty;
mod sequence;
mod session;
mod validate;

use thiserror::Error;

// ============ Primary Public API ============

pub use functions::{
    JsonQueryOptions, JsonValueOptions, SqlJsonFunction, WrapperBehavior, json_exists,
    json_query, json_value,
};
pub use session::SessionContext;

pub use bindings::{BindingError, ParameterBindings, ParameterRow};
pub use eval::{EvalError, evaluate};
pub use ir::{JsonPath, PathMode, PathNode};
pub use item::{DateTimeValue, Item, Number};
pub use sequence::{Sequence, UnwrapPolicy};

// ============ Errors ============

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlJsonError {
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),
    #[error("{function} path returned no items")]
    EmptyResult { function: SqlJsonFunction },
}

pub use validate::PathValidationError;

// ============ Behaviors and Coercion ============

pub use behavior::{Behavior, ExistsBehavior, QueryBehavior, ValueBehavior, resolve_outcome};
pub use coerce::{CoercionError, SqlType, SqlValue, StandardCoercion, TypeCoercion};

// ============ Advanced: Evaluator Internals ============

/// Lower-level pieces for callers that drive evaluation themselves
pub mod advanced {
    pub use crate::predicate::{Truth, compare_items};
    pub use crate::sequence::wrap;
    pub use crate::validate::validate;
}
