//! IR types for SQL/JSON path expressions
//!
//! Split into:
//! - `node`: the path node tree (what the evaluator walks)
//! - this module: shared leaf types (literals, operators, methods, mode)
//!
//! The tree is produced by an external path compiler and is immutable once
//! built. It can be (de)serialized with serde so compiled paths can travel
//! with a plan.

pub mod node;

use serde::{Deserialize, Serialize};

use crate::validate::{self, PathValidationError};

pub use node::{PathNode, PathNodeKind, Subscript};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnarySign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Whether the operator only needs equality (usable on booleans)
    pub fn is_equality(self) -> bool {
        matches!(self, ComparisonOp::Equal | ComparisonOp::NotEqual)
    }
}

/// Item methods: `.type()`, `.size()`, `.double()`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Type,
    Size,
    Double,
    Ceiling,
    Floor,
    Abs,
    KeyValue,
    /// `.datetime()` or `.datetime("<chrono format>")`
    Datetime(Option<String>),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Type => "type",
            Method::Size => "size",
            Method::Double => "double",
            Method::Ceiling => "ceiling",
            Method::Floor => "floor",
            Method::Abs => "abs",
            Method::KeyValue => "keyvalue",
            Method::Datetime(_) => "datetime",
        }
    }
}

/// Path evaluation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    #[default]
    Lax,
    Strict,
}

impl PathMode {
    pub fn is_lax(self) -> bool {
        self == PathMode::Lax
    }

    pub fn unwrap_policy(self) -> crate::sequence::UnwrapPolicy {
        match self {
            PathMode::Lax => crate::sequence::UnwrapPolicy::EachStepOneLevel,
            PathMode::Strict => crate::sequence::UnwrapPolicy::Never,
        }
    }
}

/// A compiled path: mode plus a validated root node
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    mode: PathMode,
    root: PathNode,
}

impl JsonPath {
    /// Build a path, validating the tree once up front
    pub fn new(mode: PathMode, root: PathNode) -> Result<Self, PathValidationError> {
        validate::validate(&root)?;
        Ok(Self { mode, root })
    }

    pub fn lax(root: PathNode) -> Result<Self, PathValidationError> {
        Self::new(PathMode::Lax, root)
    }

    pub fn strict(root: PathNode) -> Result<Self, PathValidationError> {
        Self::new(PathMode::Strict, root)
    }

    pub fn mode(&self) -> PathMode {
        self.mode
    }

    pub fn root(&self) -> &PathNode {
        &self.root
    }
}
