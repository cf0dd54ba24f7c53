//! Path node tree - what the evaluator walks
//!
//! A closed set of node kinds. Every consumer matches on `PathNodeKind`
//! exhaustively, so adding a kind fails to compile until each site handles it.

use serde::{Deserialize, Serialize};

use super::{ArithmeticOp, ComparisonOp, Literal, Method, UnarySign};
use crate::coerce::SqlType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub kind: PathNodeKind,
    /// Output type hint, consulted only when converting a final result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<SqlType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathNodeKind {
    /// Scalar literal: `1`, `"abc"`, `null`
    Literal(Literal),

    /// `$`
    ContextVariable,

    /// `$name`, resolved by name from the parameter bindings
    NamedValueVariable(String),

    /// Parameter resolved by its position in the parameters row
    PositionalVariable(usize),

    /// `@` inside a filter predicate
    CurrentItem,

    /// `last` inside an array subscript
    LastIndex,

    /// `target.name`
    MemberAccessor { target: Box<PathNode>, name: String },

    /// `target.*`
    WildcardMemberAccessor { target: Box<PathNode> },

    /// `target..name`
    DescendantMemberAccessor { target: Box<PathNode>, name: String },

    /// `target[0, 2 to 4, last]`
    ArrayAccessor {
        target: Box<PathNode>,
        subscripts: Vec<Subscript>,
    },

    /// `target ? (predicate)`
    Filter {
        target: Box<PathNode>,
        predicate: Box<PathNode>,
    },

    /// `-operand`, `+operand`
    UnaryArithmetic {
        sign: UnarySign,
        operand: Box<PathNode>,
    },

    /// `left + right`, ...
    BinaryArithmetic {
        op: ArithmeticOp,
        left: Box<PathNode>,
        right: Box<PathNode>,
    },

    /// `target.method()`
    MethodCall { target: Box<PathNode>, method: Method },

    // === Predicates ===
    /// `left == right`, ...
    Comparison {
        op: ComparisonOp,
        left: Box<PathNode>,
        right: Box<PathNode>,
    },

    /// `left && right`
    Conjunction {
        left: Box<PathNode>,
        right: Box<PathNode>,
    },

    /// `left || right`
    Disjunction {
        left: Box<PathNode>,
        right: Box<PathNode>,
    },

    /// `!(predicate)`
    Negation(Box<PathNode>),

    /// `exists (path)`
    Exists(Box<PathNode>),

    /// `(predicate) is unknown`
    IsUnknown(Box<PathNode>),

    /// `whole starts with initial`
    StartsWith {
        whole: Box<PathNode>,
        initial: Box<PathNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscript {
    /// `[expr]`
    Index(PathNode),
    /// `[from to to]`
    Range { from: PathNode, to: PathNode },
    /// `[last]`
    Last,
    /// `[*]`
    Wildcard,
}

impl From<PathNodeKind> for PathNode {
    fn from(kind: PathNodeKind) -> Self {
        PathNode {
            kind,
            declared_type: None,
        }
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n.into())
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl PathNode {
    pub fn new(kind: PathNodeKind) -> Self {
        kind.into()
    }

    pub fn with_declared_type(mut self, ty: SqlType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    /// Predicate nodes evaluate to a truth value rather than a sequence
    pub fn is_predicate(&self) -> bool {
        matches!(
            self.kind,
            PathNodeKind::Comparison { .. }
                | PathNodeKind::Conjunction { .. }
                | PathNodeKind::Disjunction { .. }
                | PathNodeKind::Negation(_)
                | PathNodeKind::Exists(_)
                | PathNodeKind::IsUnknown(_)
                | PathNodeKind::StartsWith { .. }
        )
    }

    // ---- leaves ----

    pub fn context() -> Self {
        PathNodeKind::ContextVariable.into()
    }

    pub fn current() -> Self {
        PathNodeKind::CurrentItem.into()
    }

    pub fn last() -> Self {
        PathNodeKind::LastIndex.into()
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        PathNodeKind::Literal(value.into()).into()
    }

    pub fn null() -> Self {
        PathNodeKind::Literal(Literal::Null).into()
    }

    pub fn variable(name: impl Into<String>) -> Self {
        PathNodeKind::NamedValueVariable(name.into()).into()
    }

    pub fn positional(index: usize) -> Self {
        PathNodeKind::PositionalVariable(index).into()
    }

    // ---- accessors ----

    pub fn member(self, name: impl Into<String>) -> Self {
        PathNodeKind::MemberAccessor {
            target: Box::new(self),
            name: name.into(),
        }
        .into()
    }

    pub fn wildcard_member(self) -> Self {
        PathNodeKind::WildcardMemberAccessor {
            target: Box::new(self),
        }
        .into()
    }

    pub fn descendant(self, name: impl Into<String>) -> Self {
        PathNodeKind::DescendantMemberAccessor {
            target: Box::new(self),
            name: name.into(),
        }
        .into()
    }

    pub fn subscripts(self, subscripts: Vec<Subscript>) -> Self {
        PathNodeKind::ArrayAccessor {
            target: Box::new(self),
            subscripts,
        }
        .into()
    }

    /// `[n]` with a literal index
    pub fn index(self, n: i64) -> Self {
        self.subscripts(vec![Subscript::Index(PathNode::literal(n))])
    }

    /// `[from to to]` with literal bounds
    pub fn range(self, from: i64, to: i64) -> Self {
        self.subscripts(vec![Subscript::Range {
            from: PathNode::literal(from),
            to: PathNode::literal(to),
        }])
    }

    /// `[last]`
    pub fn last_element(self) -> Self {
        self.subscripts(vec![Subscript::Last])
    }

    /// `[*]`
    pub fn elements(self) -> Self {
        self.subscripts(vec![Subscript::Wildcard])
    }

    pub fn filter(self, predicate: PathNode) -> Self {
        PathNodeKind::Filter {
            target: Box::new(self),
            predicate: Box::new(predicate),
        }
        .into()
    }

    pub fn method(self, method: Method) -> Self {
        PathNodeKind::MethodCall {
            target: Box::new(self),
            method,
        }
        .into()
    }

    // ---- arithmetic ----

    pub fn arith(self, op: ArithmeticOp, rhs: PathNode) -> Self {
        PathNodeKind::BinaryArithmetic {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
        .into()
    }

    pub fn sign(self, sign: UnarySign) -> Self {
        PathNodeKind::UnaryArithmetic {
            sign,
            operand: Box::new(self),
        }
        .into()
    }

    // ---- predicates ----

    pub fn compare(self, op: ComparisonOp, rhs: PathNode) -> Self {
        PathNodeKind::Comparison {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
        .into()
    }

    pub fn and(self, rhs: PathNode) -> Self {
        PathNodeKind::Conjunction {
            left: Box::new(self),
            right: Box::new(rhs),
        }
        .into()
    }

    pub fn or(self, rhs: PathNode) -> Self {
        PathNodeKind::Disjunction {
            left: Box::new(self),
            right: Box::new(rhs),
        }
        .into()
    }

    pub fn not(self) -> Self {
        PathNodeKind::Negation(Box::new(self)).into()
    }

    pub fn exists(self) -> Self {
        PathNodeKind::Exists(Box::new(self)).into()
    }

    pub fn is_unknown(self) -> Self {
        PathNodeKind::IsUnknown(Box::new(self)).into()
    }

    pub fn starts_with(self, initial: PathNode) -> Self {
        PathNodeKind::StartsWith {
            whole: Box::new(self),
            initial: Box::new(initial),
        }
        .into()
    }
}
