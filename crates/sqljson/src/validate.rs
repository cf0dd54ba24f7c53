//! Structural checks run once when a `JsonPath` is built
//!
//! This pass rejects trees the evaluator could only fail on at run time:
//! - `@` outside a filter predicate
//! - `last` outside an array subscript
//! - a filter whose predicate is not a predicate node
//! - a predicate used as an arithmetic operand or accessor target
//! - an empty `datetime` template

use thiserror::Error;

use crate::ir::{Method, PathNode, PathNodeKind, Subscript};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathValidationError {
    #[error("@ used outside of a filter: {0}")]
    CurrentItemOutsideFilter(String),

    #[error("last used outside of an array subscript: {0}")]
    LastOutsideSubscript(String),

    #[error("filter expects a predicate, found {0}")]
    FilterNotPredicate(String),

    #[error("predicate cannot be used as a value here: {0}")]
    PredicateAsValue(String),

    #[error("datetime() template is empty")]
    EmptyDatetimeTemplate,
}

/// Validate a path tree
pub fn validate(root: &PathNode) -> Result<(), PathValidationError> {
    walk(root, Context::default())
}

#[derive(Clone, Copy, Default)]
struct Context {
    in_filter: bool,
    in_subscript: bool,
}

fn walk(node: &PathNode, cx: Context) -> Result<(), PathValidationError> {
    match &node.kind {
        PathNodeKind::Literal(_)
        | PathNodeKind::ContextVariable
        | PathNodeKind::NamedValueVariable(_)
        | PathNodeKind::PositionalVariable(_) => Ok(()),
        PathNodeKind::CurrentItem if cx.in_filter => Ok(()),
        PathNodeKind::CurrentItem => Err(PathValidationError::CurrentItemOutsideFilter(
            node.to_string(),
        )),
        PathNodeKind::LastIndex if cx.in_subscript => Ok(()),
        PathNodeKind::LastIndex => {
            Err(PathValidationError::LastOutsideSubscript(node.to_string()))
        }
        PathNodeKind::MemberAccessor { target, .. }
        | PathNodeKind::WildcardMemberAccessor { target }
        | PathNodeKind::DescendantMemberAccessor { target, .. } => value(target, cx),
        PathNodeKind::MethodCall { target, method } => {
            if let Method::Datetime(Some(template)) = method
                && template.is_empty()
            {
                return Err(PathValidationError::EmptyDatetimeTemplate);
            }
            value(target, cx)
        }
        PathNodeKind::ArrayAccessor { target, subscripts } => {
            value(target, cx)?;
            let inner = Context {
                in_subscript: true,
                ..cx
            };
            for subscript in subscripts {
                match subscript {
                    Subscript::Index(expr) => value(expr, inner)?,
                    Subscript::Range { from, to } => {
                        value(from, inner)?;
                        value(to, inner)?;
                    }
                    Subscript::Last | Subscript::Wildcard => {}
                }
            }
            Ok(())
        }
        PathNodeKind::Filter { target, predicate } => {
            value(target, cx)?;
            if !predicate.is_predicate() {
                return Err(PathValidationError::FilterNotPredicate(
                    predicate.to_string(),
                ));
            }
            walk(
                predicate,
                Context {
                    in_filter: true,
                    ..cx
                },
            )
        }
        PathNodeKind::UnaryArithmetic { operand, .. } => value(operand, cx),
        PathNodeKind::BinaryArithmetic { left, right, .. } => {
            value(left, cx)?;
            value(right, cx)
        }
        PathNodeKind::Comparison { left, right, .. }
        | PathNodeKind::Conjunction { left, right }
        | PathNodeKind::Disjunction { left, right } => {
            walk(left, cx)?;
            walk(right, cx)
        }
        PathNodeKind::StartsWith { whole, initial } => {
            walk(whole, cx)?;
            walk(initial, cx)
        }
        PathNodeKind::Negation(inner)
        | PathNodeKind::Exists(inner)
        | PathNodeKind::IsUnknown(inner) => walk(inner, cx),
    }
}

/// Walk a node that must produce values rather than a truth value
fn value(node: &PathNode, cx: Context) -> Result<(), PathValidationError> {
    if node.is_predicate() {
        return Err(PathValidationError::PredicateAsValue(node.to_string()));
    }
    walk(node, cx)
}
