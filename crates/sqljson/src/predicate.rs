//! Three-valued predicates: comparisons, logical composition, exists,
//! `is unknown` and `starts with`.
//!
//! Data errors inside a predicate do not fail the path; they make the
//! predicate `Unknown`.

use std::cmp::Ordering;

use crate::eval::{EvalError, Result, Scope, eval};
use crate::ir::{ComparisonOp, PathNode, PathNodeKind};
use crate::item::Item;
use crate::sequence::Sequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn from_bool(b: bool) -> Self {
        if b { Truth::True } else { Truth::False }
    }

    pub fn is_true(self) -> bool {
        self == Truth::True
    }

    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    pub fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }

    /// Boolean item, or JSON null for unknown
    pub fn to_item(self) -> Item {
        match self {
            Truth::True => Item::Boolean(true),
            Truth::False => Item::Boolean(false),
            Truth::Unknown => Item::Null,
        }
    }
}

pub(crate) fn eval_predicate(node: &PathNode, scope: &Scope<'_>) -> Result<Truth> {
    match &node.kind {
        PathNodeKind::Comparison { op, left, right } => eval_comparison(*op, left, right, scope),
        PathNodeKind::Conjunction { left, right } => {
            let lhs = eval_predicate(left, scope)?;
            if lhs == Truth::False {
                return Ok(Truth::False);
            }
            Ok(lhs.and(eval_predicate(right, scope)?))
        }
        PathNodeKind::Disjunction { left, right } => {
            let lhs = eval_predicate(left, scope)?;
            if lhs == Truth::True {
                return Ok(Truth::True);
            }
            Ok(lhs.or(eval_predicate(right, scope)?))
        }
        PathNodeKind::Negation(inner) => Ok(eval_predicate(inner, scope)?.not()),
        PathNodeKind::IsUnknown(inner) => {
            Ok(Truth::from_bool(eval_predicate(inner, scope)? == Truth::Unknown))
        }
        // no unwrap here: an empty array is still an item
        PathNodeKind::Exists(path) => match eval(path, scope) {
            Ok(seq) => Ok(Truth::from_bool(!seq.is_empty())),
            Err(e) if e.is_data_error() => Ok(Truth::Unknown),
            Err(e) => Err(e),
        },
        PathNodeKind::StartsWith { whole, initial } => eval_starts_with(whole, initial, scope),
        PathNodeKind::Literal(_)
        | PathNodeKind::ContextVariable
        | PathNodeKind::NamedValueVariable(_)
        | PathNodeKind::PositionalVariable(_)
        | PathNodeKind::CurrentItem
        | PathNodeKind::LastIndex
        | PathNodeKind::MemberAccessor { .. }
        | PathNodeKind::WildcardMemberAccessor { .. }
        | PathNodeKind::DescendantMemberAccessor { .. }
        | PathNodeKind::ArrayAccessor { .. }
        | PathNodeKind::Filter { .. }
        | PathNodeKind::UnaryArithmetic { .. }
        | PathNodeKind::BinaryArithmetic { .. }
        | PathNodeKind::MethodCall { .. } => Err(EvalError::Type(format!(
            "filter expects a predicate, found {node}"
        ))),
    }
}

/// Evaluate a predicate operand; `None` when it failed with a data error
fn operand(node: &PathNode, scope: &Scope<'_>) -> Result<Option<Sequence>> {
    match eval(node, scope) {
        Ok(seq) => Ok(Some(seq.unwrap_arrays(scope.mode))),
        Err(e) if e.is_data_error() => {
            log::trace!("predicate operand {node} is unknown: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Folds the per-candidate outcomes of `starts with` following lax/strict
/// rules.
///
/// Lax: true as soon as any candidate is true. Strict: unknown as soon as any
/// candidate is unknown.
struct TruthFold {
    lax: bool,
    found_true: bool,
    found_unknown: bool,
}

impl TruthFold {
    fn new(scope: &Scope<'_>) -> Self {
        Self {
            lax: scope.mode.is_lax(),
            found_true: false,
            found_unknown: false,
        }
    }

    /// Record one outcome; returns the final answer when it is already decided
    fn push(&mut self, outcome: Truth) -> Option<Truth> {
        match outcome {
            Truth::True if self.lax => Some(Truth::True),
            Truth::True => {
                self.found_true = true;
                None
            }
            Truth::Unknown if !self.lax => Some(Truth::Unknown),
            Truth::Unknown => {
                self.found_unknown = true;
                None
            }
            Truth::False => None,
        }
    }

    fn finish(self) -> Truth {
        if self.found_true {
            Truth::True
        } else if self.found_unknown {
            Truth::Unknown
        } else {
            Truth::False
        }
    }
}

fn eval_comparison(
    op: ComparisonOp,
    left: &PathNode,
    right: &PathNode,
    scope: &Scope<'_>,
) -> Result<Truth> {
    let Some(lhs) = operand(left, scope)? else {
        return Ok(Truth::Unknown);
    };
    let Some(rhs) = operand(right, scope)? else {
        return Ok(Truth::Unknown);
    };

    if lhs.is_empty() || rhs.is_empty() {
        return Ok(Truth::False);
    }
    match (comparison_item(lhs), comparison_item(rhs)) {
        (Ok(l), Ok(r)) => Ok(compare_items(op, &l, &r)),
        (Err(e), _) | (_, Err(e)) => {
            log::trace!("comparison {op} is unknown: {e}");
            Ok(Truth::Unknown)
        }
    }
}

/// Each side of a comparison must hold exactly one item
fn comparison_item(operand: Sequence) -> Result<Item> {
    operand.into_singleton().map_err(|seq| {
        EvalError::Structural(format!(
            "comparison operand: singleton required, found {} items",
            seq.len()
        ))
    })
}

/// Compare two items. Nulls and incomparable pairs are unknown.
pub fn compare_items(op: ComparisonOp, left: &Item, right: &Item) -> Truth {
    let ordering = match (left, right) {
        (Item::Number(a), Item::Number(b)) => a.compare(*b),
        (Item::String(a), Item::String(b)) => Some(a.cmp(b)),
        (Item::Boolean(a), Item::Boolean(b)) if op.is_equality() => Some(a.cmp(b)),
        (Item::DateTime(a), Item::DateTime(b)) => a.compare(b),
        _ => None,
    };
    match ordering {
        Some(ordering) => Truth::from_bool(apply_ordering(op, ordering)),
        None => Truth::Unknown,
    }
}

fn apply_ordering(op: ComparisonOp, ordering: Ordering) -> bool {
    match op {
        ComparisonOp::Equal => ordering == Ordering::Equal,
        ComparisonOp::NotEqual => ordering != Ordering::Equal,
        ComparisonOp::LessThan => ordering == Ordering::Less,
        ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
        ComparisonOp::GreaterThan => ordering == Ordering::Greater,
        ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
    }
}

fn eval_starts_with(whole: &PathNode, initial: &PathNode, scope: &Scope<'_>) -> Result<Truth> {
    let Some(prefix) = operand(initial, scope)? else {
        return Ok(Truth::Unknown);
    };
    let prefix = match prefix.into_singleton() {
        Ok(Item::String(prefix)) => prefix,
        _ => return Ok(Truth::Unknown),
    };
    let Some(candidates) = operand(whole, scope)? else {
        return Ok(Truth::Unknown);
    };

    let mut fold = TruthFold::new(scope);
    for candidate in &candidates {
        let outcome = match candidate {
            Item::String(s) => Truth::from_bool(s.starts_with(prefix.as_str())),
            _ => Truth::Unknown,
        };
        if let Some(decided) = fold.push(outcome) {
            return Ok(decided);
        }
    }
    Ok(fold.finish())
}
