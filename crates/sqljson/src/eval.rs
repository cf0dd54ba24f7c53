//! Evaluator that walks a path IR against an input item
//!
//! Evaluates `PathNode` trees to `Sequence`s. Pure and synchronous: no I/O,
//! no state kept between calls, so the same inputs always give the same
//! sequence and the IR can be shared across threads.

use thiserror::Error;

use crate::bindings::{BindingError, ParameterBindings};
use crate::ir::{ArithmeticOp, JsonPath, PathMode, PathNode, PathNodeKind, Subscript, UnarySign};
use crate::item::{Item, Number};
use crate::methods::apply_method;
use crate::predicate::eval_predicate;
use crate::sequence::{Sequence, wrap};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Shape mismatch under strict mode, or a cardinality violation
    #[error("structural error: {0}")]
    Structural(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("parameter binding error: {0}")]
    ParameterBinding(#[from] BindingError),

    /// The input or a parameter already failed an upstream conversion
    #[error("{0}")]
    InputConversion(String),
}

impl EvalError {
    /// Errors caused by the data under evaluation. Predicates turn these into
    /// `unknown`; binding and input errors always propagate.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            EvalError::Structural(_) | EvalError::Type(_) | EvalError::Arithmetic(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

/// What a node is evaluated against
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub root: &'a Item,
    /// `@` inside a filter
    pub current: Option<&'a Item>,
    /// `last` inside a subscript
    pub last: Option<i64>,
    pub bindings: &'a ParameterBindings,
    pub mode: PathMode,
}

/// Evaluate `root` against `input`.
///
/// The input and every bound parameter are checked for the input-error
/// sentinel before any node is visited.
pub fn evaluate(
    root: &PathNode,
    input: &Item,
    bindings: &ParameterBindings,
    mode: PathMode,
) -> Result<Sequence> {
    if input.contains_input_error() {
        return Err(EvalError::InputConversion(
            "path input is the result of a failed conversion".to_string(),
        ));
    }
    if let Some(name) = bindings.first_input_error() {
        return Err(EvalError::InputConversion(format!(
            "path parameter {name} is the result of a failed conversion"
        )));
    }
    evaluate_prechecked(root, input, bindings, mode)
}

/// Evaluate without scanning for the sentinel; callers have already done so
pub(crate) fn evaluate_prechecked(
    root: &PathNode,
    input: &Item,
    bindings: &ParameterBindings,
    mode: PathMode,
) -> Result<Sequence> {
    log::trace!("evaluating path: {} {}", mode, root);
    let scope = Scope {
        root: input,
        current: None,
        last: None,
        bindings,
        mode,
    };
    eval(root, &scope)
}

impl JsonPath {
    pub fn evaluate(&self, input: &Item, bindings: &ParameterBindings) -> Result<Sequence> {
        evaluate(self.root(), input, bindings, self.mode())
    }
}

pub(crate) fn eval(node: &PathNode, scope: &Scope<'_>) -> Result<Sequence> {
    match &node.kind {
        PathNodeKind::Literal(lit) => Ok(Sequence::singleton(Item::from(lit))),
        PathNodeKind::ContextVariable => Ok(Sequence::singleton(scope.root.clone())),
        PathNodeKind::NamedValueVariable(name) => {
            Ok(Sequence::singleton(scope.bindings.get(name)?.clone()))
        }
        PathNodeKind::PositionalVariable(index) => {
            Ok(Sequence::singleton(scope.bindings.get_index(*index)?.clone()))
        }
        PathNodeKind::CurrentItem => scope
            .current
            .map(|item| Sequence::singleton(item.clone()))
            .ok_or_else(|| EvalError::Structural("@ used outside of a filter".to_string())),
        PathNodeKind::LastIndex => scope
            .last
            .map(|last| Sequence::singleton(Item::int(last)))
            .ok_or_else(|| {
                EvalError::Structural("last used outside of an array subscript".to_string())
            }),
        PathNodeKind::MemberAccessor { target, name } => {
            eval_member(eval(target, scope)?, name, scope.mode)
        }
        PathNodeKind::WildcardMemberAccessor { target } => {
            eval_wildcard_member(eval(target, scope)?, scope.mode)
        }
        PathNodeKind::DescendantMemberAccessor { target, name } => {
            let mut out = Sequence::empty();
            for item in eval(target, scope)? {
                collect_descendants(&item, name, &mut out);
            }
            Ok(out)
        }
        PathNodeKind::ArrayAccessor { target, subscripts } => {
            eval_array_accessor(eval(target, scope)?, subscripts, scope)
        }
        PathNodeKind::Filter { target, predicate } => {
            let candidates = eval(target, scope)?.unwrap_arrays(scope.mode);
            let mut out = Sequence::empty();
            for item in candidates {
                let inner = Scope {
                    current: Some(&item),
                    ..*scope
                };
                if eval_predicate(predicate, &inner)?.is_true() {
                    out.push(item);
                }
            }
            Ok(out)
        }
        PathNodeKind::UnaryArithmetic { sign, operand } => {
            let value = numeric_operand(eval(operand, scope)?, scope.mode, "unary operand")?;
            let result = match (sign, value) {
                (UnarySign::Plus, n) => n,
                (UnarySign::Minus, Number::Int(n)) => {
                    Number::Int(n.checked_neg().ok_or_else(|| {
                        EvalError::Arithmetic(format!("integer overflow negating {n}"))
                    })?)
                }
                (UnarySign::Minus, Number::Float(f)) => Number::Float(-f),
            };
            Ok(Sequence::singleton(Item::Number(result)))
        }
        PathNodeKind::BinaryArithmetic { op, left, right } => {
            let lhs = numeric_operand(eval(left, scope)?, scope.mode, "left operand")?;
            let rhs = numeric_operand(eval(right, scope)?, scope.mode, "right operand")?;
            Ok(Sequence::singleton(Item::Number(binary_arithmetic(
                *op, lhs, rhs,
            )?)))
        }
        PathNodeKind::MethodCall { target, method } => {
            apply_method(method, eval(target, scope)?, scope.mode)
        }
        PathNodeKind::Comparison { .. }
        | PathNodeKind::Conjunction { .. }
        | PathNodeKind::Disjunction { .. }
        | PathNodeKind::Negation(_)
        | PathNodeKind::Exists(_)
        | PathNodeKind::IsUnknown(_)
        | PathNodeKind::StartsWith { .. } => {
            Ok(Sequence::singleton(eval_predicate(node, scope)?.to_item()))
        }
    }
}

fn eval_member(input: Sequence, name: &str, mode: PathMode) -> Result<Sequence> {
    let mut out = Sequence::empty();
    for item in input.unwrap_arrays(mode) {
        match item {
            Item::Object(mut members) => match members.swap_remove(name) {
                Some(value) => out.push(value),
                None if mode.is_lax() => {}
                None => {
                    return Err(EvalError::Structural(format!(
                        "member '{name}' not found in object"
                    )));
                }
            },
            _ if mode.is_lax() => {}
            other => {
                return Err(EvalError::Structural(format!(
                    "member accessor '.{name}' applied to {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(out)
}

fn eval_wildcard_member(input: Sequence, mode: PathMode) -> Result<Sequence> {
    let mut out = Sequence::empty();
    for item in input.unwrap_arrays(mode) {
        match item {
            Item::Object(members) => {
                for value in members.into_values() {
                    out.push(value);
                }
            }
            _ if mode.is_lax() => {}
            other => {
                return Err(EvalError::Structural(format!(
                    "wildcard member accessor applied to {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(out)
}

/// Pre-order walk through objects and arrays
fn collect_descendants(item: &Item, name: &str, out: &mut Sequence) {
    match item {
        Item::Object(members) => {
            for (key, value) in members {
                if key == name {
                    out.push(value.clone());
                }
                collect_descendants(value, name, out);
            }
        }
        Item::Array(elements) => {
            for element in elements {
                collect_descendants(element, name, out);
            }
        }
        _ => {}
    }
}

fn eval_array_accessor(
    input: Sequence,
    subscripts: &[Subscript],
    scope: &Scope<'_>,
) -> Result<Sequence> {
    let mode = scope.mode;
    let mut out = Sequence::empty();

    for item in &input {
        let elements = wrap(item, mode).ok_or_else(|| {
            EvalError::Structural(format!(
                "array accessor applied to {}",
                item.type_name()
            ))
        })?;
        let len = elements.len() as i64;
        let inner = Scope {
            last: Some(len - 1),
            ..*scope
        };

        for subscript in subscripts {
            match subscript {
                Subscript::Wildcard => {
                    for element in elements {
                        out.push(element.clone());
                    }
                }
                Subscript::Last => match elements.last() {
                    Some(element) => out.push(element.clone()),
                    None => out_of_bounds(mode, "last", len)?,
                },
                Subscript::Index(expr) => {
                    let index = subscript_value(expr, &inner)?;
                    match usize::try_from(index).ok().and_then(|i| elements.get(i)) {
                        Some(element) => out.push(element.clone()),
                        None => out_of_bounds(mode, &index.to_string(), len)?,
                    }
                }
                Subscript::Range { from, to } => {
                    let from = subscript_value(from, &inner)?;
                    let to = subscript_value(to, &inner)?;
                    if !mode.is_lax() && (from > to || to >= len) {
                        return Err(EvalError::Structural(format!(
                            "array range [{from} to {to}] out of bounds for length {len}"
                        )));
                    }
                    let end = to.min(len - 1);
                    let mut index = from;
                    while index <= end {
                        out.push(elements[index as usize].clone());
                        index += 1;
                    }
                }
            }
        }
    }
    Ok(out)
}

fn out_of_bounds(mode: PathMode, index: &str, len: i64) -> Result<()> {
    if mode.is_lax() {
        Ok(())
    } else {
        Err(EvalError::Structural(format!(
            "array subscript {index} out of bounds for length {len}"
        )))
    }
}

/// A subscript must evaluate to one non-negative integral number
///
/// Whole numbers past `i64::MAX` saturate, which is out of bounds for any
/// array.
fn subscript_value(expr: &PathNode, scope: &Scope<'_>) -> Result<i64> {
    let value = numeric_operand(eval(expr, scope)?, scope.mode, "array subscript")?;
    match value {
        Number::Float(f) if f.fract() == 0.0 && f >= i64::MAX as f64 => return Ok(i64::MAX),
        _ => {}
    }
    match value.as_integral() {
        Some(index) if index >= 0 => Ok(index),
        _ => Err(EvalError::Type(format!(
            "array subscript must be a non-negative integer, found {value}"
        ))),
    }
}

/// Reduce an operand to a single number, unwrapping arrays in lax mode
pub(crate) fn numeric_operand(operand: Sequence, mode: PathMode, what: &str) -> Result<Number> {
    let item = operand.unwrap_arrays(mode).into_singleton().map_err(|seq| {
        EvalError::Structural(format!(
            "{what}: singleton item required, found {} items",
            seq.len()
        ))
    })?;
    match item {
        Item::Number(n) => Ok(n),
        other => Err(EvalError::Type(format!(
            "{what}: expected number, found {}",
            other.type_name()
        ))),
    }
}

fn binary_arithmetic(op: ArithmeticOp, lhs: Number, rhs: Number) -> Result<Number> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => {
            if b == 0 && matches!(op, ArithmeticOp::Divide | ArithmeticOp::Modulus) {
                return Err(EvalError::Arithmetic("division by zero".to_string()));
            }
            let result = match op {
                ArithmeticOp::Add => a.checked_add(b),
                ArithmeticOp::Subtract => a.checked_sub(b),
                ArithmeticOp::Multiply => a.checked_mul(b),
                ArithmeticOp::Divide => a.checked_div(b),
                ArithmeticOp::Modulus => a.checked_rem(b),
            };
            result
                .map(Number::Int)
                .ok_or_else(|| EvalError::Arithmetic(format!("integer overflow: {a} {op} {b}")))
        }
        (lhs, rhs) => {
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            if b == 0.0 && matches!(op, ArithmeticOp::Divide | ArithmeticOp::Modulus) {
                return Err(EvalError::Arithmetic("division by zero".to_string()));
            }
            let result = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                ArithmeticOp::Divide => a / b,
                ArithmeticOp::Modulus => a % b,
            };
            if result.is_finite() {
                Ok(Number::Float(result))
            } else {
                Err(EvalError::Arithmetic(format!(
                    "numeric overflow: {lhs} {op} {rhs}"
                )))
            }
        }
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
