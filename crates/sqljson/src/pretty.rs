//! Rendering of path IR back to SQL/JSON path text
//!
//! Used for log lines and error messages. Positional parameters have no
//! textual syntax and render as `$<n>`.

use std::fmt::{self, Display, Write};

use crate::ir::{
    ArithmeticOp, ComparisonOp, JsonPath, Literal, Method, PathMode, PathNode, PathNodeKind,
    Subscript, UnarySign,
};

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulus => "%",
        };
        write!(f, "{}", s)
    }
}

impl Display for UnarySign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnarySign::Plus => "+",
            UnarySign::Minus => "-",
        };
        write!(f, "{}", s)
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

impl Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMode::Lax => write!(f, "lax"),
            PathMode::Strict => write!(f, "strict"),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Datetime(Some(template)) => {
                write!(f, "datetime(\"{}\")", escape_string(template))
            }
            other => write!(f, "{}()", other.name()),
        }
    }
}

impl Display for Subscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscript::Index(expr) => write!(f, "{}", expr),
            Subscript::Range { from, to } => write!(f, "{} to {}", from, to),
            Subscript::Last => write!(f, "last"),
            Subscript::Wildcard => write!(f, "*"),
        }
    }
}

impl Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PathNodeKind::Literal(lit) => write!(f, "{}", lit),
            PathNodeKind::ContextVariable => write!(f, "$"),
            PathNodeKind::NamedValueVariable(name) => write!(f, "${}", name),
            PathNodeKind::PositionalVariable(index) => write!(f, "$<{}>", index),
            PathNodeKind::CurrentItem => write!(f, "@"),
            PathNodeKind::LastIndex => write!(f, "last"),
            PathNodeKind::MemberAccessor { target, name } => {
                write_target(f, target)?;
                write!(f, ".")?;
                write_key(f, name)
            }
            PathNodeKind::WildcardMemberAccessor { target } => {
                write_target(f, target)?;
                write!(f, ".*")
            }
            PathNodeKind::DescendantMemberAccessor { target, name } => {
                write_target(f, target)?;
                write!(f, "..")?;
                write_key(f, name)
            }
            PathNodeKind::ArrayAccessor { target, subscripts } => {
                write_target(f, target)?;
                write!(f, "[")?;
                for (i, subscript) in subscripts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", subscript)?;
                }
                write!(f, "]")
            }
            PathNodeKind::Filter { target, predicate } => {
                write_target(f, target)?;
                write!(f, " ? ({})", predicate)
            }
            PathNodeKind::MethodCall { target, method } => {
                write_target(f, target)?;
                write!(f, ".{}", method)
            }
            PathNodeKind::UnaryArithmetic { sign, operand } => {
                write!(f, "{}", sign)?;
                write_operand(f, operand)
            }
            PathNodeKind::BinaryArithmetic { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op)?;
                write_operand(f, right)
            }
            PathNodeKind::Comparison { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op)?;
                write_operand(f, right)
            }
            PathNodeKind::Conjunction { left, right } => {
                write_operand(f, left)?;
                write!(f, " && ")?;
                write_operand(f, right)
            }
            PathNodeKind::Disjunction { left, right } => {
                write_operand(f, left)?;
                write!(f, " || ")?;
                write_operand(f, right)
            }
            PathNodeKind::Negation(inner) => write!(f, "!({})", inner),
            PathNodeKind::Exists(inner) => write!(f, "exists ({})", inner),
            PathNodeKind::IsUnknown(inner) => write!(f, "({}) is unknown", inner),
            PathNodeKind::StartsWith { whole, initial } => {
                write_operand(f, whole)?;
                write!(f, " starts with ")?;
                write_operand(f, initial)
            }
        }
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mode(), self.root())
    }
}

/// Operators bind looser than accessors, so an operator target needs parens
fn write_target(f: &mut fmt::Formatter<'_>, target: &PathNode) -> fmt::Result {
    if is_operator(target) {
        write!(f, "({})", target)
    } else {
        write!(f, "{}", target)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &PathNode) -> fmt::Result {
    let needs_parens = matches!(
        operand.kind,
        PathNodeKind::BinaryArithmetic { .. }
            | PathNodeKind::Comparison { .. }
            | PathNodeKind::Conjunction { .. }
            | PathNodeKind::Disjunction { .. }
            | PathNodeKind::StartsWith { .. }
    );
    if needs_parens {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

fn is_operator(node: &PathNode) -> bool {
    node.is_predicate()
        || matches!(
            node.kind,
            PathNodeKind::BinaryArithmetic { .. } | PathNodeKind::UnaryArithmetic { .. }
        )
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if is_identifier {
        f.write_str(key)
    } else {
        write!(f, "\"{}\"", escape_string(key))
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
