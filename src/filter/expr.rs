use super::error::EvalError;
use super::extract::{AtomicComparison, Operator};
use crate::options::Options;
use crate::record::Record;
use std::fmt;

/// Ordering comparison between two decimal operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl NumericOp {
    fn from_operator(operator: Operator) -> Option<Self> {
        match operator {
            Operator::Less => Some(NumericOp::Less),
            Operator::LessOrEqual => Some(NumericOp::LessOrEqual),
            Operator::Greater => Some(NumericOp::Greater),
            Operator::GreaterOrEqual => Some(NumericOp::GreaterOrEqual),
            Operator::Equal | Operator::Approximate => None,
        }
    }

    /// Strict complement: `<=` becomes `>`, `<` becomes `>=`
    pub fn invert(self) -> Self {
        match self {
            NumericOp::Less => NumericOp::GreaterOrEqual,
            NumericOp::LessOrEqual => NumericOp::Greater,
            NumericOp::Greater => NumericOp::LessOrEqual,
            NumericOp::GreaterOrEqual => NumericOp::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            NumericOp::Less => "<",
            NumericOp::LessOrEqual => "<=",
            NumericOp::Greater => ">",
            NumericOp::GreaterOrEqual => ">=",
        }
    }

    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            NumericOp::Less => lhs < rhs,
            NumericOp::LessOrEqual => lhs <= rhs,
            NumericOp::Greater => lhs > rhs,
            NumericOp::GreaterOrEqual => lhs >= rhs,
        }
    }
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Provider-agnostic predicate tree over one record.
///
/// Negation is always folded into the leaves, so the tree has no `Not` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Field is not null
    Present { field: String },
    /// Field is null
    Absent { field: String },
    Equals {
        field: String,
        value: String,
        /// Lower-case the field before comparing
        fold_case: bool,
        negated: bool,
    },
    /// Like strategy call with a store-wildcard pattern
    Like {
        field: String,
        pattern: String,
        negated: bool,
    },
    /// Approximate strategy codes of field and literal compared for equality
    Approximate {
        field: String,
        value: String,
        negated: bool,
    },
    Compare {
        field: String,
        op: NumericOp,
        value: String,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// Build the leaf fragment for one atomic comparison
pub fn compile_comparison(comparison: &AtomicComparison, options: &Options) -> Expr {
    let field = comparison.property.clone();
    let negated = comparison.negated;

    if comparison.is_presence() {
        return if negated {
            Expr::Absent { field }
        } else {
            Expr::Present { field }
        };
    }

    if let Some(op) = NumericOp::from_operator(comparison.operator) {
        return Expr::Compare {
            field,
            op: if negated { op.invert() } else { op },
            value: comparison.value.clone(),
        };
    }

    match comparison.operator {
        Operator::Approximate => Expr::Approximate {
            field,
            value: comparison.value.clone(),
            negated,
        },
        _ if comparison.has_wildcard() => Expr::Like {
            field,
            pattern: comparison.value.replace('*', "%"),
            negated,
        },
        _ => Expr::Equals {
            field,
            value: comparison.value.clone(),
            fold_case: !options.is_case_insensitive_store(),
            negated,
        },
    }
}

impl Expr {
    pub fn evaluate<R: Record + ?Sized>(
        &self,
        record: &R,
        options: &Options,
    ) -> Result<bool, EvalError> {
        match self {
            Expr::Present { field } => Ok(record.field(field).is_some()),
            Expr::Absent { field } => Ok(record.field(field).is_none()),
            Expr::Equals {
                field,
                value,
                fold_case,
                negated,
            } => {
                let equal = record.field(field).is_some_and(|actual| {
                    if *fold_case {
                        actual.to_lowercase() == *value
                    } else {
                        actual == value.as_str()
                    }
                });
                Ok(equal != *negated)
            }
            Expr::Like {
                field,
                pattern,
                negated,
            } => {
                let like = match record.field(field) {
                    Some(actual) => options.like().is_like(&actual, pattern)?,
                    None => false,
                };
                Ok(like != *negated)
            }
            Expr::Approximate {
                field,
                value,
                negated,
            } => {
                let approximate = options.approximate();
                let actual = record.field(field);
                let same = approximate.encode(actual.as_deref().unwrap_or_default())
                    == approximate.encode(value);
                Ok(same != *negated)
            }
            Expr::Compare { field, op, value } => {
                let lhs = to_decimal(field, record.field(field).as_deref())?;
                let rhs = to_decimal(field, Some(value))?;
                Ok(op.holds(lhs, rhs))
            }
            Expr::And(children) => {
                for child in children {
                    if !child.evaluate(record, options)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(children) => {
                for child in children {
                    if child.evaluate(record, options)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Textual lowering of the tree, with strategy calls spelled out through
    /// their descriptors. The record is named `m`.
    pub fn render(&self, options: &Options) -> String {
        match self {
            Expr::Present { field } => format!("m.{field} != null"),
            Expr::Absent { field } => format!("m.{field} == null"),
            Expr::Equals {
                field,
                value,
                fold_case,
                negated,
            } => format!(
                "m.{field}{} {} \"{value}\"",
                if *fold_case { ".to_lowercase()" } else { "" },
                if *negated { "!=" } else { "==" }
            ),
            Expr::Like {
                field,
                pattern,
                negated,
            } => format!(
                "{}{}",
                if *negated { "!" } else { "" },
                options.like_descriptor().render(&[
                    format!("m.{field}").as_str(),
                    format!("\"{pattern}\"").as_str()
                ])
            ),
            Expr::Approximate {
                field,
                value,
                negated,
            } => {
                let descriptor = options.approximate_descriptor();
                format!(
                    "{} {} {}",
                    descriptor.render(&[format!("m.{field}").as_str()]),
                    if *negated { "!=" } else { "==" },
                    descriptor.render(&[format!("\"{value}\"").as_str()])
                )
            }
            Expr::Compare { field, op, value } => {
                format!("decimal(m.{field}) {op} decimal(\"{value}\")")
            }
            Expr::And(children) => join(children, " && ", options),
            Expr::Or(children) => join(children, " || ", options),
        }
    }
}

fn join(children: &[Expr], combinator: &str, options: &Options) -> String {
    let parts: Vec<String> = children.iter().map(|c| c.render(options)).collect();
    format!("({})", parts.join(combinator))
}

/// Decimal conversion of an operand; a null field converts to zero
fn to_decimal(field: &str, raw: Option<&str>) -> Result<f64, EvalError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| EvalError::Conversion {
            field: field.to_string(),
            value: raw.to_string(),
        })
}
