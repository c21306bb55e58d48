use super::{Record, Value};

use std::cmp::Ordering;

/// A backend-agnostic predicate over record fields.
///
/// Callers build predicates over model field names; collections rewrite
/// them to backend field names with [`Expr::map_fields`] before handing them
/// to a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every operand holds. An empty `And` is `true`.
    And(Vec<Expr>),

    /// At least one operand holds. An empty `Or` is `false`.
    Or(Vec<Expr>),

    Not(Box<Expr>),

    BinaryOp {
        field: String,
        op: BinaryOp,
        value: Value,
    },

    /// `start <= field <= end`
    Between {
        field: String,
        start: Value,
        end: Value,
    },

    InList {
        field: String,
        values: Vec<Value>,
    },

    BeginsWith {
        field: String,
        prefix: String,
    },

    /// String contains a substring, or list contains an element.
    Contains {
        field: String,
        value: Value,
    },

    IsNull(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

impl Expr {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::binary_op(field, BinaryOp::Ge, value)
    }

    pub fn binary_op(field: impl Into<String>, op: BinaryOp, value: impl Into<Value>) -> Expr {
        Expr::BinaryOp {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn between(
        field: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Expr {
        Expr::Between {
            field: field.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn in_list(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Expr {
        Expr::InList {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn begins_with(field: impl Into<String>, prefix: impl Into<String>) -> Expr {
        Expr::BeginsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Expr {
        Expr::IsNull(field.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Expr {
        Expr::Not(Box::new(expr))
    }

    /// Combines operands with `AND`, flattening nested `And`s and collapsing
    /// a single operand to itself.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(nested) => flat.extend(nested),
                operand => flat.push(operand),
            }
        }

        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::And(vec![]))
        } else {
            Expr::And(flat)
        }
    }

    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(operands.into_iter().collect())
    }

    /// An equality conjunction over every field of `keys`.
    pub fn from_keys(keys: &Record) -> Expr {
        Expr::and(keys.iter().map(|(field, value)| Expr::eq(field, value.clone())))
    }

    /// Returns `true` for the empty conjunction.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::And(operands) if operands.is_empty())
    }

    /// Returns a copy of the predicate with every field name rewritten by `f`.
    pub fn map_fields(&self, f: &impl Fn(&str) -> String) -> Expr {
        match self {
            Expr::And(operands) => Expr::And(operands.iter().map(|e| e.map_fields(f)).collect()),
            Expr::Or(operands) => Expr::Or(operands.iter().map(|e| e.map_fields(f)).collect()),
            Expr::Not(expr) => Expr::Not(Box::new(expr.map_fields(f))),
            Expr::BinaryOp { field, op, value } => Expr::BinaryOp {
                field: f(field),
                op: *op,
                value: value.clone(),
            },
            Expr::Between { field, start, end } => Expr::Between {
                field: f(field),
                start: start.clone(),
                end: end.clone(),
            },
            Expr::InList { field, values } => Expr::InList {
                field: f(field),
                values: values.clone(),
            },
            Expr::BeginsWith { field, prefix } => Expr::BeginsWith {
                field: f(field),
                prefix: prefix.clone(),
            },
            Expr::Contains { field, value } => Expr::Contains {
                field: f(field),
                value: value.clone(),
            },
            Expr::IsNull(field) => Expr::IsNull(f(field)),
        }
    }

    /// Evaluates the predicate against a record. Backends without a native
    /// predicate language (and tests) use this.
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Expr::And(operands) => operands.iter().all(|e| e.eval(record)),
            Expr::Or(operands) => operands.iter().any(|e| e.eval(record)),
            Expr::Not(expr) => !expr.eval(record),
            Expr::BinaryOp { field, op, value } => {
                let Some(lhs) = record.get_present(field) else {
                    return *op == BinaryOp::Ne && !value.is_null();
                };
                let ord = lhs.partial_cmp_value(value);
                match op {
                    BinaryOp::Eq => lhs == value || ord == Some(Ordering::Equal),
                    BinaryOp::Ne => lhs != value && ord != Some(Ordering::Equal),
                    BinaryOp::Lt => ord == Some(Ordering::Less),
                    BinaryOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                    BinaryOp::Gt => ord == Some(Ordering::Greater),
                    BinaryOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                }
            }
            Expr::Between { field, start, end } => record.get_present(field).is_some_and(|v| {
                matches!(
                    v.partial_cmp_value(start),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    v.partial_cmp_value(end),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }),
            Expr::InList { field, values } => record
                .get_present(field)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Expr::BeginsWith { field, prefix } => record
                .get_present(field)
                .and_then(Value::as_str)
                .is_some_and(|v| v.starts_with(prefix.as_str())),
            Expr::Contains { field, value } => match (record.get_present(field), value) {
                (Some(Value::String(haystack)), Value::String(needle)) => {
                    haystack.contains(needle.as_str())
                }
                (Some(Value::List(items)), value) => items.contains(value),
                _ => false,
            },
            Expr::IsNull(field) => record.get_present(field).is_none(),
        }
    }
}
