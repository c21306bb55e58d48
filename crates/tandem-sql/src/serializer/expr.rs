use super::{Delimited, Formatter, Ident, Params, ToSql};

use tandem_core::stmt::{BinaryOp, Expr, Value};

/// An operand of `AND`/`OR`/`NOT`, parenthesized when it is itself a
/// compound predicate.
struct Operand<'a>(&'a Expr);

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::And(operands) if operands.is_empty() => fmt!(f, "TRUE"),
            Expr::And(operands) => fmt!(f, Delimited(operands.iter().map(Operand), " AND ")),
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "FALSE"),
            Expr::Or(operands) => fmt!(f, Delimited(operands.iter().map(Operand), " OR ")),
            Expr::Not(expr) => {
                let expr: &Expr = expr;
                fmt!(f, "NOT (" expr ")")
            }
            Expr::BinaryOp { field, op, value } if value.is_null() => match op {
                BinaryOp::Eq => fmt!(f, Ident(field) " IS NULL"),
                BinaryOp::Ne => fmt!(f, Ident(field) " IS NOT NULL"),
                // Ordering against NULL never holds
                _ => fmt!(f, "FALSE"),
            },
            Expr::BinaryOp { field, op, value } => {
                fmt!(f, Ident(field) " " op.as_str() " " value)
            }
            Expr::Between { field, start, end } => {
                fmt!(f, Ident(field) " BETWEEN " start " AND " end)
            }
            Expr::InList { values, .. } if values.is_empty() => fmt!(f, "FALSE"),
            Expr::InList { field, values } => {
                fmt!(f, Ident(field) " IN (" super::Comma(values) ")")
            }
            Expr::BeginsWith { field, prefix } => {
                let pattern = Value::String(format!("{}%", escape_like(prefix)));
                let pattern = &pattern;
                fmt!(f, Ident(field) " LIKE " pattern)
            }
            Expr::Contains {
                field,
                value: Value::String(needle),
            } => {
                let pattern = Value::String(format!("%{}%", escape_like(needle)));
                let pattern = &pattern;
                fmt!(f, Ident(field) " LIKE " pattern)
            }
            Expr::Contains { field, value } => {
                // List columns are stored as JSON arrays
                let element = Value::List(vec![value.clone()]);
                let element = &element;
                fmt!(f, Ident(field) " @> " element)
            }
            Expr::IsNull(field) => fmt!(f, Ident(field) " IS NULL"),
        }
    }
}

impl ToSql for Operand<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.0 {
            Expr::And(operands) | Expr::Or(operands) if operands.len() > 1 => {
                fmt!(f, "(" self.0 ")")
            }
            expr => fmt!(f, expr),
        }
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
