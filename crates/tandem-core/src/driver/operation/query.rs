use super::*;
use crate::stmt::{Direction, Expr, Record, Value};

#[derive(Debug)]
pub struct Query {
    /// Index to query. `None` scans the entity's items.
    pub index: Option<String>,

    /// Equality on key fields. Fields not covered by the index are applied
    /// as filters.
    pub keys: Record,

    /// Inclusive range on one field
    pub between: Option<Between>,

    /// Additional filtering done on the result before returning it to the
    /// caller.
    pub filter: Option<Expr>,

    /// Order along the index sort key
    pub order: Direction,

    /// Page size
    pub limit: Option<usize>,

    /// Continuation token from a previous page. Tokens the store cannot
    /// decode start from the first page.
    pub cursor: Option<String>,

    /// Fields to return. Empty returns every field.
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub field: String,
    pub start: Value,
    pub end: Value,
}

impl Between {
    pub fn to_expr(&self) -> Expr {
        Expr::between(&self.field, self.start.clone(), self.end.clone())
    }
}

impl From<Query> for Operation {
    fn from(value: Query) -> Self {
        Self::Query(value)
    }
}
