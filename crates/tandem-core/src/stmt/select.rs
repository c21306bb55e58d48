use super::{Expr, OrderBy};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,

    /// Columns to return. Empty means every column.
    pub columns: Vec<String>,

    pub filter: Option<Expr>,

    pub order_by: Vec<OrderBy>,

    pub range: Option<Range>,
}

/// An offset/limit window over the ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: usize,
    pub limit: usize,
}

impl Select {
    pub fn new(table: impl Into<String>) -> Select {
        Select {
            table: table.into(),
            columns: vec![],
            filter: None,
            order_by: vec![],
            range: None,
        }
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = String>) -> Select {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Adds a predicate, `AND`ed with any existing filter.
    pub fn filter(mut self, expr: Expr) -> Select {
        if expr.is_true() {
            return self;
        }

        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Select {
        self.order_by.push(order_by);
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Select {
        self.range = Some(Range { offset, limit });
        self
    }
}
