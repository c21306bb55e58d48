use super::{Expr, Record};

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,

    /// Column assignments.
    pub assignments: Record,

    pub filter: Expr,

    pub returning: bool,
}

impl Update {
    pub fn new(table: impl Into<String>, assignments: Record, filter: Expr) -> Update {
        Update {
            table: table.into(),
            assignments,
            filter,
            returning: true,
        }
    }
}
