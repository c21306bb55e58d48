use super::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filter: Expr,
}

impl Delete {
    pub fn new(table: impl Into<String>, filter: Expr) -> Delete {
        Delete {
            table: table.into(),
            filter,
        }
    }
}
