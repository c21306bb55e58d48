mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{BinaryOp, Expr};

mod insert;
pub use insert::{Insert, OnConflict};

mod order;
pub use order::{Direction, OrderBy};

mod record;
pub use record::Record;

mod select;
pub use select::{Range, Select};

mod update;
pub use update::Update;

mod value;
pub use value::{FromValue, Value};

/// A relational statement, assembled by a collection and executed by a
/// [`Relational`](crate::driver::Relational) client.
///
/// Table and column names are always backend names: the field mapper has
/// already been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    /// The table the statement targets.
    pub fn table(&self) -> &str {
        match self {
            Statement::Select(stmt) => &stmt.table,
            Statement::Insert(stmt) => &stmt.table,
            Statement::Update(stmt) => &stmt.table,
            Statement::Delete(stmt) => &stmt.table,
        }
    }

    /// Returns `true` if executing the statement yields records rather than
    /// a row count.
    pub fn returns_records(&self) -> bool {
        match self {
            Statement::Select(_) => true,
            Statement::Insert(stmt) => stmt.returning,
            Statement::Update(stmt) => stmt.returning,
            Statement::Delete(_) => false,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Statement::Insert(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Statement::Delete(_))
    }
}

macro_rules! impl_from_stmt {
    ( $( $variant:ident ),* ) => {
        $(
            impl From<$variant> for Statement {
                fn from(stmt: $variant) -> Statement {
                    Statement::$variant(stmt)
                }
            }
        )*
    };
}

impl_from_stmt!(Select, Insert, Update, Delete);
