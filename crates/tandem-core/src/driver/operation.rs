mod batch_get;
pub use batch_get::BatchGet;

mod delete_many;
pub use delete_many::DeleteMany;

mod patch;
pub use patch::Patch;

mod put;
pub use put::{Put, PutMode};

mod put_many;
pub use put_many::PutMany;

mod query;
pub use query::{Between, Query};

use super::*;

#[derive(Debug)]
pub enum Operation {
    /// Read many items by primary key
    BatchGet(BatchGet),

    /// Delete items identified by the given keys
    DeleteMany(DeleteMany),

    /// Partially update one item by primary key
    Patch(Patch),

    /// Write one item
    Put(Put),

    /// Write many items in batched calls
    PutMany(PutMany),

    /// Query an index, or scan the table
    Query(Query),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::BatchGet(_) => "batch_get",
            Operation::DeleteMany(_) => "delete_many",
            Operation::Patch(_) => "patch",
            Operation::Put(_) => "put",
            Operation::PutMany(_) => "put_many",
            Operation::Query(_) => "query",
        }
    }
}
