use super::*;
use crate::stmt::Record;

#[derive(Debug)]
pub struct DeleteMany {
    /// Primary key attributes of each item to delete
    pub keys: Vec<Record>,
}

impl From<DeleteMany> for Operation {
    fn from(value: DeleteMany) -> Self {
        Self::DeleteMany(value)
    }
}
