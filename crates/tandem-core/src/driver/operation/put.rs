use super::*;
use crate::stmt::Record;

#[derive(Debug)]
pub struct Put {
    pub item: Record,

    pub mode: PutMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fail with a condition-failed error if the item already exists
    Create,

    /// Replace any existing item
    Upsert,
}

impl From<Put> for Operation {
    fn from(value: Put) -> Self {
        Self::Put(value)
    }
}
