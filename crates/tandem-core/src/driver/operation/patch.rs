use super::*;
use crate::stmt::Record;

#[derive(Debug)]
pub struct Patch {
    /// Primary key attributes of the item to update
    pub key: Record,

    /// Fields to assign. Composite index attributes are recomputed for every
    /// index whose segments are all present in `key` and `set`.
    pub set: Record,
}

impl From<Patch> for Operation {
    fn from(value: Patch) -> Self {
        Self::Patch(value)
    }
}
