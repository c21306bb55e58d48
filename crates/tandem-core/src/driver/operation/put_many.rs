use super::*;
use crate::stmt::Record;

#[derive(Debug)]
pub struct PutMany {
    pub items: Vec<Record>,
}

impl From<PutMany> for Operation {
    fn from(value: PutMany) -> Self {
        Self::PutMany(value)
    }
}
