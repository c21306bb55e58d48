use super::*;
use crate::stmt::Record;

#[derive(Debug)]
pub struct BatchGet {
    /// Primary key attributes of each item to read
    pub keys: Vec<Record>,

    /// Fields to return. Empty returns every field.
    pub attributes: Vec<String>,
}

impl From<BatchGet> for Operation {
    fn from(value: BatchGet) -> Self {
        Self::BatchGet(value)
    }
}
