use crate::{Error, Model};

use tandem_core::stmt::Record;

/// The result of a read. Its shape follows the options the read was given.
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// Every matching model (no fixed limit).
    Items(Vec<Model>),

    /// A `limit` of one: the first match, if any.
    Single(Option<Model>),

    /// A fixed-size page and where the next one starts.
    Page {
        data: Vec<Model>,
        cursor: Option<String>,
    },

    /// Models wrapped with pagination metadata (`returnMetadata`).
    WithMetadata { data: Vec<Model>, metadata: Metadata },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub total_fetched: usize,

    /// A fixed limit stopped the read while more records remained.
    pub was_truncated: bool,

    pub has_more: bool,

    pub cursor: Option<String>,

    pub pages_retrieved: usize,
}

impl QueryResult {
    /// The models, whatever the shape.
    pub fn into_models(self) -> Vec<Model> {
        match self {
            QueryResult::Items(data)
            | QueryResult::Page { data, .. }
            | QueryResult::WithMetadata { data, .. } => data,
            QueryResult::Single(model) => model.into_iter().collect(),
        }
    }

    pub fn models(&self) -> &[Model] {
        match self {
            QueryResult::Items(data)
            | QueryResult::Page { data, .. }
            | QueryResult::WithMetadata { data, .. } => data,
            QueryResult::Single(model) => model.as_slice(),
        }
    }

    /// The first model, whatever the shape.
    pub fn into_first(self) -> Option<Model> {
        self.into_models().into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.models().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models().is_empty()
    }

    /// The continuation cursor, when the shape carries one.
    pub fn cursor(&self) -> Option<&str> {
        match self {
            QueryResult::Page { cursor, .. } => cursor.as_deref(),
            QueryResult::WithMetadata { metadata, .. } => metadata.cursor.as_deref(),
            _ => None,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            QueryResult::WithMetadata { metadata, .. } => Some(metadata),
            _ => None,
        }
    }
}

/// An input rejected by a batch write, with the reason.
#[derive(Debug, Clone)]
pub struct ErrorItem {
    pub item: Record,
    pub error: Error,
}

/// Outcome of `create_many`: partial success is a normal result.
#[derive(Debug, Clone, Default)]
pub struct CreateManyResult {
    pub created_items: Vec<Model>,
    pub error_items: Vec<ErrorItem>,
}

/// Outcome of `batch_get_by_keys`.
#[derive(Debug, Clone, Default)]
pub struct BatchGetResult {
    pub data: Vec<Model>,

    /// Keys the backend did not process; retry them later.
    pub unprocessed: Vec<Record>,
}

/// Outcome of a junction reconciliation.
#[derive(Debug, Clone, Default)]
pub struct ReconcileResult {
    pub created_items: Vec<Model>,
    pub error_items: Vec<ErrorItem>,
    pub removed_count: u64,
}
