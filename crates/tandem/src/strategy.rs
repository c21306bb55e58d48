mod indexed;
use indexed::IndexedStrategy;

mod relational;
use relational::RelationalStrategy;

use crate::{async_trait, collection::QueryOptions, Config, Result};

use tandem_core::{
    driver::{IndexedStore, Relational},
    mapping::FieldMapper,
    schema::{Index, Schema},
    stmt::Record,
};

use std::{fmt::Debug, sync::Arc};

/// The backend an entity is mapped to. Chosen once per collection.
#[derive(Debug, Clone)]
pub enum Backend {
    /// A key-value store addressed through composite indexes.
    Indexed(Arc<dyn IndexedStore>),

    /// A relational store reached through statements.
    Relational(Arc<dyn Relational>),
}

impl Backend {
    pub fn indexed(store: impl IndexedStore) -> Backend {
        Backend::Indexed(Arc::new(store))
    }

    pub fn relational(client: impl Relational) -> Backend {
        Backend::Relational(Arc::new(client))
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Backend::Indexed(_))
    }

    pub(crate) fn strategy(
        &self,
        schema: &Arc<Schema>,
        mapper: &FieldMapper,
        config: &Config,
    ) -> Box<dyn Strategy> {
        match self {
            Backend::Indexed(store) => Box::new(IndexedStrategy::new(
                store.clone(),
                schema.clone(),
                mapper.clone(),
                config.batch_get_chunk,
            )),
            Backend::Relational(client) => Box::new(RelationalStrategy::new(
                client.clone(),
                schema.clone(),
                mapper.clone(),
            )),
        }
    }
}

/// One page of a read.
pub(crate) struct PageRequest<'a> {
    /// Resolved index, if any
    pub index: Option<&'a Index>,

    /// Equality keys, model fields
    pub keys: &'a Record,

    pub options: &'a QueryOptions,

    /// Model field the results are ordered by
    pub sort_field: &'a str,

    pub page_size: usize,

    pub cursor: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Page {
    pub records: Vec<Record>,

    /// Where the next page starts. `None` once exhausted.
    pub cursor: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct BatchRead {
    pub records: Vec<Record>,

    /// Keys the backend did not process
    pub unprocessed: Vec<Record>,
}

#[derive(Debug, Default)]
pub(crate) struct BatchWrite {
    pub created: Vec<Record>,

    /// Items the backend did not process
    pub unprocessed: Vec<Record>,
}

/// Backend-specific execution of collection operations.
///
/// Records going in and coming out are keyed by model field names; each
/// strategy maps to and from backend names itself. Reads come back without
/// the read pipeline applied.
#[async_trait]
pub(crate) trait Strategy: Debug + Send + Sync {
    /// `indexed` or `relational`, for diagnostics.
    fn mode(&self) -> &'static str;

    async fn query(&self, req: PageRequest<'_>) -> Result<Page>;

    async fn create(&self, record: Record, upsert: bool) -> Result<Record>;

    async fn create_many(&self, records: Vec<Record>) -> Result<BatchWrite>;

    /// Assigns `set` on the record addressed by `key`. `merged` is the full
    /// record after the update.
    async fn patch(&self, key: Record, set: Record, merged: &Record) -> Result<Option<Record>>;

    async fn delete_many(&self, keys: Vec<Record>) -> Result<u64>;

    async fn batch_get(&self, keys: Vec<Record>, attributes: &[String]) -> Result<BatchRead>;
}

/// The field every key names, when every key names exactly one and the same
/// field.
pub(crate) fn single_common_field(keys: &[Record]) -> Option<&str> {
    let field = keys.first()?.single_field()?;
    keys.iter()
        .all(|key| key.single_field() == Some(field))
        .then_some(field)
}
