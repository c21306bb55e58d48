use super::{BatchRead, BatchWrite, Page, PageRequest, Strategy};
use crate::{async_trait, pipeline, QueryOptions, Result};

use tandem_core::{
    driver::{
        operation::{self, Between, PutMode},
        EntityBinding, IndexedStore, Operation,
    },
    mapping::FieldMapper,
    schema::Schema,
    stmt::Record,
};

use futures::future::join_all;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct IndexedStrategy {
    store: Arc<dyn IndexedStore>,
    schema: Arc<Schema>,
    mapper: FieldMapper,
    binding: EntityBinding,
    batch_get_chunk: usize,
}

impl IndexedStrategy {
    pub(crate) fn new(
        store: Arc<dyn IndexedStore>,
        schema: Arc<Schema>,
        mapper: FieldMapper,
        batch_get_chunk: usize,
    ) -> IndexedStrategy {
        let binding = EntityBinding::from_schema(&schema, &mapper);

        IndexedStrategy {
            store,
            schema,
            mapper,
            binding,
            batch_get_chunk: batch_get_chunk.max(1),
        }
    }

    async fn exec(&self, op: impl Into<Operation>) -> Result<tandem_core::driver::Response> {
        let op = op.into();

        tracing::debug!(
            entity = %self.binding.entity,
            operation = op.name(),
            "indexed store request"
        );

        self.store.exec(&self.binding, op).await
    }

    fn to_db_fields(&self, fields: &[String]) -> Vec<String> {
        fields.iter().map(|f| self.mapper.to_db_field(f)).collect()
    }

    fn from_db(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .iter()
            .map(|record| self.mapper.from_db_record(record))
            .collect()
    }

    /// Returns `true` if `key` names every primary key field.
    fn is_primary_key(&self, key: &Record) -> bool {
        self.schema
            .key_fields()
            .iter()
            .all(|field| key.get_present(field).is_some())
    }

    /// Every record matching `keys`, across all pages.
    async fn find_all(&self, keys: &Record, limit: Option<usize>) -> Result<Vec<Record>> {
        let fields: Vec<_> = keys.fields().collect();
        let index = self.schema.resolve_index(fields, None)?;
        let options = QueryOptions::default();
        let mut records = vec![];
        let mut cursor = None;

        loop {
            let page = self
                .query(PageRequest {
                    index,
                    keys,
                    options: &options,
                    sort_field: self.schema.sort_field(index),
                    page_size: limit.unwrap_or(100),
                    cursor,
                })
                .await?;

            records.extend(page.records);
            cursor = page.cursor;

            if cursor.is_none() || limit.is_some_and(|limit| records.len() >= limit) {
                break;
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl Strategy for IndexedStrategy {
    fn mode(&self) -> &'static str {
        "indexed"
    }

    async fn query(&self, req: PageRequest<'_>) -> Result<Page> {
        let to_db = |field: &str| self.mapper.to_db_field(field);

        let op = operation::Query {
            index: req.index.map(|index| index.name.clone()),
            keys: self.mapper.to_db_record(req.keys),
            between: req.options.between.as_ref().map(|between| Between {
                field: to_db(between.field.as_str()),
                start: between.start.clone(),
                end: between.end.clone(),
            }),
            filter: req.options.filter.as_ref().map(|expr| expr.map_fields(&to_db)),
            order: req.options.order,
            limit: Some(req.page_size),
            cursor: req.cursor,
            attributes: self.to_db_fields(&req.options.attributes),
        };

        let response = self.exec(op).await?;
        let cursor = response.cursor.clone();

        Ok(Page {
            records: self.from_db(response.into_records()),
            cursor,
        })
    }

    async fn create(&self, record: Record, upsert: bool) -> Result<Record> {
        let item = pipeline::map_to_backend(&self.schema, &self.mapper, &record, false);
        let mode = if upsert { PutMode::Upsert } else { PutMode::Create };

        let response = self.exec(operation::Put { item, mode }).await?;

        Ok(self
            .from_db(response.into_records())
            .into_iter()
            .next()
            .unwrap_or(record))
    }

    async fn create_many(&self, records: Vec<Record>) -> Result<BatchWrite> {
        let items = records
            .iter()
            .map(|record| pipeline::map_to_backend(&self.schema, &self.mapper, record, false))
            .collect();

        let mut response = self.exec(operation::PutMany { items }).await?;
        let unprocessed = self.from_db(std::mem::take(&mut response.unprocessed));

        Ok(BatchWrite {
            created: self.from_db(response.into_records()),
            unprocessed,
        })
    }

    async fn patch(&self, key: Record, set: Record, merged: &Record) -> Result<Option<Record>> {
        let mut set = set;

        // Composite index attributes are recomputed from the segments sent
        // along with the assignment.
        for index in self.schema.indexes.values() {
            if index.key_fields().any(|field| set.contains(field)) {
                for field in index.key_fields() {
                    if let Some(value) = merged.get_present(field) {
                        if !set.contains(field) {
                            set.insert(field, value.clone());
                        }
                    }
                }
            }
        }

        for field in key.fields() {
            set.remove(field);
        }

        let op = operation::Patch {
            key: self.mapper.to_db_record(&key),
            set: pipeline::map_to_backend(&self.schema, &self.mapper, &set, false),
        };

        let response = self.exec(op).await?;
        Ok(self.from_db(response.into_records()).into_iter().next())
    }

    async fn delete_many(&self, keys: Vec<Record>) -> Result<u64> {
        let key_fields = self.schema.key_fields();
        let mut primary = vec![];

        for key in keys {
            if self.is_primary_key(&key) {
                primary.push(key.project(key_fields.iter().copied()));
            } else {
                // Deletes address items by primary key; resolve other keys
                // through an index first.
                for record in self.find_all(&key, None).await? {
                    primary.push(record.project(key_fields.iter().copied()));
                }
            }
        }

        if primary.is_empty() {
            return Ok(0);
        }

        let keys = primary
            .iter()
            .map(|key| self.mapper.to_db_record(key))
            .collect();

        let response = self.exec(operation::DeleteMany { keys }).await?;
        Ok(response.rows.len())
    }

    async fn batch_get(&self, keys: Vec<Record>, attributes: &[String]) -> Result<BatchRead> {
        let (primary, other): (Vec<_>, Vec<_>) =
            keys.into_iter().partition(|key| self.is_primary_key(key));

        let mut read = BatchRead::default();
        let db_attributes = self.to_db_fields(attributes);

        for chunk in primary.chunks(self.batch_get_chunk) {
            let keys = chunk.iter().map(|key| self.mapper.to_db_record(key)).collect();

            let mut response = self
                .exec(operation::BatchGet {
                    keys,
                    attributes: db_attributes.clone(),
                })
                .await?;

            read.unprocessed
                .extend(self.from_db(std::mem::take(&mut response.unprocessed)));
            read.records.extend(self.from_db(response.into_records()));
        }

        // Keys that do not address an item directly are looked up one by one
        let lookups = join_all(other.iter().map(|key| self.find_all(key, Some(1)))).await;

        for (key, result) in other.iter().zip(lookups) {
            match result {
                Ok(records) => read.records.extend(records.into_iter().take(1).map(|record| {
                    if attributes.is_empty() {
                        record
                    } else {
                        record.project(attributes.iter().map(String::as_str))
                    }
                })),
                Err(err) if err.is_invalid_input() => {
                    tracing::warn!(
                        entity = %self.binding.entity,
                        key = %key.to_key_string(),
                        %err,
                        "dropping invalid batch key"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(read)
    }
}
