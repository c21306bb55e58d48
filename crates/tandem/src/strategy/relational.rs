use super::{single_common_field, BatchRead, BatchWrite, Page, PageRequest, Strategy};
use crate::{async_trait, pipeline, Result};

use tandem_core::{
    cursor,
    driver::{Relational, Response},
    mapping::FieldMapper,
    schema::Schema,
    stmt::{Delete, Expr, Insert, OrderBy, Record, Select, Statement, Update},
};

use futures::future::join_all;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct RelationalStrategy {
    client: Arc<dyn Relational>,
    schema: Arc<Schema>,
    mapper: FieldMapper,
}

impl RelationalStrategy {
    pub(crate) fn new(
        client: Arc<dyn Relational>,
        schema: Arc<Schema>,
        mapper: FieldMapper,
    ) -> RelationalStrategy {
        RelationalStrategy {
            client,
            schema,
            mapper,
        }
    }

    fn table(&self) -> &str {
        &self.schema.table_name
    }

    async fn exec(&self, stmt: impl Into<Statement>) -> Result<Response> {
        let stmt = stmt.into();

        tracing::debug!(
            entity = %self.schema.entity_name,
            table = %stmt.table(),
            ?stmt,
            "relational request"
        );

        self.client.exec(stmt).await
    }

    fn to_db(&self, record: &Record) -> Record {
        pipeline::map_to_backend(&self.schema, &self.mapper, record, true)
    }

    fn from_db(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .iter()
            .map(|record| self.mapper.from_db_record(record))
            .collect()
    }

    fn columns(&self, attributes: &[String]) -> Vec<String> {
        attributes
            .iter()
            .map(|field| self.mapper.to_db_field(field))
            .collect()
    }

    /// Columns of the primary key, in order.
    fn key_columns(&self) -> Vec<String> {
        self.schema
            .key_fields()
            .into_iter()
            .map(|field| self.mapper.to_db_field(field))
            .collect()
    }

    /// First record matching `key`.
    async fn find_one(&self, key: &Record, attributes: &[String]) -> Result<Option<Record>> {
        let select = Select::new(self.table())
            .columns(self.columns(attributes))
            .filter(Expr::from_keys(&self.mapper.to_db_record(key)))
            .range(0, 1);

        let response = self.exec(select).await?;
        Ok(self.from_db(response.into_records()).into_iter().next())
    }
}

#[async_trait]
impl Strategy for RelationalStrategy {
    fn mode(&self) -> &'static str {
        "relational"
    }

    async fn query(&self, req: PageRequest<'_>) -> Result<Page> {
        let to_db = |field: &str| self.mapper.to_db_field(field);
        let offset = req.cursor.as_deref().map(cursor::decode).unwrap_or(0);
        let direction = req.options.order;

        let mut select = Select::new(self.table())
            .columns(self.columns(&req.options.attributes))
            .filter(Expr::from_keys(&self.mapper.to_db_record(req.keys)));

        if let Some(between) = &req.options.between {
            select = select.filter(between.to_expr().map_fields(&to_db));
        }

        if let Some(filter) = &req.options.filter {
            select = select.filter(filter.map_fields(&to_db));
        }

        // The primary key breaks ties so offsets stay stable across pages.
        let sort_column = to_db(req.sort_field);
        select = select.order_by(OrderBy::new(&sort_column, direction));

        for column in self.key_columns() {
            if column != sort_column {
                select = select.order_by(OrderBy::new(column, direction));
            }
        }

        let select = select.range(offset, req.page_size);
        let records = self.exec(select).await?.into_records();

        let cursor = (records.len() == req.page_size && req.page_size > 0)
            .then(|| cursor::encode(offset + records.len()));

        Ok(Page {
            records: self.from_db(records),
            cursor,
        })
    }

    async fn create(&self, record: Record, upsert: bool) -> Result<Record> {
        let mut insert = Insert::new(self.table(), vec![self.to_db(&record)]);

        if upsert {
            insert = insert.on_conflict(self.key_columns());
        }

        let response = self.exec(insert).await?;

        Ok(self
            .from_db(response.into_records())
            .into_iter()
            .next()
            .unwrap_or(record))
    }

    async fn create_many(&self, records: Vec<Record>) -> Result<BatchWrite> {
        let rows = records.iter().map(|record| self.to_db(record)).collect();
        let response = self.exec(Insert::new(self.table(), rows)).await?;

        Ok(BatchWrite {
            created: self.from_db(response.into_records()),
            unprocessed: vec![],
        })
    }

    async fn patch(&self, key: Record, set: Record, merged: &Record) -> Result<Option<Record>> {
        let mut assignments = self.to_db(&set);

        for column in self.key_columns() {
            assignments.remove(&column);
        }

        if assignments.is_empty() {
            // Nothing stored relationally changed
            return Ok(Some(merged.clone()));
        }

        let update = Update::new(
            self.table(),
            assignments,
            Expr::from_keys(&self.mapper.to_db_record(&key)),
        );

        let response = self.exec(update).await?;
        Ok(self.from_db(response.into_records()).into_iter().next())
    }

    async fn delete_many(&self, keys: Vec<Record>) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        if let Some(field) = single_common_field(&keys) {
            let column = self.mapper.to_db_field(field);
            let values = keys.iter().filter_map(|key| key.get(field).cloned());
            let delete = Delete::new(self.table(), Expr::in_list(column, values));

            return Ok(self.exec(delete).await?.rows.len());
        }

        // Heterogeneous keys: one statement per key, issued concurrently
        let results = join_all(keys.iter().map(|key| {
            let filter = Expr::from_keys(&self.mapper.to_db_record(key));
            self.exec(Delete::new(self.table(), filter))
        }))
        .await;

        let mut count = 0;
        let mut failures = vec![];

        for result in results {
            match result {
                Ok(response) => count += response.rows.len(),
                Err(err) => failures.push(err),
            }
        }

        let failed = failures.len();
        let Some(err) = failures.into_iter().next() else {
            return Ok(count);
        };

        tracing::warn!(
            entity = %self.schema.entity_name,
            deleted = count,
            failed,
            total = keys.len(),
            "per-key deletes partially applied"
        );

        Err(err.context(format!("{count} of {} keys deleted", keys.len())))
    }

    async fn batch_get(&self, keys: Vec<Record>, attributes: &[String]) -> Result<BatchRead> {
        if keys.is_empty() {
            return Ok(BatchRead::default());
        }

        if let Some(field) = single_common_field(&keys) {
            let column = self.mapper.to_db_field(field);
            let values = keys.iter().filter_map(|key| key.get(field).cloned());
            let select = Select::new(self.table())
                .columns(self.columns(attributes))
                .filter(Expr::in_list(column, values));

            let records = self.exec(select).await?.into_records();

            return Ok(BatchRead {
                records: self.from_db(records),
                unprocessed: vec![],
            });
        }

        let lookups = join_all(keys.iter().map(|key| self.find_one(key, attributes))).await;
        let mut read = BatchRead::default();

        for (key, result) in keys.iter().zip(lookups) {
            match result {
                Ok(record) => read.records.extend(record),
                Err(err) if err.is_invalid_input() => {
                    tracing::warn!(
                        entity = %self.schema.entity_name,
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
