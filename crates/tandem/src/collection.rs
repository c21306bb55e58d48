mod junction;

mod options;
pub use options::QueryOptions;

mod result;
pub use result::{
    BatchGetResult, CreateManyResult, ErrorItem, Metadata, QueryResult, ReconcileResult,
};

use crate::{
    pipeline,
    strategy::{Backend, PageRequest, Strategy},
    Accessors, Config, Error, Hooks, Model, Registry, Related, Result,
};

use tandem_core::{
    err, record,
    schema::{ReferenceKind, Schema},
    stmt::{Record, Value},
    FieldMapper,
};

use futures::future::join_all;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, PoisonError, Weak},
};

/// The uniform read/write API over one entity.
///
/// A collection is bound to one backend when it is built and dispatches every
/// call to that backend's strategy. Cloning is cheap; clones share the
/// strategy and the read cache.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<Inner>,
}

/// Non-owning handle to a collection, held by the models it produces.
#[derive(Clone)]
pub(crate) struct WeakCollection {
    inner: Weak<Inner>,
}

struct Inner {
    schema: Arc<Schema>,
    mapper: FieldMapper,
    strategy: Box<dyn Strategy>,
    config: Config,
    hooks: Option<Arc<dyn Hooks>>,
    registry: Weak<Registry>,
    accessors: Accessors,

    /// Hydrated records by lookup key. Cleared after every write.
    cache: Mutex<HashMap<String, Vec<Record>>>,
}

impl Collection {
    pub(crate) fn new(
        schema: Arc<Schema>,
        backend: &Backend,
        config: Config,
        hooks: Option<Arc<dyn Hooks>>,
        registry: Weak<Registry>,
    ) -> Collection {
        let mapper = FieldMapper::new(&schema);
        let strategy = backend.strategy(&schema, &mapper, &config);
        let accessors = Accessors::generate(&schema);

        Collection {
            inner: Arc::new(Inner {
                schema,
                mapper,
                strategy,
                config,
                hooks,
                registry,
                accessors,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn mapper(&self) -> &FieldMapper {
        &self.inner.mapper
    }

    pub fn accessors(&self) -> &Accessors {
        &self.inner.accessors
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// `indexed` or `relational`.
    pub fn mode(&self) -> &'static str {
        self.inner.strategy.mode()
    }

    /// The registry this collection was built by, while it is alive.
    pub fn registry(&self) -> Result<Arc<Registry>> {
        self.inner
            .registry
            .upgrade()
            .ok_or_else(|| err!("registry of `{}` was dropped", self.entity()))
    }

    pub(crate) fn downgrade(&self) -> WeakCollection {
        WeakCollection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn entity(&self) -> &str {
        &self.inner.schema.entity_name
    }

    // ===== Reads =====

    /// Every record of the entity.
    pub async fn all(&self, options: QueryOptions) -> Result<QueryResult> {
        self.all_by_index_keys(Record::new(), options).await
    }

    /// Records matching every key in `keys`, through the index those keys
    /// resolve to.
    pub async fn all_by_index_keys(
        &self,
        keys: Record,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        self.read(&keys, &options)
            .await
            .map_err(|err| self.fail("all_by_index_keys", err))
    }

    /// The first record matching `keys`.
    pub async fn find_by_index_keys(
        &self,
        keys: Record,
        options: QueryOptions,
    ) -> Result<Option<Model>> {
        let options = QueryOptions {
            limit: Some(1),
            fetch_all_pages: false,
            return_cursor: false,
            return_metadata: false,
            ..options
        };

        let result = self
            .read(&keys, &options)
            .await
            .map_err(|err| self.fail("find_by_index_keys", err))?;

        Ok(result.into_first())
    }

    pub async fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<Model>> {
        let keys = record! { self.inner.schema.id_name.as_str() => id };
        self.find_by_index_keys(keys, QueryOptions::default()).await
    }

    pub async fn exists_by_id(&self, id: impl Into<Value>) -> Result<bool> {
        let id_name = self.inner.schema.id_name.as_str();
        let keys = record! { id_name => id };
        let options = QueryOptions::default().attributes([id_name]);

        Ok(self.find_by_index_keys(keys, options).await?.is_some())
    }

    /// Like [`all_by_index_keys`](Self::all_by_index_keys) with default
    /// options, memoized until the next write through this collection.
    pub async fn cached_all_by_index_keys(
        &self,
        keys: Record,
        index: Option<&str>,
    ) -> Result<Vec<Model>> {
        let cache_key = format!("{}|{}", index.unwrap_or_default(), keys.to_key_string());

        if let Some(records) = self.cache().get(&cache_key).cloned() {
            tracing::trace!(entity = %self.entity(), key = %cache_key, "read cache hit");
            return Ok(self.models(records));
        }

        let mut options = QueryOptions::default();
        options.index = index.map(str::to_string);

        let models = self.all_by_index_keys(keys, options).await?.into_models();
        let records = models.iter().map(|model| model.record().clone()).collect();
        self.cache().insert(cache_key, records);

        Ok(models)
    }

    /// Reads records by key, batching where the backend allows.
    ///
    /// Keys the backend reports as unprocessed are returned for retry. Keys
    /// rejected as malformed are dropped.
    pub async fn batch_get_by_keys(
        &self,
        keys: Vec<Record>,
        attributes: &[String],
    ) -> Result<BatchGetResult> {
        if keys.is_empty() {
            return Ok(BatchGetResult::default());
        }

        let read = self
            .inner
            .strategy
            .batch_get(keys, attributes)
            .await
            .map_err(|err| self.fail("batch_get_by_keys", err))?;

        Ok(BatchGetResult {
            data: self.models(self.hydrate_all(read.records)),
            unprocessed: read.unprocessed,
        })
    }

    async fn read(&self, keys: &Record, options: &QueryOptions) -> Result<QueryResult> {
        let schema = &self.inner.schema;
        let fields: Vec<_> = keys.fields().collect();
        let index = schema.resolve_index(fields, options.index.as_deref())?;
        let sort_field = schema.sort_field(index);

        if options.limit == Some(0) {
            return Ok(shape(options, vec![], None, false, 0));
        }

        let page_size = options.limit.unwrap_or(self.inner.config.page_size);
        let mut records = vec![];
        let mut cursor = options.cursor.clone();
        let mut pages = 0;

        // Each page's continuation state is only known once it resolves, so
        // pages are requested one after another.
        loop {
            let page = self
                .inner
                .strategy
                .query(PageRequest {
                    index,
                    keys,
                    options,
                    sort_field,
                    page_size,
                    cursor: cursor.take(),
                })
                .await?;

            pages += 1;

            tracing::debug!(
                entity = %self.entity(),
                index = index.map(|index| index.name.as_str()),
                page = pages,
                rows = page.records.len(),
                "fetched page"
            );

            records.extend(page.records);
            cursor = page.cursor;

            // A store that filters after applying the limit can return an
            // empty page that still carries a cursor
            if cursor.is_none() || !(options.fetches_all() || records.is_empty()) {
                break;
            }
        }

        let truncated = cursor.is_some();

        if truncated && !options.expects_truncation() {
            tracing::warn!(
                entity = %self.entity(),
                limit = page_size,
                "result truncated at the requested limit; pass the returned cursor to fetch more"
            );
        }

        let models = self.models(self.hydrate_all(records));
        Ok(shape(options, models, cursor, truncated, pages))
    }

    /// Reads the stored record addressed by `keys`, without the read
    /// pipeline.
    async fn find_record(&self, keys: &Record) -> Result<Option<Record>> {
        let schema = &self.inner.schema;
        let fields: Vec<_> = keys.fields().collect();
        let index = schema.resolve_index(fields, None)?;
        let options = QueryOptions::default();
        let mut cursor = None;

        // A filtered scan may return empty pages before the match
        loop {
            let page = self
                .inner
                .strategy
                .query(PageRequest {
                    index,
                    keys,
                    options: &options,
                    sort_field: schema.sort_field(index),
                    page_size: self.inner.config.page_size,
                    cursor,
                })
                .await?;

            if let Some(record) = page.records.into_iter().find(|record| !record.is_empty()) {
                return Ok(Some(record));
            }

            match page.cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(None),
            }
        }
    }

    // ===== Writes =====

    /// Creates a record, failing if one with the same key exists.
    pub async fn create(&self, record: Record) -> Result<Model> {
        self.insert(record, false, "create").await
    }

    /// Creates a record, replacing any with the same key.
    pub async fn upsert(&self, record: Record) -> Result<Model> {
        self.insert(record, true, "upsert").await
    }

    async fn insert(&self, record: Record, upsert: bool, operation: &str) -> Result<Model> {
        let result = async {
            let record = self.prepare_create(record)?;

            let row = self
                .inner
                .strategy
                .create(record, upsert)
                .await
                .map_err(|err| self.unify_validation(err))?;

            self.model(self.hydrate(row))
                .ok_or_else(|| Error::invalid_result("write returned an empty record"))
        }
        .await;

        let model = result.map_err(|err| self.fail(operation, err))?;
        self.invalidate_cache();

        if let Some(hooks) = &self.inner.hooks {
            if let Err(err) = hooks.after_create(&model).await {
                tracing::warn!(entity = %self.entity(), %err, "after_create hook failed");
            }
        }

        Ok(model)
    }

    /// Creates every record that passes validation in one batched write.
    ///
    /// Items failing validation are reported in `error_items` and never sent
    /// to the backend. When `parent` is given, each created item whose
    /// foreign key matches the parent's identifier gets the parent cached as
    /// its related record.
    pub async fn create_many(
        &self,
        records: Vec<Record>,
        parent: Option<&Model>,
    ) -> Result<CreateManyResult> {
        let mut valid = vec![];
        let mut result = CreateManyResult::default();

        for item in records {
            match self.prepare_create(item.clone()) {
                Ok(record) => valid.push(record),
                Err(error) => result.error_items.push(ErrorItem { item, error }),
            }
        }

        if valid.is_empty() {
            return Ok(result);
        }

        let write = self
            .inner
            .strategy
            .create_many(valid)
            .await
            .map_err(|err| self.fail("create_many", self.unify_validation(err)))?;

        for item in write.unprocessed {
            result.error_items.push(ErrorItem {
                item,
                error: err!("not processed by the backend; retry later"),
            });
        }

        result.created_items = self.models(self.hydrate_all(write.created));

        if let Some(parent) = parent {
            self.associate_parent(&result.created_items, parent);
        }

        self.invalidate_cache();

        if let Some(hooks) = &self.inner.hooks {
            if let Err(err) = hooks.after_create_many(&result.created_items).await {
                tracing::warn!(entity = %self.entity(), %err, "after_create_many hook failed");
            }
        }

        Ok(result)
    }

    fn associate_parent(&self, children: &[Model], parent: &Model) {
        let parent_entity = &parent.schema().entity_name;

        let reference = self.inner.schema.references.iter().find_map(|reference| {
            match &reference.kind {
                ReferenceKind::BelongsTo {
                    target,
                    foreign_key,
                } if target == parent_entity => Some((reference.name.as_str(), foreign_key)),
                _ => None,
            }
        });

        let Some((name, foreign_key)) = reference else {
            tracing::warn!(
                entity = %self.entity(),
                parent = %parent_entity,
                "no reference to parent entity; skipping association"
            );
            return;
        };

        for child in children {
            if child.get(foreign_key).is_some() && child.get(foreign_key) == parent.id() {
                child.cache_related(name, Related::One(Some(parent.clone())));
            } else {
                tracing::warn!(
                    entity = %self.entity(),
                    parent = %parent_entity,
                    child = ?child.id(),
                    "foreign key does not match parent; skipping association"
                );
            }
        }
    }

    /// Applies `changes` to the record addressed by `keys`.
    ///
    /// Setters of the changed fields and watchers of those fields run
    /// against the merged record, which is validated as a whole. Returns
    /// `Ok(None)` when no record matches.
    pub async fn update_by_keys(&self, keys: Record, changes: Record) -> Result<Option<Model>> {
        let result = self.update(keys, changes).await;
        let updated = result.map_err(|err| self.fail("update_by_keys", err))?;

        self.invalidate_cache();
        Ok(updated)
    }

    async fn update(&self, keys: Record, changes: Record) -> Result<Option<Model>> {
        let schema = &self.inner.schema;

        let read_only: Vec<_> = changes
            .fields()
            .filter(|field| schema.attribute(field).is_some_and(|a| a.read_only))
            .map(|field| format!("`{field}` is read-only"))
            .collect();

        if !read_only.is_empty() {
            return Err(Error::validation(read_only));
        }

        let Some(previous) = self.find_record(&keys).await? else {
            return Ok(None);
        };

        let mut merged = previous.clone();
        let mut changed = HashSet::new();

        for (field, value) in changes.iter() {
            merged.insert(field, value.clone());
            changed.insert(field.to_string());
        }

        pipeline::apply_defaults(schema, &mut merged);
        pipeline::apply_setters(schema, &mut merged, Some(&changed));
        pipeline::apply_watchers(schema, &mut merged, &mut changed, Some(&previous));
        pipeline::validate(schema, &merged)?;

        let set: Record = merged
            .iter()
            .filter(|(field, value)| previous.get(field) != Some(*value))
            .map(|(field, value)| (field, value.clone()))
            .collect();

        if set.is_empty() {
            return Ok(self.model(self.hydrate(merged)));
        }

        let key = previous.project(schema.key_fields());

        let row = self
            .inner
            .strategy
            .patch(key, set, &merged)
            .await
            .map_err(|err| self.unify_validation(err))?;

        Ok(row.and_then(|row| self.model(self.hydrate(row))))
    }

    /// Persists the dirty fields of every model, concurrently.
    pub async fn save_many(&self, models: &mut [Model]) -> Result<()> {
        let dirty: Vec<_> = models
            .iter()
            .enumerate()
            .filter(|(_, model)| model.is_dirty())
            .map(|(i, model)| (i, model.key(), model.changes()))
            .collect();

        if dirty.is_empty() {
            return Ok(());
        }

        let updates = join_all(
            dirty
                .iter()
                .map(|(_, key, changes)| self.update(key.clone(), changes.clone())),
        )
        .await;

        self.invalidate_cache();

        for ((i, key, _), result) in dirty.into_iter().zip(updates) {
            match result.map_err(|err| self.fail("save_many", err))? {
                Some(updated) => models[i].reset(updated.into_record()),
                None => {
                    return Err(self.fail(
                        "save_many",
                        err!("record {} no longer exists", key.to_key_string()),
                    ))
                }
            }
        }

        Ok(())
    }

    pub async fn remove_by_ids(&self, ids: Vec<Value>) -> Result<u64> {
        let id_name = self.inner.schema.id_name.as_str();
        let keys = ids.into_iter().map(|id| record! { id_name => id }).collect();

        self.remove_by_index_keys(keys).await
    }

    /// Deletes every record matching any of `keys`. Returns the number of
    /// records deleted.
    pub async fn remove_by_index_keys(&self, keys: Vec<Record>) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let count = self
            .inner
            .strategy
            .delete_many(keys)
            .await
            .map_err(|err| self.fail("remove_by_index_keys", err))?;

        self.invalidate_cache();
        Ok(count)
    }

    // ===== Pipeline plumbing =====

    fn prepare_create(&self, record: Record) -> Result<Record> {
        let schema = &self.inner.schema;
        let mut record = pipeline::strip_nulls(record);

        pipeline::apply_defaults(schema, &mut record);
        pipeline::apply_setters(schema, &mut record, None);

        let mut changed = record.fields().map(str::to_string).collect();
        pipeline::apply_watchers(schema, &mut record, &mut changed, None);

        pipeline::validate(schema, &record)?;
        Ok(record)
    }

    fn hydrate(&self, record: Record) -> Record {
        pipeline::read(&self.inner.schema, record)
    }

    fn hydrate_all(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().map(|record| self.hydrate(record)).collect()
    }

    fn model(&self, record: Record) -> Option<Model> {
        Model::from_row(self, record)
    }

    fn models(&self, records: Vec<Record>) -> Vec<Model> {
        records
            .into_iter()
            .filter_map(|record| self.model(record))
            .collect()
    }

    /// Converts the indexed store's validation shape into a validation
    /// error.
    fn unify_validation(&self, err: Error) -> Error {
        match err.as_store_validation() {
            Some((field, reason)) => {
                let field = self.inner.mapper.to_model_field(field);
                Error::validation(vec![format!("`{field}` {reason}")])
            }
            None => err,
        }
    }

    /// Logs a failure and tags it with the entity and operation.
    fn fail(&self, operation: &str, err: Error) -> Error {
        if !err.is_validation() {
            tracing::error!(
                entity = %self.entity(),
                operation,
                mode = self.mode(),
                %err,
                "data access failed"
            );
        }

        err.context(format!("{}.{operation}", self.entity()))
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Record>>> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidate_cache(&self) {
        self.cache().clear();
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("entity", &self.entity())
            .field("mode", &self.mode())
            .finish()
    }
}

impl WeakCollection {
    pub(crate) fn upgrade(&self) -> Result<Collection> {
        self.inner
            .upgrade()
            .map(|inner| Collection { inner })
            .ok_or_else(|| err!("collection was dropped"))
    }
}

impl fmt::Debug for WeakCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakCollection")
    }
}

/// Wraps the models of a read in the shape its options ask for.
fn shape(
    options: &QueryOptions,
    data: Vec<Model>,
    cursor: Option<String>,
    truncated: bool,
    pages: usize,
) -> QueryResult {
    if options.return_metadata {
        return QueryResult::WithMetadata {
            metadata: Metadata {
                total_fetched: data.len(),
                was_truncated: truncated,
                has_more: cursor.is_some(),
                cursor,
                pages_retrieved: pages,
            },
            data,
        };
    }

    match options.limit {
        Some(1) if !options.fetch_all_pages && !options.return_cursor => {
            QueryResult::Single(data.into_iter().next())
        }
        Some(_) if !options.fetch_all_pages => QueryResult::Page { data, cursor },
        _ => QueryResult::Items(data),
    }
}
