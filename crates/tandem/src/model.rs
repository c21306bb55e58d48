use crate::{
    collection::{Collection, WeakCollection},
    Error, QueryOptions, ReconcileResult, Result,
};

use tandem_core::{
    record,
    schema::{ReferenceKind, Schema},
    stmt::{FromValue, Record, Value},
};

use indexmap::{IndexMap, IndexSet};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

/// One hydrated record of an entity.
///
/// A model holds a non-owning handle to the collection that produced it,
/// used to persist changes and to traverse references lazily.
pub struct Model {
    record: Record,

    /// Fields set since the model was read or last saved
    dirty: IndexSet<String>,

    schema: Arc<Schema>,

    collection: WeakCollection,

    /// Loaded references by name
    related: Mutex<IndexMap<String, Related>>,
}

/// The records a reference resolves to.
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Model>),
    Many(Vec<Model>),
}

impl Related {
    pub fn into_one(self) -> Option<Model> {
        match self {
            Related::One(model) => model,
            Related::Many(models) => models.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Model> {
        match self {
            Related::One(model) => model.into_iter().collect(),
            Related::Many(models) => models,
        }
    }
}

impl Model {
    /// Wraps a hydrated row. Empty rows yield no model.
    pub(crate) fn from_row(collection: &Collection, record: Record) -> Option<Model> {
        if record.is_empty() {
            return None;
        }

        Some(Model {
            record,
            dirty: IndexSet::new(),
            schema: collection.schema().clone(),
            collection: collection.downgrade(),
            related: Mutex::new(IndexMap::new()),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get_present(field)
    }

    /// Reads a field as a Rust type. `None` when unset or of another type.
    pub fn get_as<T: FromValue>(&self, field: &str) -> Option<T> {
        self.get(field).cloned().and_then(T::from_value)
    }

    /// Sets a field, marking it dirty until the model is saved.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let Some(attribute) = self.schema.attribute(field) else {
            return Err(Error::validation(vec![format!(
                "`{field}` is not an attribute of {}",
                self.schema.model_name
            )]));
        };

        if attribute.read_only {
            return Err(Error::validation(vec![format!("`{field}` is read-only")]));
        }

        self.record.insert(field, value);
        self.dirty.insert(field.to_string());
        Ok(())
    }

    pub fn id(&self) -> Option<&Value> {
        self.schema.id_of(&self.record)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.dirty.iter().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.record.clone().into()
    }

    /// The primary key of this record.
    pub(crate) fn key(&self) -> Record {
        self.record.project(self.schema.key_fields())
    }

    /// The dirty fields and their new values.
    pub(crate) fn changes(&self) -> Record {
        self.dirty
            .iter()
            .map(|field| {
                let value = self.record.get(field).cloned().unwrap_or_default();
                (field.as_str(), value)
            })
            .collect()
    }

    /// Replaces the record after a save.
    pub(crate) fn reset(&mut self, record: Record) {
        self.record = record;
        self.dirty.clear();
    }

    /// Persists the dirty fields.
    pub async fn save(&mut self) -> Result<()> {
        let collection = self.collection.upgrade()?;
        collection.save_many(std::slice::from_mut(self)).await
    }

    /// Deletes the record. Returns `false` if it was already gone.
    pub async fn remove(&self) -> Result<bool> {
        let collection = self.collection.upgrade()?;
        Ok(collection.remove_by_index_keys(vec![self.key()]).await? > 0)
    }

    /// Loads the records of reference `name`, caching them on this model.
    pub async fn related(&self, name: &str) -> Result<Related> {
        if let Some(related) = self.related_cache().get(name).cloned() {
            return Ok(related);
        }

        let related = self.load_related(name).await?;
        self.cache_related(name, related.clone());
        Ok(related)
    }

    /// Points many-to-many reference `name` at exactly the targets `ids`.
    pub async fn set_related(&self, name: &str, ids: Vec<Value>) -> Result<ReconcileResult> {
        let reference = self.reference(name)?;

        let ReferenceKind::ManyToMany {
            junction,
            owner_key,
            target_key,
            ..
        } = &reference.kind
        else {
            return Err(Error::invalid_argument(format!(
                "`{name}` of {} is not a many-to-many reference",
                self.schema.model_name
            )));
        };

        let id = self.require_id()?;
        let junction = self.collection.upgrade()?.registry()?.get_collection(junction)?;
        let result = junction
            .reconcile_junction(owner_key, id, target_key, ids)
            .await?;

        self.related_cache().shift_remove(name);
        Ok(result)
    }

    pub(crate) fn cache_related(&self, name: &str, related: Related) {
        self.related_cache().insert(name.to_string(), related);
    }

    async fn load_related(&self, name: &str) -> Result<Related> {
        let reference = self.reference(name)?;
        let registry = self.collection.upgrade()?.registry()?;
        let target = registry.get_collection(reference.target())?;

        match &reference.kind {
            ReferenceKind::BelongsTo { foreign_key, .. } => match self.get(foreign_key) {
                Some(id) => Ok(Related::One(target.find_by_id(id.clone()).await?)),
                None => Ok(Related::One(None)),
            },
            ReferenceKind::HasOne { foreign_key, .. } => {
                let keys = record! { foreign_key.as_str() => self.require_id()? };
                let model = target
                    .find_by_index_keys(keys, QueryOptions::default())
                    .await?;
                Ok(Related::One(model))
            }
            ReferenceKind::HasMany {
                foreign_key, index, ..
            } => {
                let keys = record! { foreign_key.as_str() => self.require_id()? };
                let models = target
                    .cached_all_by_index_keys(keys, index.as_deref())
                    .await?;
                Ok(Related::Many(models))
            }
            ReferenceKind::ManyToMany {
                junction,
                owner_key,
                target_key,
                ..
            } => {
                let junction = registry.get_collection(junction)?;
                let keys = record! { owner_key.as_str() => self.require_id()? };

                let target_keys: Vec<_> = junction
                    .all_by_index_keys(keys, QueryOptions::default())
                    .await?
                    .into_models()
                    .iter()
                    .filter_map(|link| link.get(target_key))
                    .map(|id| record! { target.schema().id_name.as_str() => id.clone() })
                    .collect();

                let result = target.batch_get_by_keys(target_keys, &[]).await?;
                Ok(Related::Many(result.data))
            }
        }
    }

    fn reference(&self, name: &str) -> Result<&tandem_core::schema::Reference> {
        self.schema.reference(name).ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} has no reference `{name}`",
                self.schema.model_name
            ))
        })
    }

    fn require_id(&self) -> Result<Value> {
        self.id().cloned().ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} has no `{}`",
                self.schema.model_name, self.schema.id_name
            ))
        })
    }

    fn related_cache(&self) -> std::sync::MutexGuard<'_, IndexMap<String, Related>> {
        self.related.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for Model {
    fn clone(&self) -> Model {
        Model {
            record: self.record.clone(),
            dirty: self.dirty.clone(),
            schema: self.schema.clone(),
            collection: self.collection.clone(),
            related: Mutex::new(self.related_cache().clone()),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&self.schema.model_name)
            .field("record", &self.record)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Model) -> bool {
        self.schema.entity_name == other.schema.entity_name && self.record == other.record
    }
}
