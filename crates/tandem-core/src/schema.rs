mod attribute;
pub use attribute::{
    Attribute, AttributeType, DefaultValue, DefaultFn, GetFn, SetFn, ValidateFn, Watch,
};

mod builder;
pub use builder::Builder;

mod index;
pub use index::Index;

mod reference;
pub use reference::{Reference, ReferenceKind};

use crate::{stmt::Value, Result};

use indexmap::IndexMap;

/// Read-only description of one entity: its attributes, indexes and
/// references.
///
/// A schema is immutable once built and shared (behind an `Arc`) by every
/// collection and model of the entity.
#[derive(Debug)]
pub struct Schema {
    /// Entity name, e.g. `order_item`. Used as the registry key.
    pub entity_name: String,

    /// Model name, e.g. `OrderItem`.
    pub model_name: String,

    /// Name of the identifier attribute, e.g. `orderItemId`.
    pub id_name: String,

    /// Relational table name.
    pub table_name: String,

    /// Attributes in declaration order.
    pub attributes: IndexMap<String, Attribute>,

    /// Indexes by name. The primary index comes first.
    pub indexes: IndexMap<String, Index>,

    pub references: Vec<Reference>,
}

impl Schema {
    pub fn builder(entity_name: impl Into<String>) -> Builder {
        Builder::new(entity_name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    /// The index addressed by the identifier alone, if any.
    pub fn primary_index(&self) -> Option<&Index> {
        self.indexes.values().find(|index| index.primary)
    }

    pub fn reference(&self, name: &str) -> Option<&Reference> {
        self.references.iter().find(|reference| reference.name == name)
    }

    /// Returns `true` if the entity declares its identifier as an attribute.
    /// Junction entities are addressed by their composite pair instead.
    pub fn has_id(&self) -> bool {
        self.has_attribute(&self.id_name)
    }

    /// Attribute names that compose the primary key: the primary index's
    /// partition and sort segments, or the identifier alone.
    pub fn key_fields(&self) -> Vec<&str> {
        match self.primary_index() {
            Some(index) => index.key_fields().collect(),
            None => vec![self.id_name.as_str()],
        }
    }

    /// Resolves the index to query for a set of key fields.
    ///
    /// An explicit `name` must exist. Otherwise the index whose partition
    /// segments are all supplied, covering the most supplied fields, wins;
    /// ties go to declaration order. Returns `Ok(None)` when no index
    /// applies.
    pub fn resolve_index<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str> + Clone,
        name: Option<&str>,
    ) -> Result<Option<&Index>> {
        if let Some(name) = name {
            return self
                .index(name)
                .map(Some)
                .ok_or_else(|| crate::Error::index_not_found(&self.entity_name, name));
        }

        let mut best: Option<(&Index, usize)> = None;

        for index in self.indexes.values() {
            let supplied = |field: &str| keys.clone().into_iter().any(|key| key == field);

            if index.pk.is_empty() || !index.pk.iter().all(|f| supplied(f)) {
                continue;
            }

            // Sort segments only count as a leading prefix.
            let sk_prefix = index.sk.iter().take_while(|f| supplied(f)).count();
            let score = index.pk.len() + sk_prefix;

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        Ok(best.map(|(index, _)| index))
    }

    /// The field results are ordered by: the last sort segment of `index`,
    /// else `updatedAt` when declared, else the identifier.
    pub fn sort_field<'a>(&'a self, index: Option<&'a Index>) -> &'a str {
        if let Some(field) = index.and_then(|index| index.sk.last()) {
            return field;
        }

        if self.has_attribute("updatedAt") {
            "updatedAt"
        } else {
            &self.id_name
        }
    }

    /// Extracts the identifier of a record, if present.
    pub fn id_of<'a>(&self, record: &'a crate::stmt::Record) -> Option<&'a Value> {
        record.get_present(&self.id_name)
    }
}
