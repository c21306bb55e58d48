use super::{Attribute, Index, Reference, ReferenceKind, Schema};
use crate::{Error, Result};

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Fluent construction of a [`Schema`].
#[derive(Debug)]
pub struct Builder {
    entity_name: String,
    model_name: Option<String>,
    id_name: Option<String>,
    table_name: Option<String>,
    attributes: Vec<Attribute>,
    indexes: Vec<Index>,
    references: Vec<Reference>,
}

impl Builder {
    pub(super) fn new(entity_name: impl Into<String>) -> Builder {
        Builder {
            entity_name: entity_name.into(),
            model_name: None,
            id_name: None,
            table_name: None,
            attributes: vec![],
            indexes: vec![],
            references: vec![],
        }
    }

    /// Defaults to the UpperCamelCase entity name.
    pub fn model_name(mut self, name: impl Into<String>) -> Builder {
        self.model_name = Some(name.into());
        self
    }

    /// Defaults to `<entityName>Id`.
    pub fn id_name(mut self, name: impl Into<String>) -> Builder {
        self.id_name = Some(name.into());
        self
    }

    /// Defaults to the snake_case entity name followed by `s`.
    pub fn table_name(mut self, name: impl Into<String>) -> Builder {
        self.table_name = Some(name.into());
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Builder {
        self.attributes.push(attribute);
        self
    }

    pub fn index(mut self, index: Index) -> Builder {
        self.indexes.push(index);
        self
    }

    pub fn reference(mut self, reference: Reference) -> Builder {
        self.references.push(reference);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let entity_name = self.entity_name;
        let model_name = self
            .model_name
            .unwrap_or_else(|| entity_name.to_upper_camel_case());
        let id_name = self
            .id_name
            .unwrap_or_else(|| format!("{}Id", entity_name.to_lower_camel_case()));
        let table_name = self
            .table_name
            .unwrap_or_else(|| format!("{}s", entity_name.to_snake_case()));

        let mut attributes = indexmap::IndexMap::new();
        for attribute in self.attributes {
            if attributes.contains_key(&attribute.name) {
                return Err(Error::invalid_schema(format!(
                    "duplicate attribute `{}` on `{entity_name}`",
                    attribute.name
                )));
            }
            attributes.insert(attribute.name.clone(), attribute);
        }

        if self.indexes.iter().filter(|index| index.primary).count() > 1 {
            return Err(Error::invalid_schema(format!(
                "`{entity_name}` declares more than one primary index"
            )));
        }

        // Primary index first.
        let mut indexes = indexmap::IndexMap::new();
        let (primary, secondary): (Vec<_>, Vec<_>) =
            self.indexes.into_iter().partition(|index| index.primary);

        for index in primary.into_iter().chain(secondary) {
            if let Some(field) = index.key_fields().find(|f| !attributes.contains_key(*f)) {
                return Err(Error::invalid_schema(format!(
                    "index `{}` on `{entity_name}` references undeclared attribute `{field}`",
                    index.name
                )));
            }

            if indexes.contains_key(&index.name) {
                return Err(Error::invalid_schema(format!(
                    "duplicate index `{}` on `{entity_name}`",
                    index.name
                )));
            }

            indexes.insert(index.name.clone(), index);
        }

        for reference in &self.references {
            if let ReferenceKind::BelongsTo { foreign_key, .. } = &reference.kind {
                if !attributes.contains_key(foreign_key) {
                    return Err(Error::invalid_schema(format!(
                        "reference `{}` on `{entity_name}` uses undeclared foreign key `{foreign_key}`",
                        reference.name
                    )));
                }
            }
        }

        Ok(Schema {
            entity_name,
            model_name,
            id_name,
            table_name,
            attributes,
            indexes,
            references: self.references,
        })
    }
}
