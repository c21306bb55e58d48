mod connect;
pub use connect::connect;

use crate::{Backend, Collection, Config, Error, Hooks, Result};

use tandem_core::schema::{ReferenceKind, Schema};

use indexmap::IndexMap;
use std::{collections::HashSet, sync::Arc};

/// One collection per registered entity, wired once at startup.
///
/// Collections reach each other through the registry to traverse references
/// and junctions. The registry is immutable once built.
#[derive(Debug)]
pub struct Registry {
    collections: IndexMap<String, Collection>,
    config: Config,
}

#[derive(Default)]
pub struct Builder {
    config: Config,
    entries: Vec<Entry>,
}

struct Entry {
    schema: Arc<Schema>,
    backend: Backend,
    hooks: Option<Arc<dyn Hooks>>,
}

impl Registry {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The collection of entity `name`.
    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        self.collections
            .get(name)
            .cloned()
            .ok_or_else(|| Error::collection_not_found(name))
    }

    /// Every collection by entity name, in registration order.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &Collection)> + '_ {
        self.collections
            .iter()
            .map(|(name, collection)| (name.as_str(), collection))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Builder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Registers an entity stored in `backend`.
    pub fn collection(self, schema: impl Into<Arc<Schema>>, backend: Backend) -> Self {
        self.register(schema.into(), backend, None)
    }

    /// Registers an entity with hooks run after its writes.
    pub fn collection_with_hooks(
        self,
        schema: impl Into<Arc<Schema>>,
        backend: Backend,
        hooks: impl Hooks,
    ) -> Self {
        self.register(schema.into(), backend, Some(Arc::new(hooks)))
    }

    fn register(
        mut self,
        schema: Arc<Schema>,
        backend: Backend,
        hooks: Option<Arc<dyn Hooks>>,
    ) -> Self {
        self.entries.push(Entry {
            schema,
            backend,
            hooks,
        });
        self
    }

    /// Builds every collection, checking that entity names are unique and
    /// that every reference points at a registered entity.
    pub fn build(self) -> Result<Arc<Registry>> {
        let mut names = HashSet::new();

        for entry in &self.entries {
            let name = entry.schema.entity_name.as_str();
            if !names.insert(name) {
                return Err(Error::invalid_schema(format!(
                    "entity `{name}` registered twice"
                )));
            }
        }

        for entry in &self.entries {
            for reference in &entry.schema.references {
                let mut targets = vec![reference.target()];

                if let ReferenceKind::ManyToMany { junction, .. } = &reference.kind {
                    targets.push(junction);
                }

                for target in targets {
                    if !names.contains(target) {
                        return Err(Error::invalid_schema(format!(
                            "reference `{}.{}` points at unregistered entity `{target}`",
                            entry.schema.entity_name, reference.name
                        )));
                    }
                }
            }
        }

        let config = self.config;

        let registry = Arc::new_cyclic(|registry| {
            let collections = self
                .entries
                .into_iter()
                .map(|entry| {
                    let collection = Collection::new(
                        entry.schema.clone(),
                        &entry.backend,
                        config.clone(),
                        entry.hooks,
                        registry.clone(),
                    );

                    tracing::debug!(
                        entity = %entry.schema.entity_name,
                        mode = collection.mode(),
                        "registered collection"
                    );

                    (entry.schema.entity_name.clone(), collection)
                })
                .collect();

            Registry {
                collections,
                config: config.clone(),
            }
        });

        Ok(registry)
    }
}
