use crate::{Error, Model, Related, Result};

use tandem_core::{
    schema::Schema,
    stmt::{FromValue, Value},
};

use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use std::marker::PhantomData;

/// What a generated accessor method does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Reads the named attribute.
    Get(String),

    /// Writes the named attribute.
    Set(String),

    /// Loads the named reference.
    Related(String),
}

/// The accessor methods of one entity, generated from its schema when the
/// collection is built.
///
/// Every visible attribute gets `get<Name>`, every writable attribute
/// `set<Name>` and every reference `get<Name>`.
#[derive(Debug, Clone, Default)]
pub struct Accessors {
    methods: IndexMap<String, Accessor>,
}

impl Accessors {
    pub fn generate(schema: &Schema) -> Accessors {
        let mut accessors = Accessors::default();

        for attribute in schema.attributes.values() {
            let name = attribute.name.to_upper_camel_case();

            if !attribute.hidden {
                accessors.add(schema, format!("get{name}"), Accessor::Get(attribute.name.clone()));
            }

            if !attribute.read_only {
                accessors.add(schema, format!("set{name}"), Accessor::Set(attribute.name.clone()));
            }
        }

        for reference in &schema.references {
            let method = format!("get{}", reference.name.to_upper_camel_case());
            accessors.add(schema, method, Accessor::Related(reference.name.clone()));
        }

        accessors
    }

    fn add(&mut self, schema: &Schema, method: String, accessor: Accessor) {
        if self.methods.contains_key(&method) {
            tracing::warn!(
                entity = %schema.entity_name,
                %method,
                "accessor already generated; keeping the first"
            );
            return;
        }

        self.methods.insert(method, accessor);
    }

    pub fn get(&self, method: &str) -> Option<&Accessor> {
        self.methods.get(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn resolve(&self, method: &str) -> Result<&Accessor> {
        self.get(method)
            .ok_or_else(|| Error::invalid_argument(format!("no accessor `{method}`")))
    }
}

impl Model {
    /// Calls a generated getter, e.g. `getStatus`.
    pub fn call_get(&self, accessors: &Accessors, method: &str) -> Result<Option<&Value>> {
        match accessors.resolve(method)? {
            Accessor::Get(attribute) => Ok(self.get(attribute)),
            _ => Err(Error::invalid_argument(format!("`{method}` is not a getter"))),
        }
    }

    /// Calls a generated setter, e.g. `setStatus`.
    pub fn call_set(
        &mut self,
        accessors: &Accessors,
        method: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        match accessors.resolve(method)? {
            Accessor::Set(attribute) => self.set(attribute, value),
            _ => Err(Error::invalid_argument(format!("`{method}` is not a setter"))),
        }
    }

    /// Calls a generated relationship getter, e.g. `getItems`.
    pub async fn call_related(&self, accessors: &Accessors, method: &str) -> Result<Related> {
        match accessors.resolve(method)? {
            Accessor::Related(reference) => self.related(reference).await,
            _ => Err(Error::invalid_argument(format!(
                "`{method}` is not a relationship getter"
            ))),
        }
    }
}

/// An attribute bound to a Rust type.
///
/// The binding is checked once, when the accessor is built: an attribute
/// whose declared type cannot hold `T` is rejected then rather than on every
/// read.
#[derive(Debug)]
pub struct TypedAccessor<T> {
    attribute: String,
    _ty: PhantomData<fn() -> T>,
}

impl<T: FromValue> TypedAccessor<T> {
    pub fn new(schema: &Schema, attribute: &str) -> Result<TypedAccessor<T>> {
        let Some(attr) = schema.attribute(attribute) else {
            return Err(Error::invalid_argument(format!(
                "{} has no attribute `{attribute}`",
                schema.model_name
            )));
        };

        if !T::accepts(&attr.ty) {
            return Err(Error::invalid_schema(format!(
                "attribute `{attribute}` of type {} cannot be read as `{}`",
                attr.ty,
                std::any::type_name::<T>()
            )));
        }

        Ok(TypedAccessor {
            attribute: attribute.to_string(),
            _ty: PhantomData,
        })
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn get(&self, model: &Model) -> Option<T> {
        model.get_as(&self.attribute)
    }

    pub fn set(&self, model: &mut Model, value: T) -> Result<()>
    where
        T: Into<Value>,
    {
        model.set(&self.attribute, value)
    }
}

impl<T> Clone for TypedAccessor<T> {
    fn clone(&self) -> Self {
        TypedAccessor {
            attribute: self.attribute.clone(),
            _ty: PhantomData,
        }
    }
}
