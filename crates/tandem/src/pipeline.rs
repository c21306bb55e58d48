//! The transformations a collection applies around every backend call.
//!
//! Writes run `apply_defaults`, `apply_setters`, `apply_watchers` and
//! `validate` over a model-keyed record, then `map_to_backend`. Reads run
//! [`read`] over every row a backend returns.

use crate::{Error, Result};

use tandem_core::{
    mapping::FieldMapper,
    schema::Schema,
    stmt::{Record, Value},
};

use jiff::SignedDuration;
use std::collections::HashSet;

/// The attribute whose watcher must move strictly forward on every write.
pub const UPDATED_AT: &str = "updatedAt";

/// Fills unset attributes from their defaults. Function defaults are invoked
/// now.
pub fn apply_defaults(schema: &Schema, record: &mut Record) {
    for attribute in schema.attributes.values() {
        if record.get_present(&attribute.name).is_some() {
            continue;
        }

        if let Some(value) = attribute.default_now() {
            record.insert(&attribute.name, value);
        }
    }
}

/// Runs attribute setters in declaration order.
///
/// With `only`, setters run for those fields; otherwise every setter runs
/// and receives `Null` for an unset value. Watching attributes are left to
/// [`apply_watchers`].
pub fn apply_setters(schema: &Schema, record: &mut Record, only: Option<&HashSet<String>>) {
    for attribute in schema.attributes.values() {
        let Some(set) = &attribute.set else { continue };

        if attribute.watch.is_some() {
            continue;
        }

        if only.is_some_and(|fields| !fields.contains(&attribute.name)) {
            continue;
        }

        let current = record.get(&attribute.name).cloned().unwrap_or_default();
        let value = set(current, record);

        if value.is_null() && !record.contains(&attribute.name) {
            continue;
        }

        record.insert(&attribute.name, value);
    }
}

/// Recomputes every watching attribute whose watched fields appear in
/// `changed`, adding recomputed attributes to `changed`.
///
/// `updatedAt` never moves backwards: a recomputed value not strictly after
/// the `previous` one becomes the previous value plus one second.
pub fn apply_watchers(
    schema: &Schema,
    record: &mut Record,
    changed: &mut HashSet<String>,
    previous: Option<&Record>,
) {
    for attribute in schema.attributes.values() {
        let (Some(_), Some(set)) = (&attribute.watch, &attribute.set) else {
            continue;
        };

        if !changed.iter().any(|field| attribute.watches(field)) {
            continue;
        }

        let current = record.get(&attribute.name).cloned().unwrap_or_default();
        let mut value = set(current, record);

        if attribute.name == UPDATED_AT {
            if let Some(prev) = previous.and_then(|p| p.get_present(UPDATED_AT)) {
                value = strictly_after(value, prev);
            }
        }

        if !value.is_null() {
            record.insert(&attribute.name, value);
            changed.insert(attribute.name.clone());
        }
    }
}

fn strictly_after(value: Value, previous: &Value) -> Value {
    match (value.as_timestamp(), previous.as_timestamp()) {
        (Some(next), Some(prev)) if next <= prev => prev
            .checked_add(SignedDuration::from_secs(1))
            .map(Value::from)
            .unwrap_or(value),
        _ => value,
    }
}

/// Checks required-ness, type and custom validation of every attribute,
/// collecting one message per failure.
pub fn validate(schema: &Schema, record: &Record) -> Result<()> {
    let mut messages = vec![];

    for attribute in schema.attributes.values() {
        let name = &attribute.name;

        match record.get_present(name) {
            None if attribute.required => messages.push(format!("`{name}` is required")),
            None => {}
            Some(value) if !attribute.ty.accepts(value) => messages.push(format!(
                "`{name}` must be {}, got {}",
                attribute.ty,
                value.type_name()
            )),
            Some(value) => {
                if let Some(validate) = &attribute.validate {
                    if !validate(value, record) {
                        messages.push(format!("`{name}` is invalid"));
                    }
                }
            }
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(messages))
    }
}

/// Maps a model record to backend field names. Attributes excluded from
/// relational writes are dropped when `relational` is set.
pub fn map_to_backend(
    schema: &Schema,
    mapper: &FieldMapper,
    record: &Record,
    relational: bool,
) -> Record {
    record
        .iter()
        .filter(|(field, _)| {
            !relational
                || schema
                    .attribute(field)
                    .map_or(true, |attribute| attribute.relational)
        })
        .map(|(field, value)| (mapper.to_db_field(field), value.clone()))
        .collect()
}

/// Fills defaults of attributes that are never written to a relational
/// backend.
pub fn hydrate_read_defaults(schema: &Schema, record: &mut Record) {
    for attribute in schema.attributes.values() {
        if attribute.relational || record.get_present(&attribute.name).is_some() {
            continue;
        }

        if let Some(value) = attribute.default_now() {
            record.insert(&attribute.name, value);
        }
    }
}

/// Coerces backend values to their attribute's declared type.
pub fn coerce(schema: &Schema, record: &mut Record) {
    for attribute in schema.attributes.values() {
        if let Some(value) = record.remove(&attribute.name) {
            record.insert(&attribute.name, attribute.ty.coerce(value));
        }
    }
}

/// Runs attribute getters. Getters see the record as it was read.
pub fn apply_getters(schema: &Schema, record: &mut Record) {
    let snapshot = record.clone();

    for attribute in schema.attributes.values() {
        let Some(get) = &attribute.get else { continue };

        let current = snapshot.get(&attribute.name).cloned().unwrap_or_default();
        let value = get(current, &snapshot);

        if value.is_null() {
            record.remove(&attribute.name);
        } else {
            record.insert(&attribute.name, value);
        }
    }
}

pub fn strip_hidden(schema: &Schema, record: &mut Record) {
    for attribute in schema.attributes.values().filter(|a| a.hidden) {
        record.remove(&attribute.name);
    }
}

/// The read pipeline applied to every row before it becomes a model.
pub fn read(schema: &Schema, mut record: Record) -> Record {
    hydrate_read_defaults(schema, &mut record);
    coerce(schema, &mut record);
    apply_getters(schema, &mut record);
    strip_hidden(schema, &mut record);
    record
}

/// Drops `Null` fields.
pub fn strip_nulls(record: Record) -> Record {
    record.into_iter().filter(|(_, value)| !value.is_null()).collect()
}
