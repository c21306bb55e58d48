use tandem_core::{
    async_trait, cursor,
    driver::{
        operation::{BatchGet, DeleteMany, Patch, Put, PutMany, PutMode, Query},
        EntityBinding, IndexedStore, Operation, Response,
    },
    stmt::{Record, Value},
    Error, Result,
};

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

/// An in-memory indexed store.
///
/// Items are stored with their composite key attributes, the way a
/// partition/sort store would hold them. Queries address an index when its
/// partition key can be rendered and scan the entity's items otherwise.
/// Continuation tokens carry an offset.
///
/// A query's limit applies to the items it reads before uncovered keys,
/// ranges and filters are evaluated, so a page may come back short or empty
/// while still carrying a continuation token.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
}

#[async_trait]
impl IndexedStore for MemoryStore {
    async fn exec(&self, binding: &EntityBinding, op: Operation) -> Result<Response> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(binding.table.clone()).or_default();

        match op {
            Operation::BatchGet(op) => batch_get(binding, table, op),
            Operation::DeleteMany(op) => delete_many(binding, table, op),
            Operation::Patch(op) => patch(binding, table, op),
            Operation::Put(op) => put(binding, table, op),
            Operation::PutMany(op) => put_many(binding, table, op),
            Operation::Query(op) => query(binding, table, op),
        }
    }
}

impl MemoryStore {
    /// Number of items stored in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .map_or(0, Vec::len)
    }
}

fn position(binding: &EntityBinding, table: &[Record], key: &Record) -> Option<usize> {
    let primary = binding.primary();

    table.iter().position(|item| {
        [&primary.pk_attr, &primary.sk_attr]
            .into_iter()
            .all(|attr| item.get(attr) == key.get(attr))
    })
}

fn stored(binding: &EntityBinding, mut item: Record) -> Result<Record> {
    let keys = binding.composite_keys(&item)?;
    binding.strip_keys(&mut item);
    item.merge(&keys);
    Ok(item)
}

fn stripped(binding: &EntityBinding, item: &Record) -> Record {
    let mut item = item.clone();
    binding.strip_keys(&mut item);
    item
}

fn project(item: Record, attributes: &[String]) -> Record {
    if attributes.is_empty() {
        item
    } else {
        item.project(attributes.iter().map(String::as_str))
    }
}

fn upsert(binding: &EntityBinding, table: &mut Vec<Record>, item: Record) -> Result<()> {
    let key = binding.primary_key(&item)?;

    match position(binding, table, &key) {
        Some(i) => table[i] = item,
        None => table.push(item),
    }

    Ok(())
}

fn put(binding: &EntityBinding, table: &mut Vec<Record>, op: Put) -> Result<Response> {
    let item = stored(binding, op.item)?;
    let key = binding.primary_key(&item)?;

    if op.mode == PutMode::Create && position(binding, table, &key).is_some() {
        return Err(Error::condition_failed(format!(
            "{} with this key already exists",
            binding.entity
        )));
    }

    let written = stripped(binding, &item);
    upsert(binding, table, item)?;

    Ok(Response::records(vec![written]))
}

fn put_many(binding: &EntityBinding, table: &mut Vec<Record>, op: PutMany) -> Result<Response> {
    let mut written = vec![];

    for item in op.items {
        let item = stored(binding, item)?;
        written.push(stripped(binding, &item));
        upsert(binding, table, item)?;
    }

    Ok(Response::records(written))
}

fn patch(binding: &EntityBinding, table: &mut [Record], op: Patch) -> Result<Response> {
    let key = binding.primary_key(&op.key)?;

    let Some(i) = position(binding, table, &key) else {
        return Ok(Response::empty());
    };

    let mut item = stripped(binding, &table[i]);

    for (field, value) in op.set.iter() {
        if value.is_null() {
            item.remove(field);
        } else {
            item.insert(field, value.clone());
        }
    }

    table[i] = stored(binding, item.clone())?;
    Ok(Response::records(vec![item]))
}

fn delete_many(
    binding: &EntityBinding,
    table: &mut Vec<Record>,
    op: DeleteMany,
) -> Result<Response> {
    let mut count = 0;

    for key in &op.keys {
        let key = binding.primary_key(key)?;

        if let Some(i) = position(binding, table, &key) {
            table.remove(i);
            count += 1;
        }
    }

    Ok(Response::count(count))
}

fn batch_get(binding: &EntityBinding, table: &[Record], op: BatchGet) -> Result<Response> {
    let mut found = vec![];

    for key in &op.keys {
        let key = binding.primary_key(key)?;

        if let Some(i) = position(binding, table, &key) {
            found.push(project(stripped(binding, &table[i]), &op.attributes));
        }
    }

    Ok(Response::records(found))
}

fn query(binding: &EntityBinding, table: &[Record], op: Query) -> Result<Response> {
    let index = match &op.index {
        Some(name) => Some(
            binding
                .index(name)
                .ok_or_else(|| Error::index_not_found(&binding.entity, name))?,
        ),
        None => None,
    };

    let keyed = index.and_then(|index| Some((index, index.pk_value(&binding.entity, &op.keys)?)));
    let primary = binding.primary();
    let prefix = binding.entity_prefix();
    let between = op.between.as_ref().map(|between| between.to_expr());

    let mut matches = vec![];

    for item in table {
        let sort = match &keyed {
            Some((index, pk)) => {
                if item.get(&index.pk_attr).and_then(Value::as_str) != Some(pk.as_str()) {
                    continue;
                }

                let sk = item.get(&index.sk_attr).and_then(Value::as_str).unwrap_or("");

                match index.sk_condition(&binding.entity, &op.keys) {
                    Some((value, true)) if sk != value => continue,
                    Some((value, false)) if !sk.starts_with(&value) => continue,
                    _ => {}
                }

                sk.to_string()
            }
            None => {
                let pk = item.get(&primary.pk_attr).and_then(Value::as_str);

                if !pk.is_some_and(|pk| pk.starts_with(&prefix)) {
                    continue;
                }

                String::new()
            }
        };

        let record = stripped(binding, item);

        let tiebreak = [&primary.pk_attr, &primary.sk_attr]
            .into_iter()
            .map(|attr| item.get(attr).and_then(Value::as_str).unwrap_or("").to_string())
            .collect::<Vec<_>>();

        matches.push((sort, tiebreak, record));
    }

    matches.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        ord => ord,
    });

    if !op.order.is_asc() {
        matches.reverse();
    }

    let offset = op.cursor.as_deref().map(cursor::decode).unwrap_or(0);
    let limit = op.limit.unwrap_or(usize::MAX);
    let total = matches.len();

    let evaluated: Vec<_> = matches
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, _, record)| record)
        .collect();

    let next = offset + evaluated.len();
    let cursor = (next < total).then(|| cursor::encode(next));

    // The limit bounds the items read, not the items returned
    let page = evaluated
        .into_iter()
        .filter(|record| {
            record.matches(&op.keys)
                && between.as_ref().map_or(true, |expr| expr.eval(record))
                && op.filter.as_ref().map_or(true, |expr| expr.eval(record))
        })
        .map(|record| project(record, &op.attributes))
        .collect();

    Ok(Response::records(page).with_cursor(cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{
        record,
        schema::{Attribute, Index, Schema},
        stmt::{Direction, Expr},
        FieldMapper,
    };

    fn binding() -> EntityBinding {
        let schema = Schema::builder("order")
            .attribute(Attribute::string("orderId").required())
            .attribute(Attribute::string("status"))
            .attribute(Attribute::string("updatedAt"))
            .index(Index::primary("primary", ["orderId"]))
            .index(Index::new("byStatus", ["status"], Vec::<String>::new()))
            .build()
            .unwrap();

        EntityBinding::from_schema(&schema, &FieldMapper::new(&schema))
    }

    fn query_op(index: &str, keys: Record, limit: usize, cursor: Option<String>) -> Query {
        Query {
            index: Some(index.to_string()),
            keys,
            between: None,
            filter: None,
            order: Direction::Asc,
            limit: Some(limit),
            cursor,
            attributes: vec![],
        }
    }

    #[test]
    fn pages_through_an_index() {
        let binding = binding();
        let mut table = vec![];

        for (id, status) in [("a", "DONE"), ("b", "OPEN"), ("c", "DONE"), ("d", "DONE")] {
            let item = record! { "id" => id, "status" => status, "updated_at" => id };
            put_many(&binding, &mut table, PutMany { items: vec![item] }).unwrap();
        }

        let keys = record! { "status" => "DONE" };
        let first = query(&binding, &table, query_op("byStatus", keys.clone(), 2, None)).unwrap();
        assert!(first.cursor.is_some());

        let cursor = first.cursor.clone();
        let ids: Vec<_> = first
            .into_records()
            .into_iter()
            .map(|record| record["id"].clone())
            .collect();
        assert_eq!(ids, [Value::from("a"), Value::from("c")]);

        let second = query(&binding, &table, query_op("byStatus", keys, 2, cursor)).unwrap();
        assert!(second.cursor.is_none());
        assert_eq!(second.into_records()[0]["id"], Value::from("d"));
    }

    #[test]
    fn limit_applies_before_filters() {
        let binding = binding();
        let mut table = vec![];

        for (id, status) in [("a", "OPEN"), ("b", "OPEN"), ("c", "DONE")] {
            let item = record! { "id" => id, "status" => status, "updated_at" => id };
            put_many(&binding, &mut table, PutMany { items: vec![item] }).unwrap();
        }

        let scan = |cursor: Option<String>| Query {
            index: None,
            filter: Some(Expr::eq("status", "DONE")),
            ..query_op("primary", Record::new(), 2, cursor)
        };

        let first = query(&binding, &table, scan(None)).unwrap();
        assert!(first.cursor.is_some());
        let cursor = first.cursor.clone();
        assert!(first.into_records().is_empty());

        let second = query(&binding, &table, scan(cursor)).unwrap();
        assert!(second.cursor.is_none());
        assert_eq!(second.into_records()[0]["id"], Value::from("c"));
    }

    #[test]
    fn create_conflicts_with_an_existing_item() {
        let binding = binding();
        let mut table = vec![];
        let item = record! { "id" => "a", "status" => "OPEN" };

        let op = |item: &Record| Put {
            item: item.clone(),
            mode: PutMode::Create,
        };

        put(&binding, &mut table, op(&item)).unwrap();
        let err = put(&binding, &mut table, op(&item)).unwrap_err();
        assert!(err.is_condition_failed());
    }
}
