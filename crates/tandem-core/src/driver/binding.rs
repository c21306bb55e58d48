use crate::{
    mapping::FieldMapper,
    schema::Schema,
    stmt::{Record, Value},
    Error, Result,
};

/// How one entity is laid out in an indexed store.
///
/// Every schema index becomes a pair of composite key attributes. The primary
/// index keys the table itself (`pk`/`sk`); every other index is a global
/// secondary index `gsi<n>` keyed by `gsi<n>pk`/`gsi<n>sk`. Key values are
/// rendered as `$<entity>#<field>_<value>#...` over backend field names.
#[derive(Debug, Clone)]
pub struct EntityBinding {
    pub entity: String,

    pub table: String,

    /// The primary index first.
    pub indexes: Vec<IndexBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinding {
    /// Schema index name
    pub name: String,

    pub primary: bool,

    /// Native index name. `None` for the table itself.
    pub native: Option<String>,

    /// Partition key attribute
    pub pk_attr: String,

    /// Sort key attribute
    pub sk_attr: String,

    /// Backend fields composing the partition key
    pub pk: Vec<String>,

    /// Backend fields composing the sort key
    pub sk: Vec<String>,
}

impl EntityBinding {
    pub fn from_schema(schema: &Schema, mapper: &FieldMapper) -> EntityBinding {
        let to_db = |fields: &[String]| -> Vec<String> {
            fields.iter().map(|f| mapper.to_db_field(f)).collect()
        };

        let mut indexes = vec![];

        match schema.primary_index() {
            Some(index) => indexes.push(IndexBinding {
                name: index.name.clone(),
                primary: true,
                native: None,
                pk_attr: "pk".to_string(),
                sk_attr: "sk".to_string(),
                pk: to_db(&index.pk),
                sk: to_db(&index.sk),
            }),
            None => indexes.push(IndexBinding {
                name: "primary".to_string(),
                primary: true,
                native: None,
                pk_attr: "pk".to_string(),
                sk_attr: "sk".to_string(),
                pk: vec![mapper.to_db_field(&schema.id_name)],
                sk: vec![],
            }),
        }

        for (n, index) in schema.indexes.values().filter(|i| !i.primary).enumerate() {
            let native = format!("gsi{}", n + 1);

            // Secondary indexes without sort segments order by the schema's
            // sort field.
            let sk = if index.sk.is_empty() {
                vec![mapper.to_db_field(schema.sort_field(None))]
            } else {
                to_db(&index.sk)
            };

            indexes.push(IndexBinding {
                name: index.name.clone(),
                primary: false,
                pk_attr: format!("{native}pk"),
                sk_attr: format!("{native}sk"),
                native: Some(native),
                pk: to_db(&index.pk),
                sk,
            });
        }

        EntityBinding {
            entity: schema.entity_name.clone(),
            table: schema.table_name.clone(),
            indexes,
        }
    }

    pub fn primary(&self) -> &IndexBinding {
        &self.indexes[0]
    }

    pub fn index(&self, name: &str) -> Option<&IndexBinding> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Every composite key attribute this binding writes.
    pub fn key_attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.indexes
            .iter()
            .flat_map(|index| [index.pk_attr.as_str(), index.sk_attr.as_str()])
    }

    /// Prefix shared by the partition keys of every item of this entity.
    pub fn entity_prefix(&self) -> String {
        format!("${}#", self.entity)
    }

    /// Computes the composite key attributes of `item`.
    ///
    /// Every primary segment must be present. Secondary indexes missing a
    /// segment are left out, making them sparse.
    pub fn composite_keys(&self, item: &Record) -> Result<Record> {
        let mut keys = Record::new();

        for index in &self.indexes {
            if index.primary {
                if let Some(field) = index.segments().find(|f| item.get_present(f).is_none()) {
                    return Err(Error::store_validation(
                        field,
                        format!("missing composite attribute for index `{}`", index.name),
                    ));
                }
            }

            if let (Some(pk), Some(sk)) = (index.pk_value(&self.entity, item), index.sk_value(&self.entity, item)) {
                keys.insert(&index.pk_attr, pk);
                keys.insert(&index.sk_attr, sk);
            }
        }

        Ok(keys)
    }

    /// The table key (`pk`/`sk`) addressing `item`.
    pub fn primary_key(&self, item: &Record) -> Result<Record> {
        let primary = self.primary();

        if let Some(field) = primary.segments().find(|f| item.get_present(f).is_none()) {
            return Err(Error::store_validation(field, "missing primary key attribute"));
        }

        let mut key = Record::new();
        if let Some(pk) = primary.pk_value(&self.entity, item) {
            key.insert(&primary.pk_attr, pk);
        }
        if let Some(sk) = primary.sk_value(&self.entity, item) {
            key.insert(&primary.sk_attr, sk);
        }
        Ok(key)
    }

    /// Removes composite key attributes from an item read from the store.
    pub fn strip_keys(&self, item: &mut Record) {
        for attr in self.indexes.iter().flat_map(|i| [&i.pk_attr, &i.sk_attr]) {
            item.remove(attr);
        }
    }
}

impl IndexBinding {
    /// Partition segments followed by sort segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.pk.iter().chain(self.sk.iter()).map(String::as_str)
    }

    pub fn pk_value(&self, entity: &str, item: &Record) -> Option<String> {
        render(entity, &self.pk, item)
    }

    pub fn sk_value(&self, entity: &str, item: &Record) -> Option<String> {
        render(entity, &self.sk, item)
    }

    /// Sort key condition for the leading sort segments present in `keys`.
    ///
    /// Returns the rendered value and whether it addresses the full sort
    /// key (equality) or a prefix of it (`begins_with`). `None` when no sort
    /// segment is supplied.
    pub fn sk_condition(&self, entity: &str, keys: &Record) -> Option<(String, bool)> {
        let supplied = self
            .sk
            .iter()
            .take_while(|f| keys.get_present(f).is_some())
            .count();

        if supplied == 0 {
            return None;
        }

        let mut value = render(entity, &self.sk[..supplied], keys)?;
        let exact = supplied == self.sk.len();

        if !exact {
            value.push('#');
        }

        Some((value, exact))
    }

    /// Fields of `keys` addressed by the partition key or by
    /// [`sk_condition`](Self::sk_condition). The rest must be filtered.
    pub fn covered_fields<'a>(&'a self, keys: &'a Record) -> impl Iterator<Item = &'a str> + 'a {
        let sk_supplied = self
            .sk
            .iter()
            .take_while(|f| keys.get_present(f).is_some())
            .count();

        self.pk
            .iter()
            .chain(self.sk[..sk_supplied].iter())
            .map(String::as_str)
    }
}

fn render(entity: &str, fields: &[String], item: &Record) -> Option<String> {
    let mut out = format!("${entity}");

    for field in fields {
        let value = item.get_present(field)?;
        out.push('#');
        out.push_str(field);
        out.push('_');
        out.push_str(&render_value(value));
    }

    Some(out)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(v) => v.clone(),
        Value::Bool(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}
