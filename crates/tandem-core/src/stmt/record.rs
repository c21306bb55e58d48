use super::Value;

use indexmap::IndexMap;

/// A mapping of field name to value.
///
/// In memory, records are keyed by model field names (camelCase). At the
/// backend boundary they are keyed by backend field names; see
/// [`FieldMapper`](crate::FieldMapper). Field order is insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Returns the field's value, treating an explicit `null` as unset.
    pub fn get_present(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.fields.values()
    }

    /// Copies every field of `other` into `self`, overwriting existing
    /// fields.
    pub fn merge(&mut self, other: &Record) {
        for (field, value) in other.iter() {
            self.fields.insert(field.to_string(), value.clone());
        }
    }

    /// Returns a record holding only the named fields that are present.
    pub fn project<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Record {
        fields
            .into_iter()
            .filter_map(|field| Some((field.to_string(), self.get(field)?.clone())))
            .collect()
    }

    /// Returns `true` if every field of `subset` is present in `self` with an
    /// equal value.
    pub fn matches(&self, subset: &Record) -> bool {
        subset
            .iter()
            .all(|(field, value)| self.get(field) == Some(value))
    }

    /// Single-field records yield the field name, used to detect key sets
    /// that can collapse into one `IN (...)` query.
    pub fn single_field(&self) -> Option<&str> {
        match self.fields.len() {
            1 => self.fields.keys().next().map(String::as_str),
            _ => None,
        }
    }

    /// A stable string rendering of the record, used as a cache or set key.
    pub fn to_key_string(&self) -> String {
        serde_json::Value::from(Value::from(self.clone())).to_string()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Value {
        Value::Map(record.fields)
    }
}

impl From<IndexMap<String, Value>> for Record {
    fn from(fields: IndexMap<String, Value>) -> Record {
        Record { fields }
    }
}

impl TryFrom<Value> for Record {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Record> {
        match value {
            Value::Map(fields) => Ok(Record { fields }),
            Value::Null => Ok(Record::new()),
            other => Err(crate::Error::invalid_result(format!(
                "expected a record, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = crate::Error;

    fn try_from(value: serde_json::Value) -> crate::Result<Record> {
        Record::try_from(Value::from(value))
    }
}

impl From<Record> for serde_json::Value {
    fn from(record: Record) -> serde_json::Value {
        Value::from(record).into()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Record {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl std::ops::Index<&str> for Record {
    type Output = Value;

    #[track_caller]
    fn index(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }
}
