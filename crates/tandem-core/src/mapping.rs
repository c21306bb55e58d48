//! Translation between model field names and backend column names.

use crate::{
    schema::Schema,
    stmt::{Record, Value},
};

use heck::{ToLowerCamelCase, ToSnakeCase};
use indexmap::IndexMap;

/// The column every backend uses for a record's identity.
pub const ID_FIELD: &str = "id";

/// Bidirectional field-name translation for one schema.
///
/// Model fields are camelCase and backend columns snake_case, unless an
/// attribute declares an explicit column. The schema's identifier attribute
/// is always stored in [`ID_FIELD`].
#[derive(Debug, Clone)]
pub struct FieldMapper {
    id_name: String,

    /// Model field -> column, for every declared attribute.
    to_db: IndexMap<String, String>,

    /// Column -> model field, the inverse of `to_db`.
    to_model: IndexMap<String, String>,
}

impl FieldMapper {
    pub fn new(schema: &Schema) -> FieldMapper {
        let mut to_db = IndexMap::new();
        let mut to_model = IndexMap::new();

        for attribute in schema.attributes.values() {
            let column = if attribute.name == schema.id_name {
                ID_FIELD.to_string()
            } else if let Some(field) = &attribute.field {
                field.clone()
            } else {
                attribute.name.to_snake_case()
            };

            to_model.insert(column.clone(), attribute.name.clone());
            to_db.insert(attribute.name.clone(), column);
        }

        FieldMapper {
            id_name: schema.id_name.clone(),
            to_db,
            to_model,
        }
    }

    pub fn to_db_field(&self, field: &str) -> String {
        if field == self.id_name {
            return ID_FIELD.to_string();
        }

        match self.to_db.get(field) {
            Some(column) => column.clone(),
            None => field.to_snake_case(),
        }
    }

    pub fn to_model_field(&self, column: &str) -> String {
        if column == ID_FIELD {
            return self.id_name.clone();
        }

        match self.to_model.get(column) {
            Some(field) => field.clone(),
            None => column.to_lower_camel_case(),
        }
    }

    pub fn to_db_record(&self, record: &Record) -> Record {
        record
            .iter()
            .map(|(field, value)| (self.to_db_field(field), value.clone()))
            .collect()
    }

    /// Maps a backend row to model fields, dropping absent values and
    /// canonicalizing timestamp strings.
    pub fn from_db_record(&self, row: &Record) -> Record {
        row.iter()
            .filter(|(_, value)| !value.is_absent())
            .map(|(column, value)| (self.to_model_field(column), normalize(value)))
            .collect()
    }
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) if Value::is_timestamp_like(s) => match Value::canonical_timestamp(s) {
            Some(canonical) => Value::String(canonical),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}
