use crate::stmt::{Record, Value};

use std::{fmt, sync::Arc};

/// Computes a default value at write time.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Transforms a value on read. Receives the value and the whole record.
pub type GetFn = Arc<dyn Fn(Value, &Record) -> Value + Send + Sync>;

/// Transforms a value on write. Receives the value (`Null` when unset) and
/// the in-progress record, so it may derive the value from siblings.
pub type SetFn = Arc<dyn Fn(Value, &Record) -> Value + Send + Sync>;

/// Custom validation. Receives the value and the whole record; returns
/// `false` to reject.
pub type ValidateFn = Arc<dyn Fn(&Value, &Record) -> bool + Send + Sync>;

/// One attribute of an entity.
#[derive(Clone)]
pub struct Attribute {
    /// Model field name (camelCase).
    pub name: String,

    pub ty: AttributeType,

    pub required: bool,

    pub default: Option<DefaultValue>,

    pub validate: Option<ValidateFn>,

    pub get: Option<GetFn>,

    pub set: Option<SetFn>,

    /// Sibling fields whose change recomputes this attribute through `set`.
    pub watch: Option<Watch>,

    /// Hidden attributes are never returned on read.
    pub hidden: bool,

    /// Read-only attributes can be set on create but never updated.
    pub read_only: bool,

    /// Backend field name, overriding the snake_case default.
    pub field: Option<String>,

    /// When `false` the attribute is never written to a relational backend;
    /// its default is filled in on read instead.
    pub relational: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Boolean,

    /// One of a fixed set of literal values.
    Enum(Vec<Value>),

    /// A string-keyed map.
    Map,

    List,

    /// Anything; no type check.
    Any,
}

#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Fn(DefaultFn),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Watch {
    /// Any field change.
    All,
    Fields(Vec<String>),
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Attribute {
        Attribute {
            name: name.into(),
            ty,
            required: false,
            default: None,
            validate: None,
            get: None,
            set: None,
            watch: None,
            hidden: false,
            read_only: false,
            field: None,
            relational: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::String)
    }

    pub fn number(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::Boolean)
    }

    pub fn map(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::Map)
    }

    pub fn list(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::List)
    }

    pub fn any(name: impl Into<String>) -> Attribute {
        Attribute::new(name, AttributeType::Any)
    }

    pub fn enumeration<V: Into<Value>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Attribute {
        Attribute::new(
            name,
            AttributeType::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn required(mut self) -> Attribute {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Attribute {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_fn(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Attribute {
        self.default = Some(DefaultValue::Fn(Arc::new(f)));
        self
    }

    pub fn validate(mut self, f: impl Fn(&Value, &Record) -> bool + Send + Sync + 'static) -> Attribute {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn get(mut self, f: impl Fn(Value, &Record) -> Value + Send + Sync + 'static) -> Attribute {
        self.get = Some(Arc::new(f));
        self
    }

    pub fn set(mut self, f: impl Fn(Value, &Record) -> Value + Send + Sync + 'static) -> Attribute {
        self.set = Some(Arc::new(f));
        self
    }

    pub fn watch_all(mut self) -> Attribute {
        self.watch = Some(Watch::All);
        self
    }

    pub fn watch<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Attribute {
        self.watch = Some(Watch::Fields(fields.into_iter().map(Into::into).collect()));
        self
    }

    pub fn hidden(mut self) -> Attribute {
        self.hidden = true;
        self
    }

    pub fn read_only(mut self) -> Attribute {
        self.read_only = true;
        self
    }

    /// Overrides the backend field name.
    pub fn field(mut self, field: impl Into<String>) -> Attribute {
        self.field = Some(field.into());
        self
    }

    /// Excludes the attribute from relational writes.
    pub fn skip_relational(mut self) -> Attribute {
        self.relational = false;
        self
    }

    /// Evaluates the default, invoking function defaults now.
    pub fn default_now(&self) -> Option<Value> {
        match self.default.as_ref()? {
            DefaultValue::Value(value) => Some(value.clone()),
            DefaultValue::Fn(f) => Some(f()),
        }
    }

    /// Returns `true` if a change to `field` recomputes this attribute.
    pub fn watches(&self, field: &str) -> bool {
        match &self.watch {
            Some(Watch::All) => field != self.name,
            Some(Watch::Fields(fields)) => fields.iter().any(|f| f == field),
            None => false,
        }
    }
}

impl AttributeType {
    /// Returns `true` if `value` has this type. `Null` is checked separately
    /// by required-ness.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (AttributeType::Any, _) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Number, v) => v.is_number(),
            (AttributeType::Boolean, Value::Bool(_)) => true,
            (AttributeType::Enum(values), v) => values.contains(v),
            (AttributeType::Map, Value::Map(_)) => true,
            (AttributeType::List, Value::List(_)) => true,
            _ => false,
        }
    }

    /// Coerces a backend value to this type where the conversion is
    /// lossless; anything else is returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (AttributeType::Number, Value::String(s)) => match s.parse::<i64>() {
                Ok(v) => Value::I64(v),
                Err(_) => match s.parse::<f64>() {
                    Ok(v) if v.is_finite() => Value::F64(v),
                    _ => Value::String(s),
                },
            },
            (AttributeType::Number, Value::F64(v)) if v.fract() == 0.0 && v.abs() < 9.0e15 => {
                Value::I64(v as i64)
            }
            (AttributeType::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (AttributeType::String, Value::I64(v)) => Value::String(v.to_string()),
            (_, value) => value,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => f.write_str("string"),
            AttributeType::Number => f.write_str("number"),
            AttributeType::Boolean => f.write_str("boolean"),
            AttributeType::Enum(values) => {
                f.write_str("one of [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", serde_json::Value::from(value.clone()))?;
                }
                f.write_str("]")
            }
            AttributeType::Map => f.write_str("map"),
            AttributeType::List => f.write_str("list"),
            AttributeType::Any => f.write_str("any"),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("required", &self.required)
            .field("default", &self.default.is_some())
            .field("watch", &self.watch)
            .field("hidden", &self.hidden)
            .field("read_only", &self.read_only)
            .field("field", &self.field)
            .field("relational", &self.relational)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}
