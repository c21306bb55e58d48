use indexmap::IndexMap;

/// A dynamically typed attribute value.
///
/// Records hold values keyed by field name. Timestamps travel as strings in
/// their canonical RFC 3339 form (see [`Value::canonical_timestamp`]).
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// String value
    String(String),

    /// A list of values
    List(Vec<Value>),

    /// A string-keyed map of values
    Map(IndexMap<String, Value>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for `null` and for a single-element list holding
    /// `null`, both of which backends use to signal an absent value.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => matches!(&items[..], [Value::Null]),
            _ => false,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::I64(_) | Self::F64(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            Self::F64(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// A short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::I64(_) | Self::F64(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Returns `true` if the string looks like an absolute timestamp
    /// (`YYYY-MM-DDTHH:MM...`). Shape only; the value may still fail to
    /// parse.
    pub fn is_timestamp_like(s: &str) -> bool {
        let b = s.as_bytes();
        b.len() >= 16
            && b[..4].iter().all(u8::is_ascii_digit)
            && b[4] == b'-'
            && b[5..7].iter().all(u8::is_ascii_digit)
            && b[7] == b'-'
            && b[8..10].iter().all(u8::is_ascii_digit)
            && (b[10] == b'T' || b[10] == b' ')
            && b[11..13].iter().all(u8::is_ascii_digit)
            && b[13] == b':'
    }

    /// Re-serializes a timestamp-shaped string in the canonical form
    /// `YYYY-MM-DDTHH:MM:SS.sssZ`. Returns `None` when the string does not
    /// parse as an absolute timestamp.
    pub fn canonical_timestamp(s: &str) -> Option<String> {
        let ts = parse_timestamp(s)?;
        Some(format!("{ts:.3}"))
    }

    /// Parses a string value as an absolute timestamp.
    pub fn as_timestamp(&self) -> Option<jiff::Timestamp> {
        parse_timestamp(self.as_str()?)
    }

    /// Orders two values of compatible types. Numbers compare numerically,
    /// strings lexically; other combinations are unordered.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::I64(a), Value::I64(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Parses an absolute timestamp. Accepts RFC 3339 with an offset, and the
/// `YYYY-MM-DD HH:MM:SS+00` form relational backends emit.
pub(crate) fn parse_timestamp(s: &str) -> Option<jiff::Timestamp> {
    if let Ok(ts) = s.parse::<jiff::Timestamp>() {
        return Some(ts);
    }

    // Postgres renders `+00` without minutes; normalize before retrying.
    let normalized = s.replacen(' ', "T", 1);
    let normalized = match normalized.rfind(['+', '-']) {
        Some(pos) if pos > 10 && normalized.len() - pos == 3 => format!("{normalized}:00"),
        _ => normalized,
    };
    normalized.parse::<jiff::Timestamp>().ok()
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I64(src as i64)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<u32> for Value {
    fn from(src: u32) -> Self {
        Self::I64(src as i64)
    }
}

impl From<usize> for Value {
    fn from(src: usize) -> Self {
        Self::I64(src as i64)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(src: uuid::Uuid) -> Self {
        Self::String(src.to_string())
    }
}

impl From<jiff::Timestamp> for Value {
    fn from(src: jiff::Timestamp) -> Self {
        Self::String(format!("{src:.3}"))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        match src {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(src: Vec<T>) -> Self {
        Self::List(src.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(src: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match src {
            J::Null => Value::Null,
            J::Bool(v) => Value::Bool(v),
            J::Number(n) => match n.as_i64() {
                Some(v) => Value::I64(v),
                None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(v) => Value::String(v),
            J::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            J::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(src: Value) -> Self {
        use serde_json::Value as J;

        match src {
            Value::Null => J::Null,
            Value::Bool(v) => J::Bool(v),
            Value::I64(v) => J::from(v),
            Value::F64(v) => serde_json::Number::from_f64(v)
                .map(J::Number)
                .unwrap_or(J::Null),
            Value::String(v) => J::String(v),
            Value::List(items) => J::Array(items.into_iter().map(Into::into).collect()),
            Value::Map(map) => J::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Conversion from a [`Value`] into a Rust type. Used by typed accessors.
pub trait FromValue: Sized {
    /// The attribute types this Rust type can be bound to.
    fn accepts(ty: &crate::schema::AttributeType) -> bool;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for String {
    fn accepts(ty: &crate::schema::AttributeType) -> bool {
        use crate::schema::AttributeType::*;
        matches!(ty, String | Enum(_) | Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn accepts(ty: &crate::schema::AttributeType) -> bool {
        use crate::schema::AttributeType::*;
        matches!(ty, Number | Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn accepts(ty: &crate::schema::AttributeType) -> bool {
        use crate::schema::AttributeType::*;
        matches!(ty, Number | Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn accepts(ty: &crate::schema::AttributeType) -> bool {
        use crate::schema::AttributeType::*;
        matches!(ty, Boolean | Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for Vec<Value> {
    fn accepts(ty: &crate::schema::AttributeType) -> bool {
        use crate::schema::AttributeType::*;
        matches!(ty, List | Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn accepts(_: &crate::schema::AttributeType) -> bool {
        true
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}
