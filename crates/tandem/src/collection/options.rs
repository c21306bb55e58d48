use crate::{Error, Result};

use tandem_core::{
    driver::operation::Between,
    stmt::{Direction, Expr, Value},
};

/// Options accepted by every read.
///
/// Either build them with the chained setters or parse them from JSON with
/// [`TryFrom<&serde_json::Value>`], which rejects ill-typed options before any
/// backend I/O.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Index to query. Resolved from the supplied keys when unset.
    pub index: Option<String>,

    /// Fixed page size. Unset fetches every page.
    pub limit: Option<usize>,

    /// Fields to return. Empty returns every field.
    pub attributes: Vec<String>,

    /// Resume from a cursor returned by an earlier page.
    pub cursor: Option<String>,

    pub order: Direction,

    /// Inclusive range on one attribute.
    pub between: Option<Between>,

    /// Caller predicate over model fields.
    pub filter: Option<Expr>,

    /// Keep fetching pages even though `limit` is set.
    pub fetch_all_pages: bool,

    /// Report the continuation cursor.
    pub return_cursor: bool,

    /// Wrap the result with pagination metadata.
    pub return_metadata: bool,
}

impl QueryOptions {
    pub fn new() -> QueryOptions {
        QueryOptions::default()
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn attributes<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn order(mut self, order: Direction) -> Self {
        self.order = order;
        self
    }

    pub fn between(
        mut self,
        attribute: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.between = Some(Between {
            field: attribute.into(),
            start: start.into(),
            end: end.into(),
        });
        self
    }

    /// Adds a predicate, `AND`ed with any existing one.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
        self
    }

    pub fn fetch_all_pages(mut self) -> Self {
        self.fetch_all_pages = true;
        self
    }

    pub fn return_cursor(mut self) -> Self {
        self.return_cursor = true;
        self
    }

    pub fn return_metadata(mut self) -> Self {
        self.return_metadata = true;
        self
    }

    /// Returns `true` if every page should be fetched.
    pub(crate) fn fetches_all(&self) -> bool {
        self.limit.is_none() || self.fetch_all_pages
    }

    /// Returns `true` if the caller asked for pagination state explicitly, in
    /// which case truncation is expected and not worth a warning.
    pub(crate) fn expects_truncation(&self) -> bool {
        self.fetch_all_pages || self.return_cursor || self.return_metadata
    }
}

impl TryFrom<&serde_json::Value> for QueryOptions {
    type Error = Error;

    fn try_from(json: &serde_json::Value) -> Result<QueryOptions> {
        let serde_json::Value::Object(map) = json else {
            return Err(Error::invalid_argument("query options must be an object"));
        };

        let mut options = QueryOptions::default();

        for (key, value) in map {
            match key.as_str() {
                "index" => options.index = optional_string(key, value)?,
                "cursor" => options.cursor = optional_string(key, value)?,
                "limit" => {
                    options.limit = match value {
                        serde_json::Value::Null => None,
                        value => Some(
                            value
                                .as_u64()
                                .and_then(|n| usize::try_from(n).ok())
                                .ok_or_else(|| type_error(key, "a non-negative integer", value))?,
                        ),
                    }
                }
                "attributes" => {
                    let items = value
                        .as_array()
                        .ok_or_else(|| type_error(key, "an array of strings", value))?;

                    options.attributes = items
                        .iter()
                        .map(|item| {
                            item.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| type_error(key, "an array of strings", value))
                        })
                        .collect::<Result<_>>()?;
                }
                "order" => {
                    options.order = value
                        .as_str()
                        .ok_or_else(|| type_error(key, "\"asc\" or \"desc\"", value))?
                        .parse()?;
                }
                "between" => {
                    let attribute = value.get("attribute").and_then(|v| v.as_str());
                    let (Some(attribute), Some(start), Some(end)) =
                        (attribute, value.get("start"), value.get("end"))
                    else {
                        return Err(type_error(key, "{ attribute, start, end }", value));
                    };

                    options.between = Some(Between {
                        field: attribute.to_string(),
                        start: start.clone().into(),
                        end: end.clone().into(),
                    });
                }
                "fetchAllPages" => options.fetch_all_pages = boolean(key, value)?,
                "returnCursor" => options.return_cursor = boolean(key, value)?,
                "returnMetadata" => options.return_metadata = boolean(key, value)?,
                _ => {
                    return Err(Error::invalid_argument(format!(
                        "unknown query option `{key}`"
                    )))
                }
            }
        }

        Ok(options)
    }
}

fn type_error(key: &str, expected: &str, value: &serde_json::Value) -> Error {
    Error::invalid_argument(format!("`{key}` must be {expected}; got {value}"))
}

fn boolean(key: &str, value: &serde_json::Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| type_error(key, "a boolean", value))
}

fn optional_string(key: &str, value: &serde_json::Value) -> Result<Option<String>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        value => Err(type_error(key, "a string", value)),
    }
}
