use crate::stmt::Record;

#[derive(Debug, Default)]
pub struct Response {
    pub rows: Rows,

    /// Continuation token when more results are available.
    pub cursor: Option<String>,

    /// Items or keys the backend did not process (throttled batch calls).
    pub unprocessed: Vec<Record>,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Records returned by the operation
    Records(Vec<Record>),
}

impl Default for Rows {
    fn default() -> Self {
        Rows::Records(vec![])
    }
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
            ..Default::default()
        }
    }

    pub fn records(records: Vec<Record>) -> Self {
        Self {
            rows: Rows::Records(records),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_unprocessed(mut self, unprocessed: Vec<Record>) -> Self {
        self.unprocessed = unprocessed;
        self
    }

    /// Consumes the response, returning its records. A count response
    /// yields no records.
    pub fn into_records(self) -> Vec<Record> {
        match self.rows {
            Rows::Records(records) => records,
            Rows::Count(_) => vec![],
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_records(&self) -> bool {
        matches!(self, Self::Records(_))
    }

    /// Number of impacted rows, or number of returned records.
    pub fn len(&self) -> u64 {
        match self {
            Rows::Count(count) => *count,
            Rows::Records(records) => records.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
