use super::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,

    /// Rows to insert, keyed by column name. Rows may name different
    /// columns; missing columns take the column default.
    pub rows: Vec<Record>,

    /// When set, conflicting rows are updated instead (upsert).
    pub on_conflict: Option<OnConflict>,

    pub returning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnConflict {
    pub columns: Vec<String>,
}

impl Insert {
    pub fn new(table: impl Into<String>, rows: Vec<Record>) -> Insert {
        Insert {
            table: table.into(),
            rows,
            on_conflict: None,
            returning: true,
        }
    }

    pub fn on_conflict(mut self, columns: impl IntoIterator<Item = String>) -> Insert {
        self.on_conflict = Some(OnConflict {
            columns: columns.into_iter().collect(),
        });
        self
    }

    /// Every column named by at least one row, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = vec![];
        for row in &self.rows {
            for field in row.fields() {
                if !columns.contains(&field) {
                    columns.push(field);
                }
            }
        }
        columns
    }
}
