use tandem_core::{
    async_trait, err,
    driver::{Relational, Response},
    stmt::{Delete, Expr, Insert, Record, Select, Statement, Update, Value},
    Error, Result,
};

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::{Mutex, PoisonError},
};
use uuid::Uuid;

/// An in-memory relational database interpreting statements directly.
///
/// Columns listed as uuid columns reject non-uuid text the way a typed
/// column would, with an invalid input error. A row's `id` column is
/// unique.
#[derive(Debug, Default)]
pub struct MemoryDb {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    uuid_columns: HashSet<String>,
}

#[async_trait]
impl Relational for MemoryDb {
    async fn exec(&self, stmt: Statement) -> Result<Response> {
        self.check_params(&stmt)?;

        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(stmt.table().to_string()).or_default();

        match stmt {
            Statement::Select(select) => Ok(exec_select(table, select)),
            Statement::Insert(insert) => exec_insert(table, insert),
            Statement::Update(update) => Ok(exec_update(table, update)),
            Statement::Delete(delete) => Ok(exec_delete(table, delete)),
        }
    }
}

impl MemoryDb {
    pub fn with_uuid_columns(columns: &[&str]) -> MemoryDb {
        MemoryDb {
            uuid_columns: columns.iter().map(|column| column.to_string()).collect(),
            ..MemoryDb::default()
        }
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_params(&self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Select(select) => select
                .filter
                .as_ref()
                .map_or(Ok(()), |filter| self.check_expr(filter)),
            Statement::Insert(insert) => insert
                .rows
                .iter()
                .try_for_each(|row| self.check_record(row)),
            Statement::Update(update) => {
                self.check_record(&update.assignments)?;
                self.check_expr(&update.filter)
            }
            Statement::Delete(delete) => self.check_expr(&delete.filter),
        }
    }

    fn check_record(&self, record: &Record) -> Result<()> {
        record
            .iter()
            .try_for_each(|(column, value)| self.check_value(column, value))
    }

    fn check_expr(&self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::And(operands) | Expr::Or(operands) => {
                operands.iter().try_for_each(|e| self.check_expr(e))
            }
            Expr::Not(expr) => self.check_expr(expr),
            Expr::BinaryOp { field, value, .. } | Expr::Contains { field, value } => {
                self.check_value(field, value)
            }
            Expr::Between { field, start, end } => {
                self.check_value(field, start)?;
                self.check_value(field, end)
            }
            Expr::InList { field, values } => {
                values.iter().try_for_each(|v| self.check_value(field, v))
            }
            Expr::BeginsWith { .. } | Expr::IsNull(_) => Ok(()),
        }
    }

    fn check_value(&self, column: &str, value: &Value) -> Result<()> {
        match value {
            Value::String(s) if self.uuid_columns.contains(column) && Uuid::parse_str(s).is_err() => {
                Err(Error::invalid_input(format!(
                    "invalid input syntax for type uuid: \"{s}\""
                )))
            }
            _ => Ok(()),
        }
    }
}

fn exec_select(table: &[Record], select: Select) -> Response {
    let mut rows: Vec<_> = table
        .iter()
        .filter(|row| select.filter.as_ref().map_or(true, |filter| filter.eval(row)))
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        for order_by in &select.order_by {
            let ord = compare(a.get(&order_by.column), b.get(&order_by.column));
            let ord = if order_by.direction.is_asc() {
                ord
            } else {
                ord.reverse()
            };

            if ord != Ordering::Equal {
                return ord;
            }
        }

        Ordering::Equal
    });

    let (offset, limit) = select
        .range
        .map_or((0, usize::MAX), |range| (range.offset, range.limit));

    let rows = rows
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|row| {
            if select.columns.is_empty() {
                row
            } else {
                row.project(select.columns.iter().map(String::as_str))
            }
        })
        .collect();

    Response::records(rows)
}

fn exec_insert(table: &mut Vec<Record>, insert: Insert) -> Result<Response> {
    let mut returned = vec![];

    for row in insert.rows {
        let conflict = match &insert.on_conflict {
            Some(on_conflict) => table.iter().position(|existing| {
                on_conflict
                    .columns
                    .iter()
                    .all(|column| existing.get(column) == row.get(column))
            }),
            None => None,
        };

        match conflict {
            Some(i) => {
                table[i].merge(&row);
                returned.push(table[i].clone());
            }
            None => {
                let duplicate = row.get_present("id").is_some_and(|id| {
                    table.iter().any(|existing| existing.get("id") == Some(id))
                });

                if duplicate {
                    return Err(err!(
                        "duplicate key value violates unique constraint on `{}`",
                        insert.table
                    ));
                }

                table.push(row.clone());
                returned.push(row);
            }
        }
    }

    Ok(if insert.returning {
        Response::records(returned)
    } else {
        Response::count(returned.len() as u64)
    })
}

fn exec_update(table: &mut [Record], update: Update) -> Response {
    let mut returned = vec![];

    for row in table.iter_mut().filter(|row| update.filter.eval(row)) {
        row.merge(&update.assignments);
        returned.push(row.clone());
    }

    if update.returning {
        Response::records(returned)
    } else {
        Response::count(returned.len() as u64)
    }
}

fn exec_delete(table: &mut Vec<Record>, delete: Delete) -> Response {
    let before = table.len();
    table.retain(|row| !delete.filter.eval(row));
    Response::count((before - table.len()) as u64)
}

/// Orders two column values, nulls last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.partial_cmp_value(b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{record, stmt::{Direction, OrderBy}};

    #[tokio::test]
    async fn select_orders_and_windows() {
        let db = MemoryDb::default();
        let rows = vec![
            record! { "id" => "a", "total" => 3 },
            record! { "id" => "b", "total" => 1 },
            record! { "id" => "c", "total" => 2 },
        ];
        db.exec(Insert::new("orders", rows).into()).await.unwrap();

        let select = Select::new("orders")
            .order_by(OrderBy::new("total", Direction::Desc))
            .range(1, 5);
        let rows = db.exec(select.into()).await.unwrap().into_records();

        let ids: Vec<_> = rows.iter().map(|row| row["id"].clone()).collect();
        assert_eq!(ids, [Value::from("c"), Value::from("b")]);
    }

    #[tokio::test]
    async fn uuid_columns_reject_malformed_text() {
        let db = MemoryDb::with_uuid_columns(&["customer_id"]);
        let select = Select::new("orders").filter(Expr::eq("customer_id", "not-a-uuid"));

        let err = db.exec(select.into()).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn upsert_merges_conflicting_rows() {
        let db = MemoryDb::default();
        let insert = |total: i64| {
            Insert::new("orders", vec![record! { "id" => "a", "total" => total }])
                .on_conflict(["id".to_string()])
        };

        db.exec(insert(1).into()).await.unwrap();
        db.exec(insert(2).into()).await.unwrap();

        let rows = db.rows("orders");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["total"], Value::from(2));
    }
}
