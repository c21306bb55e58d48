use super::{Comma, Formatter, Ident, Params, ToSql};

use tandem_core::stmt::{Delete, Insert, OrderBy, Record, Select, Statement, Update, Value};

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "SELECT ");

        if self.columns.is_empty() {
            fmt!(f, "*");
        } else {
            fmt!(f, Comma(self.columns.iter().map(Ident)));
        }

        fmt!(f, " FROM " Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }

        if let Some(range) = &self.range {
            fmt!(f, " LIMIT " range.limit " OFFSET " range.offset);
        }
    }
}

impl ToSql for &OrderBy {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let direction = if self.direction.is_asc() { " ASC" } else { " DESC" };
        fmt!(f, Ident(&self.column) direction);
    }
}

/// One row of a multi-row `VALUES` list, aligned on the statement's columns.
struct Row<'a> {
    columns: &'a [&'a str],
    record: &'a Record,
}

impl ToSql for Row<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let record = self.record;
        let values = self.columns.iter().map(|column| RowValue(record.get(column)));
        fmt!(f, "(" Comma(values) ")");
    }
}

struct RowValue<'a>(Option<&'a Value>);

impl ToSql for RowValue<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.0 {
            Some(value) => fmt!(f, value),
            None => fmt!(f, "DEFAULT"),
        }
    }
}

/// `"column" = EXCLUDED."column"`
struct Excluded<'a>(&'a str);

impl ToSql for Excluded<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = EXCLUDED." Ident(self.0));
    }
}

impl ToSql for &Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let columns = self.columns();
        let rows = self.rows.iter().map(|record| Row {
            columns: &columns,
            record,
        });

        fmt!(
            f,
            "INSERT INTO " Ident(&self.table)
            " (" Comma(columns.iter().map(Ident)) ") VALUES " Comma(rows)
        );

        if let Some(on_conflict) = &self.on_conflict {
            fmt!(f, " ON CONFLICT (" Comma(on_conflict.columns.iter().map(Ident)) ")");

            let updates: Vec<_> = columns
                .iter()
                .filter(|column| !on_conflict.columns.iter().any(|c| c == *column))
                .map(|column| Excluded(column))
                .collect();

            if updates.is_empty() {
                fmt!(f, " DO NOTHING");
            } else {
                fmt!(f, " DO UPDATE SET " Comma(updates));
            }
        }

        if self.returning {
            fmt!(f, " RETURNING *");
        }
    }
}

/// `"column" = $n`
struct Assignment<'a>(&'a str, &'a Value);

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1);
    }
}

impl ToSql for &Update {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let assignments = self
            .assignments
            .iter()
            .map(|(column, value)| Assignment(column, value));

        let filter = &self.filter;

        fmt!(
            f,
            "UPDATE " Ident(&self.table) " SET " Comma(assignments) " WHERE " filter
        );

        if self.returning {
            fmt!(f, " RETURNING *");
        }
    }
}

impl ToSql for &Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let filter = &self.filter;
        fmt!(f, "DELETE FROM " Ident(&self.table) " WHERE " filter);
    }
}
