#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod expr;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

mod statement;

use tandem_core::stmt::Statement;

/// Serializes a statement to PostgreSQL text with `$n` placeholders.
#[derive(Debug, Default)]
pub struct Serializer {
    _priv: (),
}

struct Formatter<'a, T> {
    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn postgresql() -> Serializer {
        Serializer::default()
    }

    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret
    }

    /// Serializes a statement so that every returned row arrives as one
    /// JSON text column. Statements returning a count serialize unchanged.
    pub fn serialize_json(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let sql = self.serialize(stmt, params);

        if stmt.returns_records() {
            format!("WITH q AS ({sql}) SELECT row_to_json(q)::text FROM q")
        } else {
            sql
        }
    }
}
