use tandem_core::stmt;

use postgres_types::{private::BytesMut, to_sql_checked, IsNull, ToSql, Type};
use std::{error::Error as StdError, fmt, time::SystemTime};

type BoxError = Box<dyn StdError + Sync + Send>;

#[derive(Debug)]
pub struct Value(pub(crate) stmt::Value);

impl From<stmt::Value> for Value {
    fn from(value: stmt::Value) -> Self {
        Self(value)
    }
}

/// A parameter that cannot be represented as the column type PostgreSQL
/// inferred for it.
#[derive(Debug)]
pub struct InvalidParam {
    message: String,
}

impl InvalidParam {
    fn new(value: &stmt::Value, ty: &Type) -> BoxError {
        Box::new(InvalidParam {
            message: format!("cannot use {} value {value:?} as `{ty}`", value.type_name()),
        })
    }
}

impl fmt::Display for InvalidParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for InvalidParam {}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        let value = &self.0;

        // JSON columns take any value as-is
        if *ty == Type::JSON || *ty == Type::JSONB {
            return serde_json::Value::from(value.clone()).to_sql(ty, out);
        }

        match value {
            stmt::Value::Null => Ok(IsNull::Yes),
            stmt::Value::Bool(v) => v.to_sql(ty, out),
            stmt::Value::I64(v) => match *ty {
                Type::INT2 => i16::try_from(*v)
                    .map_err(|_| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)
                    .map_err(|_| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::TIMESTAMPTZ | Type::TIMESTAMP => {
                    let ts = jiff::Timestamp::from_millisecond(*v)
                        .map_err(|_| InvalidParam::new(value, ty))?;
                    SystemTime::from(ts).to_sql(ty, out)
                }
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => Err(InvalidParam::new(value, ty)),
            },
            stmt::Value::F64(v) => match *ty {
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::INT8 if v.fract() == 0.0 => (*v as i64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => Err(InvalidParam::new(value, ty)),
            },
            stmt::Value::String(v) => match *ty {
                Type::UUID => uuid::Uuid::parse_str(v)
                    .map_err(|_| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                Type::TIMESTAMPTZ | Type::TIMESTAMP => {
                    let ts = v
                        .parse::<jiff::Timestamp>()
                        .map_err(|_| InvalidParam::new(value, ty))?;
                    SystemTime::from(ts).to_sql(ty, out)
                }
                Type::INT8 => v
                    .parse::<i64>()
                    .map_err(|_| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                Type::INT4 => v
                    .parse::<i32>()
                    .map_err(|_| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            stmt::Value::List(items) => match *ty {
                Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| InvalidParam::new(value, ty))?
                    .to_sql(ty, out),
                _ => Err(InvalidParam::new(value, ty)),
            },
            stmt::Value::Map(_) => Err(InvalidParam::new(value, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
