use tandem_core::{stmt, Error, Result};

use aws_sdk_dynamodb::types::AttributeValue;

#[derive(Debug)]
pub struct Value(stmt::Value);

impl From<stmt::Value> for Value {
    fn from(value: stmt::Value) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this DynamoDB driver value into the core value.
    pub fn into_inner(self) -> stmt::Value {
        self.0
    }

    /// Converts a DynamoDB AttributeValue to a core value.
    pub fn from_ddb(val: &AttributeValue) -> Result<Self> {
        use AttributeValue as AV;

        let core_value = match val {
            AV::Null(_) => stmt::Value::Null,
            AV::Bool(val) => stmt::Value::Bool(*val),
            AV::S(val) => stmt::Value::String(val.clone()),
            AV::N(val) => parse_number(val)?,
            AV::L(items) => stmt::Value::List(
                items
                    .iter()
                    .map(|item| Ok(Value::from_ddb(item)?.0))
                    .collect::<Result<_>>()?,
            ),
            AV::M(map) => stmt::Value::Map(
                map.iter()
                    .map(|(key, item)| Ok((key.clone(), Value::from_ddb(item)?.0)))
                    .collect::<Result<_>>()?,
            ),
            AV::Ss(items) => stmt::Value::List(items.iter().map(stmt::Value::from).collect()),
            AV::Ns(items) => stmt::Value::List(
                items
                    .iter()
                    .map(|item| parse_number(item))
                    .collect::<Result<_>>()?,
            ),
            _ => {
                return Err(Error::invalid_result(format!(
                    "unsupported DynamoDB attribute value; value={val:?}"
                )))
            }
        };

        Ok(Value(core_value))
    }

    /// Converts this value to a DynamoDB AttributeValue.
    pub fn to_ddb(&self) -> AttributeValue {
        use AttributeValue as AV;

        match &self.0 {
            stmt::Value::Null => AV::Null(true),
            stmt::Value::Bool(val) => AV::Bool(*val),
            stmt::Value::I64(val) => AV::N(val.to_string()),
            stmt::Value::F64(val) => AV::N(val.to_string()),
            stmt::Value::String(val) => AV::S(val.to_string()),
            stmt::Value::List(vals) => {
                AV::L(vals.iter().map(|val| Value(val.clone()).to_ddb()).collect())
            }
            stmt::Value::Map(map) => AV::M(
                map.iter()
                    .map(|(key, val)| (key.clone(), Value(val.clone()).to_ddb()))
                    .collect(),
            ),
        }
    }
}

fn parse_number(val: &str) -> Result<stmt::Value> {
    if let Ok(n) = val.parse::<i64>() {
        return Ok(stmt::Value::I64(n));
    }

    val.parse::<f64>()
        .map(stmt::Value::F64)
        .map_err(|_| Error::invalid_result(format!("invalid DynamoDB number `{val}`")))
}
