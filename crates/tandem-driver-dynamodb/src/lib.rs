mod op;
mod value;

pub(crate) use value::Value;

use tandem_core::{
    async_trait,
    driver::{operation::Operation, EntityBinding, IndexedStore, Response},
    stmt::{self, Expr},
    Error, Result,
};

use aws_sdk_dynamodb::{
    types::{AttributeValue, DeleteRequest, KeysAndAttributes, PutRequest, WriteRequest},
    Client,
};
use std::collections::HashMap;
use url::Url;

/// DynamoDB limits a `BatchWriteItem` call to 25 requests.
const BATCH_WRITE_LIMIT: usize = 25;

/// DynamoDB limits a `BatchGetItem` call to 100 keys.
const BATCH_GET_LIMIT: usize = 100;

/// Indexed store backed by DynamoDB.
///
/// Every entity lives in its own table keyed by `pk`/`sk`, with one global
/// secondary index `gsi<n>` per secondary schema index.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    /// Handle to the AWS SDK client
    client: Client,
}

impl DynamoDb {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to `dynamodb://host:port`.
    pub async fn connect(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(Error::driver)?;

        if url.scheme() != "dynamodb" {
            return Err(Error::invalid_argument(format!(
                "connection URL does not have a `dynamodb` scheme; url={url}"
            )));
        }

        use aws_config::BehaviorVersion;
        use aws_sdk_dynamodb::config::Credentials;

        let mut aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region("us-east-1")
            .credentials_provider(Credentials::for_tests());

        if let Some(host) = url.host() {
            let mut endpoint_url = format!("http://{host}");

            if let Some(port) = url.port() {
                endpoint_url.push_str(&format!(":{port}"));
            }

            aws_config = aws_config.endpoint_url(&endpoint_url);
        }

        let sdk_config = aws_config.load().await;

        Ok(Self::new(Client::new(&sdk_config)))
    }

    /// Connects with the ambient AWS configuration.
    pub async fn from_env() -> Result<Self> {
        let sdk_config = aws_config::load_from_env().await;
        Ok(Self::new(Client::new(&sdk_config)))
    }
}

#[async_trait]
impl IndexedStore for DynamoDb {
    async fn exec(&self, binding: &EntityBinding, op: Operation) -> Result<Response> {
        match op {
            Operation::BatchGet(op) => self.exec_batch_get(binding, op).await,
            Operation::DeleteMany(op) => self.exec_delete_many(binding, op).await,
            Operation::Patch(op) => self.exec_patch(binding, op).await,
            Operation::Put(op) => self.exec_put(binding, op).await,
            Operation::PutMany(op) => self.exec_put_many(binding, op).await,
            Operation::Query(op) => self.exec_query(binding, op).await,
        }
    }
}

/// Converts a record to a DynamoDB item. Null fields are left out.
fn ddb_item(record: &stmt::Record) -> HashMap<String, AttributeValue> {
    record
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(field, value)| (field.to_string(), Value::from(value.clone()).to_ddb()))
        .collect()
}

/// Converts a DynamoDB item to a record, dropping the composite key
/// attributes.
fn item_to_record(
    binding: &EntityBinding,
    item: &HashMap<String, AttributeValue>,
) -> Result<stmt::Record> {
    let mut record = stmt::Record::new();

    for (name, value) in item {
        record.insert(name, Value::from_ddb(value)?.into_inner());
    }

    binding.strip_keys(&mut record);
    Ok(record)
}

/// The table key of an item, as a string for matching unprocessed requests
/// back to their inputs.
fn key_string(binding: &EntityBinding, item: &HashMap<String, AttributeValue>) -> String {
    let primary = binding.primary();

    [&primary.pk_attr, &primary.sk_attr]
        .into_iter()
        .filter_map(|attr| item.get(attr.as_str())?.as_s().ok().cloned())
        .collect::<Vec<_>>()
        .join("|")
}

fn put_request(item: HashMap<String, AttributeValue>) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(item))
        .build()
        .map_err(Error::driver)?;

    Ok(WriteRequest::builder().put_request(put).build())
}

fn delete_request(key: HashMap<String, AttributeValue>) -> Result<WriteRequest> {
    let delete = DeleteRequest::builder()
        .set_key(Some(key))
        .build()
        .map_err(Error::driver)?;

    Ok(WriteRequest::builder().delete_request(delete).build())
}

fn keys_and_attributes(
    keys: Vec<HashMap<String, AttributeValue>>,
    projection: Option<String>,
    names: HashMap<String, String>,
) -> Result<KeysAndAttributes> {
    KeysAndAttributes::builder()
        .set_keys(Some(keys))
        .set_projection_expression(projection)
        .set_expression_attribute_names((!names.is_empty()).then_some(names))
        .build()
        .map_err(Error::driver)
}

/// Renders a predicate as a DynamoDB condition expression, registering
/// attribute names and values in `attrs`.
///
/// `pk_attr` is an attribute every item carries; predicates with a constant
/// truth value are expressed through it.
fn ddb_expression(attrs: &mut ExprAttrs, pk_attr: &str, expr: &Expr) -> String {
    match expr {
        Expr::And(operands) if operands.is_empty() => {
            format!("attribute_exists({})", attrs.name(pk_attr))
        }
        Expr::Or(operands) if operands.is_empty() => {
            format!("attribute_not_exists({})", attrs.name(pk_attr))
        }
        Expr::And(operands) | Expr::Or(operands) => {
            let sep = if matches!(expr, Expr::And(_)) {
                " AND "
            } else {
                " OR "
            };

            operands
                .iter()
                .map(|operand| format!("({})", ddb_expression(attrs, pk_attr, operand)))
                .collect::<Vec<_>>()
                .join(sep)
        }
        Expr::Not(expr) => format!("NOT ({})", ddb_expression(attrs, pk_attr, expr)),
        Expr::BinaryOp { field, op, value } => {
            let name = attrs.name(field);

            match (op, value) {
                (stmt::BinaryOp::Eq, stmt::Value::Null) => format!("attribute_not_exists({name})"),
                (stmt::BinaryOp::Ne, stmt::Value::Null) => format!("attribute_exists({name})"),
                (op, value) => format!("{name} {} {}", op.as_str(), attrs.value(value)),
            }
        }
        Expr::Between { field, start, end } => {
            let name = attrs.name(field);
            let start = attrs.value(start);
            let end = attrs.value(end);
            format!("{name} BETWEEN {start} AND {end}")
        }
        Expr::InList { values, .. } if values.is_empty() => {
            format!("attribute_not_exists({})", attrs.name(pk_attr))
        }
        Expr::InList { field, values } => {
            let name = attrs.name(field);
            let values = values
                .iter()
                .map(|value| attrs.value(value))
                .collect::<Vec<_>>();
            format!("{name} IN ({})", values.join(", "))
        }
        Expr::BeginsWith { field, prefix } => {
            let name = attrs.name(field);
            let prefix = attrs.value(&stmt::Value::from(prefix.as_str()));
            format!("begins_with({name}, {prefix})")
        }
        Expr::Contains { field, value } => {
            let name = attrs.name(field);
            format!("contains({name}, {})", attrs.value(value))
        }
        Expr::IsNull(field) => format!("attribute_not_exists({})", attrs.name(field)),
    }
}

/// Placeholder names and values of one request's expressions.
#[derive(Default)]
struct ExprAttrs {
    names: HashMap<String, String>,
    attr_names: HashMap<String, String>,
    attr_values: HashMap<String, AttributeValue>,
}

impl ExprAttrs {
    fn name(&mut self, attribute: &str) -> String {
        use std::collections::hash_map::Entry;

        let next = self.names.len();

        match self.names.entry(attribute.to_string()) {
            Entry::Vacant(e) => {
                let name = format!("#n_{next}");
                self.attr_names.insert(name.clone(), attribute.to_string());
                e.insert(name).clone()
            }
            Entry::Occupied(e) => e.get().clone(),
        }
    }

    fn value(&mut self, val: &stmt::Value) -> String {
        self.ddb_value(Value::from(val.clone()).to_ddb())
    }

    fn ddb_value(&mut self, val: AttributeValue) -> String {
        let i = self.attr_values.len();
        let name = format!(":v_{i}");
        self.attr_values.insert(name.clone(), val);
        name
    }

    fn split(self) -> (Option<HashMap<String, String>>, Option<HashMap<String, AttributeValue>>) {
        let values = (!self.attr_values.is_empty()).then_some(self.attr_values);
        let names = (!self.attr_names.is_empty()).then_some(self.attr_names);
        (names, values)
    }
}
