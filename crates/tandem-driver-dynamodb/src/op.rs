mod batch_get;
mod delete_many;
mod patch;
mod put;
mod put_many;
mod query;

use super::{
    ddb_expression, ddb_item, delete_request, item_to_record, key_string, keys_and_attributes,
    put_request, DynamoDb, ExprAttrs, BATCH_GET_LIMIT, BATCH_WRITE_LIMIT,
};
use tandem_core::{
    driver::{operation, EntityBinding, Response},
    stmt::{Expr, Record},
    Error, Result,
};

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{HashMap, HashSet};

/// Pairs each input with the table key it addresses, dropping inputs whose
/// key was already seen. DynamoDB rejects batches naming one key twice.
fn dedup_by_key<'a>(
    binding: &EntityBinding,
    pending: impl IntoIterator<Item = (HashMap<String, AttributeValue>, &'a Record)>,
) -> Vec<(String, HashMap<String, AttributeValue>, &'a Record)> {
    let mut seen = HashSet::new();

    pending
        .into_iter()
        .filter_map(|(item, record)| {
            let key = key_string(binding, &item);
            seen.insert(key.clone()).then_some((key, item, record))
        })
        .collect()
}
