use super::*;

use base64::{engine::general_purpose::STANDARD, Engine as _};

impl DynamoDb {
    pub(crate) async fn exec_query(
        &self,
        binding: &EntityBinding,
        op: operation::Query,
    ) -> Result<Response> {
        let index = match &op.index {
            Some(name) => Some(
                binding
                    .index(name)
                    .ok_or_else(|| Error::index_not_found(&binding.entity, name))?,
            ),
            None => None,
        };

        // An index is only queried when every partition segment is supplied.
        // Anything else scans the entity's items.
        let keyed = index.and_then(|index| {
            let pk = index.pk_value(&binding.entity, &op.keys)?;
            Some((index, pk))
        });

        let pk_attr = &binding.primary().pk_attr;
        let mut attrs = ExprAttrs::default();
        let mut filters = vec![];

        let key_condition = match &keyed {
            Some((index, pk)) => {
                let covered: HashSet<_> = index.covered_fields(&op.keys).collect();

                for (field, value) in op.keys.iter() {
                    if !covered.contains(field) {
                        filters.push(Expr::eq(field, value.clone()));
                    }
                }

                let name = attrs.name(&index.pk_attr);
                let value = attrs.value(&pk.as_str().into());
                let mut condition = format!("{name} = {value}");

                if let Some((sk, exact)) = index.sk_condition(&binding.entity, &op.keys) {
                    let name = attrs.name(&index.sk_attr);
                    let value = attrs.value(&sk.into());

                    if exact {
                        condition.push_str(&format!(" AND {name} = {value}"));
                    } else {
                        condition.push_str(&format!(" AND begins_with({name}, {value})"));
                    }
                }

                Some(condition)
            }
            None => {
                filters.push(Expr::begins_with(pk_attr, binding.entity_prefix()));

                for (field, value) in op.keys.iter() {
                    filters.push(Expr::eq(field, value.clone()));
                }

                None
            }
        };

        if let Some(between) = &op.between {
            filters.push(between.to_expr());
        }

        if let Some(filter) = &op.filter {
            filters.push(filter.clone());
        }

        let filter = match filters.len() {
            0 => None,
            1 => Some(ddb_expression(&mut attrs, pk_attr, &filters[0])),
            _ => Some(ddb_expression(&mut attrs, pk_attr, &Expr::and(filters))),
        };

        let projection = (!op.attributes.is_empty()).then(|| {
            op.attributes
                .iter()
                .map(|attribute| attrs.name(attribute))
                .collect::<Vec<_>>()
                .join(", ")
        });

        let (names, values) = attrs.split();
        let limit = op.limit.map(|limit| i32::try_from(limit).unwrap_or(i32::MAX));
        let start_key = op.cursor.as_deref().and_then(decode_cursor);

        let (items, last_key) = match (keyed, key_condition) {
            (Some((index, _)), Some(key_condition)) => {
                let res = self
                    .client
                    .query()
                    .table_name(&binding.table)
                    .set_index_name(index.native.clone())
                    .key_condition_expression(key_condition)
                    .set_filter_expression(filter)
                    .set_projection_expression(projection)
                    .set_expression_attribute_names(names)
                    .set_expression_attribute_values(values)
                    .scan_index_forward(op.order.is_asc())
                    .set_limit(limit)
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map_err(Error::driver)?;

                (res.items, res.last_evaluated_key)
            }
            _ => {
                let res = self
                    .client
                    .scan()
                    .table_name(&binding.table)
                    .set_filter_expression(filter)
                    .set_projection_expression(projection)
                    .set_expression_attribute_names(names)
                    .set_expression_attribute_values(values)
                    .set_limit(limit)
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map_err(Error::driver)?;

                (res.items, res.last_evaluated_key)
            }
        };

        let records = items
            .unwrap_or_default()
            .iter()
            .map(|item| item_to_record(binding, item))
            .collect::<Result<Vec<_>>>()?;

        let cursor = last_key.filter(|key| !key.is_empty()).map(|key| encode_cursor(&key));

        Ok(Response::records(records).with_cursor(cursor))
    }
}

/// Encodes a `LastEvaluatedKey` as an opaque token. Key attributes are
/// always strings.
fn encode_cursor(key: &HashMap<String, AttributeValue>) -> String {
    let json: serde_json::Map<String, serde_json::Value> = key
        .iter()
        .filter_map(|(name, value)| Some((name.clone(), value.as_s().ok()?.clone().into())))
        .collect();

    STANDARD.encode(serde_json::Value::Object(json).to_string())
}

/// Tokens that do not decode start from the first page.
fn decode_cursor(token: &str) -> Option<HashMap<String, AttributeValue>> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    let key: HashMap<String, String> = serde_json::from_slice(&bytes).ok()?;

    (!key.is_empty()).then(|| {
        key.into_iter()
            .map(|(name, value)| (name, AttributeValue::S(value)))
            .collect()
    })
}
