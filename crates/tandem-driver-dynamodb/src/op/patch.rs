use super::*;

use aws_sdk_dynamodb::types::ReturnValue;

impl DynamoDb {
    pub(crate) async fn exec_patch(
        &self,
        binding: &EntityBinding,
        op: operation::Patch,
    ) -> Result<Response> {
        let key = ddb_item(&binding.primary_key(&op.key)?);

        if op.set.is_empty() {
            let res = self
                .client
                .get_item()
                .table_name(&binding.table)
                .set_key(Some(key))
                .consistent_read(true)
                .send()
                .await
                .map_err(Error::driver)?;

            return match res.item {
                Some(item) => Ok(Response::records(vec![item_to_record(binding, &item)?])),
                None => Ok(Response::empty()),
            };
        }

        let mut merged = op.key.clone();
        merged.merge(&op.set);

        let mut assignments = op.set;

        // Secondary composite keys follow their segments. An index losing a
        // segment drops out of the item.
        for index in binding.indexes.iter().filter(|index| !index.primary) {
            if !index.segments().any(|field| assignments.contains(field)) {
                continue;
            }

            match (
                index.pk_value(&binding.entity, &merged),
                index.sk_value(&binding.entity, &merged),
            ) {
                (Some(pk), Some(sk)) => {
                    assignments.insert(&index.pk_attr, pk);
                    assignments.insert(&index.sk_attr, sk);
                }
                _ => {
                    assignments.insert(&index.pk_attr, tandem_core::stmt::Value::Null);
                    assignments.insert(&index.sk_attr, tandem_core::stmt::Value::Null);
                }
            }
        }

        let mut attrs = ExprAttrs::default();
        let mut sets = vec![];
        let mut removes = vec![];

        for (field, value) in assignments.iter() {
            let name = attrs.name(field);

            if value.is_null() {
                removes.push(name);
            } else {
                let value = attrs.value(value);
                sets.push(format!("{name} = {value}"));
            }
        }

        let mut update = vec![];
        if !sets.is_empty() {
            update.push(format!("SET {}", sets.join(", ")));
        }
        if !removes.is_empty() {
            update.push(format!("REMOVE {}", removes.join(", ")));
        }

        let condition = format!(
            "attribute_exists({})",
            attrs.name(&binding.primary().pk_attr)
        );
        let (names, values) = attrs.split();

        let res = self
            .client
            .update_item()
            .table_name(&binding.table)
            .set_key(Some(key))
            .update_expression(update.join(" "))
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match res {
            Ok(output) => match output.attributes {
                Some(item) => Ok(Response::records(vec![item_to_record(binding, &item)?])),
                None => Ok(Response::empty()),
            },
            // The item does not exist
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Ok(Response::empty())
            }
            Err(err) => Err(Error::driver(err)),
        }
    }
}
