use super::*;

impl DynamoDb {
    pub(crate) async fn exec_put(
        &self,
        binding: &EntityBinding,
        op: operation::Put,
    ) -> Result<Response> {
        let mut item = op.item;
        let keys = binding.composite_keys(&item)?;
        item.merge(&keys);

        let mut attrs = ExprAttrs::default();

        let condition = match op.mode {
            operation::PutMode::Create => Some(format!(
                "attribute_not_exists({})",
                attrs.name(&binding.primary().pk_attr)
            )),
            operation::PutMode::Upsert => None,
        };

        let (names, _) = attrs.split();

        let res = self
            .client
            .put_item()
            .table_name(&binding.table)
            .set_item(Some(ddb_item(&item)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(names)
            .send()
            .await;

        if let Err(err) = res {
            if err
                .as_service_error()
                .is_some_and(|e| e.is_conditional_check_failed_exception())
            {
                return Err(Error::condition_failed(format!(
                    "{} with this key already exists",
                    binding.entity
                )));
            }

            return Err(Error::driver(err));
        }

        binding.strip_keys(&mut item);
        Ok(Response::records(vec![item]))
    }
}
