use super::*;

impl DynamoDb {
    pub(crate) async fn exec_batch_get(
        &self,
        binding: &EntityBinding,
        op: operation::BatchGet,
    ) -> Result<Response> {
        let mut records = vec![];
        let mut unprocessed = vec![];

        for chunk in op.keys.chunks(BATCH_GET_LIMIT) {
            let keys = chunk
                .iter()
                .map(|key| Ok((ddb_item(&binding.primary_key(key)?), key)))
                .collect::<Result<Vec<_>>>()?;

            let pending = dedup_by_key(binding, keys);

            let mut attrs = ExprAttrs::default();
            let projection = (!op.attributes.is_empty()).then(|| {
                op.attributes
                    .iter()
                    .map(|attribute| attrs.name(attribute))
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            let (names, _) = attrs.split();

            let request = keys_and_attributes(
                pending.iter().map(|(_, key, _)| key.clone()).collect(),
                projection,
                names.unwrap_or_default(),
            )?;

            let res = self
                .client
                .batch_get_item()
                .request_items(&binding.table, request)
                .send()
                .await
                .map_err(Error::driver)?;

            for item in res
                .responses
                .and_then(|mut tables| tables.remove(&binding.table))
                .unwrap_or_default()
            {
                records.push(item_to_record(binding, &item)?);
            }

            let failed: HashSet<_> = res
                .unprocessed_keys
                .and_then(|mut tables| tables.remove(&binding.table))
                .map(|request| request.keys)
                .unwrap_or_default()
                .iter()
                .map(|key| key_string(binding, key))
                .collect();

            unprocessed.extend(
                pending
                    .into_iter()
                    .filter(|(key, _, _)| failed.contains(key))
                    .map(|(_, _, record)| record.clone()),
            );
        }

        Ok(Response::records(records).with_unprocessed(unprocessed))
    }
}
