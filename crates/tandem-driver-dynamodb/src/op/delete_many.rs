use super::*;

impl DynamoDb {
    pub(crate) async fn exec_delete_many(
        &self,
        binding: &EntityBinding,
        op: operation::DeleteMany,
    ) -> Result<Response> {
        let mut count = 0;
        let mut unprocessed = vec![];

        for chunk in op.keys.chunks(BATCH_WRITE_LIMIT) {
            let keys = chunk
                .iter()
                .map(|key| Ok((ddb_item(&binding.primary_key(key)?), key)))
                .collect::<Result<Vec<_>>>()?;

            let pending = dedup_by_key(binding, keys);

            let requests = pending
                .iter()
                .map(|(_, key, _)| delete_request(key.clone()))
                .collect::<Result<Vec<_>>>()?;

            let res = self
                .client
                .batch_write_item()
                .request_items(&binding.table, requests)
                .send()
                .await
                .map_err(Error::driver)?;

            let failed: HashSet<_> = res
                .unprocessed_items
                .and_then(|mut tables| tables.remove(&binding.table))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|request| request.delete_request)
                .map(|delete| key_string(binding, &delete.key))
                .collect();

            for (key, _, record) in pending {
                if failed.contains(&key) {
                    unprocessed.push(record.clone());
                } else {
                    count += 1;
                }
            }
        }

        Ok(Response::count(count).with_unprocessed(unprocessed))
    }
}
