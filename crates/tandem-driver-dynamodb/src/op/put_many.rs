use super::*;

impl DynamoDb {
    pub(crate) async fn exec_put_many(
        &self,
        binding: &EntityBinding,
        op: operation::PutMany,
    ) -> Result<Response> {
        let mut written = vec![];
        let mut unprocessed = vec![];

        for chunk in op.items.chunks(BATCH_WRITE_LIMIT) {
            let mut items = vec![];

            for record in chunk {
                let mut item = record.clone();
                let keys = binding.composite_keys(&item)?;
                item.merge(&keys);
                items.push((ddb_item(&item), record));
            }

            let pending = dedup_by_key(binding, items);

            let requests = pending
                .iter()
                .map(|(_, item, _)| put_request(item.clone()))
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
                .filter_map(|request| request.put_request)
                .map(|put| key_string(binding, &put.item))
                .collect();

            for (key, _, record) in pending {
                if failed.contains(&key) {
                    unprocessed.push(record.clone());
                } else {
                    written.push(record.clone());
                }
            }
        }

        if !unprocessed.is_empty() {
            tracing::debug!(
                table = %binding.table,
                unprocessed = unprocessed.len(),
                "batch write left items unprocessed"
            );
        }

        Ok(Response::records(written).with_unprocessed(unprocessed))
    }
}
