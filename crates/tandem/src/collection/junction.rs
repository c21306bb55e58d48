use super::{Collection, CreateManyResult, ErrorItem, ReconcileResult};
use crate::{QueryOptions, Result};

use tandem_core::{
    record,
    stmt::{Record, Value},
};

/// Association changes that move a current set to a desired one.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Diff {
    pub to_create: Vec<Value>,
    pub to_delete: Vec<Value>,
}

/// `to_delete = current - desired`, `to_create = desired - current`.
/// Duplicates on either side collapse.
pub(crate) fn diff(current: &[Value], desired: &[Value]) -> Diff {
    let mut diff = Diff::default();

    for value in desired {
        if !current.contains(value) && !diff.to_create.contains(value) {
            diff.to_create.push(value.clone());
        }
    }

    for value in current {
        if !desired.contains(value) && !diff.to_delete.contains(value) {
            diff.to_delete.push(value.clone());
        }
    }

    diff
}

impl Collection {
    /// Makes the junction records owned by `owner_id` point at exactly the
    /// `desired` targets.
    ///
    /// Deletes and creates are issued concurrently and independently: a
    /// failure on one side is logged and reported without undoing the
    /// other.
    pub async fn reconcile_junction(
        &self,
        owner_key: &str,
        owner_id: impl Into<Value>,
        target_key: &str,
        desired: Vec<Value>,
    ) -> Result<ReconcileResult> {
        let owner_id = owner_id.into();
        let owner = record! { owner_key => owner_id.clone() };

        let current: Vec<Value> = self
            .all_by_index_keys(owner, QueryOptions::default().attributes([owner_key, target_key]))
            .await?
            .into_models()
            .iter()
            .filter_map(|model| model.get(target_key).cloned())
            .collect();

        let Diff {
            to_create,
            to_delete,
        } = diff(&current, &desired);

        tracing::debug!(
            entity = %self.schema().entity_name,
            create = to_create.len(),
            delete = to_delete.len(),
            "reconciling junction"
        );

        let pair = |target: Value| -> Record {
            record! {
                owner_key => owner_id.clone(),
                target_key => target,
            }
        };

        let delete_keys: Vec<_> = to_delete.into_iter().map(&pair).collect();
        let create_items: Vec<_> = to_create.into_iter().map(&pair).collect();

        let remove = async {
            if delete_keys.is_empty() {
                return Ok(0);
            }
            self.remove_by_index_keys(delete_keys).await
        };

        let create = async {
            if create_items.is_empty() {
                return Ok(CreateManyResult::default());
            }
            self.create_many(create_items.clone(), None).await
        };

        let (removed, created) = futures::join!(remove, create);
        let mut result = ReconcileResult::default();

        match removed {
            Ok(count) => result.removed_count = count,
            Err(err) => {
                tracing::warn!(
                    entity = %self.schema().entity_name,
                    %err,
                    "junction delete failed"
                );
            }
        }

        match created {
            Ok(created) => {
                result.created_items = created.created_items;
                result.error_items = created.error_items;
            }
            Err(err) => {
                tracing::warn!(
                    entity = %self.schema().entity_name,
                    %err,
                    "junction create failed"
                );

                result.error_items = create_items
                    .into_iter()
                    .map(|item| ErrorItem {
                        item,
                        error: err.clone(),
                    })
                    .collect();
            }
        }

        Ok(result)
    }
}
