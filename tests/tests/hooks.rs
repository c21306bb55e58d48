use tests::{fixtures::*, *};

use pretty_assertions::assert_eq;
use tandem::{async_trait, record, Hooks, Model, Result};
use tandem_core::err;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Default)]
struct Counter {
    created: AtomicUsize,
    batches: AtomicUsize,
    fail: bool,
}

/// Hooks reporting to a shared [`Counter`].
struct Counting(Arc<Counter>);

#[async_trait]
impl Hooks for Counting {
    async fn after_create(&self, _model: &Model) -> Result<()> {
        self.0.created.fetch_add(1, Ordering::SeqCst);

        if self.0.fail {
            return Err(err!("hook failed"));
        }

        Ok(())
    }

    async fn after_create_many(&self, models: &[Model]) -> Result<()> {
        self.0.batches.fetch_add(1, Ordering::SeqCst);
        self.0.created.fetch_add(models.len(), Ordering::SeqCst);

        if self.0.fail {
            return Err(err!("hook failed"));
        }

        Ok(())
    }
}

async fn hooks_run_after_creates(test: impl Setup) {
    let counter = Arc::new(Counter::default());
    let db = registry_with_hooks(test.backend(), Counting(counter.clone()));
    let orders = db.get_collection("order").unwrap();

    orders.create(record! { "total" => 1 }).await.unwrap();
    orders
        .create_many(vec![record! { "total" => 2 }, record! { "total" => 3 }], None)
        .await
        .unwrap();

    assert_eq!(counter.created.load(Ordering::SeqCst), 3);
    assert_eq!(counter.batches.load(Ordering::SeqCst), 1);
}

async fn failing_hooks_do_not_fail_the_write(test: impl Setup) {
    let counter = Arc::new(Counter {
        fail: true,
        ..Counter::default()
    });
    let db = registry_with_hooks(test.backend(), Counting(counter.clone()));
    let orders = db.get_collection("order").unwrap();

    let order = orders.create(record! { "total" => 1 }).await.unwrap();
    assert!(orders.exists_by_id(order.id().cloned().unwrap()).await.unwrap());

    let result = orders
        .create_many(vec![record! { "total" => 2 }], None)
        .await
        .unwrap();
    assert_eq!(result.created_items.len(), 1);

    assert_eq!(counter.created.load(Ordering::SeqCst), 2);
}

async fn hooks_are_skipped_when_validation_fails(test: impl Setup) {
    let counter = Arc::new(Counter::default());
    let db = registry_with_hooks(test.backend(), Counting(counter.clone()));
    let orders = db.get_collection("order").unwrap();

    assert_validation_err!(orders.create(record! { "total" => -1 }).await);
    assert_eq!(counter.created.load(Ordering::SeqCst), 0);
}

tests!(
    hooks_run_after_creates,
    failing_hooks_do_not_fail_the_write,
    hooks_are_skipped_when_validation_fails,
);
