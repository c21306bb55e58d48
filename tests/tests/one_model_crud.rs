use tests::{fixtures::*, *};

use pretty_assertions::assert_eq;
use tandem::{record, Value};

async fn create_and_find_by_id(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let order = orders
        .create(record! { "customerId" => CUSTOMER_A, "total" => 25 })
        .await
        .unwrap();

    let id = order.id().cloned().expect("generated id");

    assert_eq!(order.get("status"), Some(&Value::from("OPEN")));
    assert_eq!(order.get("total"), Some(&Value::from(25)));
    assert!(order.get("createdAt").is_some());
    assert!(order.get("updatedAt").is_some());

    let found = orders.find_by_id(id.clone()).await.unwrap().expect("order exists");

    assert_eq!(found.id(), Some(&id));
    assert_eq!(found.get("customerId"), Some(&Value::from(CUSTOMER_A)));
    assert_eq!(found.get("total"), Some(&Value::from(25)));
    assert_eq!(found.get("createdAt"), order.get("createdAt"));

    assert!(orders.exists_by_id(id).await.unwrap());
    assert!(!orders.exists_by_id("missing").await.unwrap());
    assert!(orders.find_by_id("missing").await.unwrap().is_none());
}

async fn create_rejects_an_existing_key(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    orders.create(record! { "orderId" => "order-1" }).await.unwrap();

    let err = orders
        .create(record! { "orderId" => "order-1" })
        .await
        .unwrap_err();

    assert!(!err.is_validation());

    if test.is_indexed() {
        assert!(err.is_condition_failed());
    }
}

async fn upsert_replaces_an_existing_record(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    orders
        .upsert(record! { "orderId" => "order-1", "total" => 5 })
        .await
        .unwrap();
    orders
        .upsert(record! { "orderId" => "order-1", "total" => 7, "status" => "DONE" })
        .await
        .unwrap();

    let found = orders.find_by_id("order-1").await.unwrap().unwrap();
    assert_eq!(found.get("total"), Some(&Value::from(7)));
    assert_eq!(found.get("status"), Some(&Value::from("DONE")));

    let all = orders.all(Default::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

async fn update_by_keys_merges_changes(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let order = orders
        .create(record! { "customerId" => CUSTOMER_A, "total" => 1 })
        .await
        .unwrap();
    let id = order.id().cloned().unwrap();

    let updated = orders
        .update_by_keys(record! { "orderId" => id.clone() }, record! { "status" => "DONE" })
        .await
        .unwrap()
        .expect("order exists");

    assert_eq!(updated.get("status"), Some(&Value::from("DONE")));
    assert_eq!(updated.get("total"), Some(&Value::from(1)));
    assert_eq!(updated.get("customerId"), Some(&Value::from(CUSTOMER_A)));

    let found = orders.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.get("status"), Some(&Value::from("DONE")));
}

async fn update_of_a_missing_record_returns_none(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let updated = orders
        .update_by_keys(record! { "orderId" => "missing" }, record! { "status" => "DONE" })
        .await
        .unwrap();

    assert!(updated.is_none());
}

async fn updated_at_moves_strictly_forward(test: impl Setup) {
    let db = test.registry();
    let notes = db.get_collection("note").unwrap();

    let note = notes.create(record! { "body" => "first" }).await.unwrap();
    let id = note.id().cloned().unwrap();
    let created_at = note.get("updatedAt").and_then(Value::as_timestamp).unwrap();
    assert_eq!(Some(created_at), Value::from(FROZEN_NOW).as_timestamp());

    let mut previous = created_at;

    for body in ["second", "third"] {
        let updated = notes
            .update_by_keys(record! { "noteId" => id.clone() }, record! { "body" => body })
            .await
            .unwrap()
            .unwrap();

        let stamped = updated.get("updatedAt").and_then(Value::as_timestamp).unwrap();
        assert!(stamped > previous, "{stamped} is not after {previous}");
        assert_eq!(stamped.as_second() - previous.as_second(), 1);

        let stored = notes.find_by_id(id.clone()).await.unwrap().unwrap();
        assert_eq!(
            stored.get("updatedAt").and_then(Value::as_timestamp),
            Some(stamped)
        );

        previous = stamped;
    }
}

async fn model_save_persists_dirty_fields(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let order = orders.create(record! { "total" => 3 }).await.unwrap();
    let id = order.id().cloned().unwrap();

    let mut order = orders.find_by_id(id.clone()).await.unwrap().unwrap();
    order.set("status", "DONE").unwrap();
    order.set("total", 4).unwrap();
    assert!(order.is_dirty());
    assert_eq!(order.dirty_fields().collect::<Vec<_>>(), ["status", "total"]);

    order.save().await.unwrap();
    assert!(!order.is_dirty());
    assert_eq!(order.get("status"), Some(&Value::from("DONE")));

    let found = orders.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.get("status"), Some(&Value::from("DONE")));
    assert_eq!(found.get("total"), Some(&Value::from(4)));
}

async fn save_without_changes_does_nothing(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let mut order = orders.create(record! { "total" => 3 }).await.unwrap();
    test.log().clear();

    order.save().await.unwrap();
    assert!(test.log().is_empty());
}

async fn hidden_attributes_are_stored_but_not_read(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let order = orders
        .create(record! { "internalNote" => "fragile", "total" => 3 })
        .await
        .unwrap();

    assert_eq!(order.get("internalNote"), None);
    assert!(order.to_json().get("internalNote").is_none());

    let found = orders.find_by_id(order.id().cloned().unwrap()).await.unwrap().unwrap();
    assert_eq!(found.get("internalNote"), None);
}

async fn remove_deletes_records(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let mut ids = vec![];
    for total in 1..=3 {
        let order = orders.create(record! { "total" => total }).await.unwrap();
        ids.push(order.id().cloned().unwrap());
    }

    let first = orders.find_by_id(ids[0].clone()).await.unwrap().unwrap();
    assert!(first.remove().await.unwrap());
    assert!(!orders.exists_by_id(ids[0].clone()).await.unwrap());

    let removed = orders.remove_by_ids(ids[1..].to_vec()).await.unwrap();
    assert_eq!(removed, 2);

    assert!(orders.all(Default::default()).await.unwrap().is_empty());
    assert_eq!(orders.remove_by_ids(vec![]).await.unwrap(), 0);
}

async fn update_by_scanned_keys_reads_one_page(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    for total in [1, 2, 3, 4, 5] {
        orders.create(record! { "total" => total }).await.unwrap();
    }

    test.log().clear();
    let updated = orders
        .update_by_keys(record! { "total" => 5 }, record! { "status" => "DONE" })
        .await
        .unwrap()
        .expect("order with total 5");

    assert_eq!(updated.get("status"), Some(&Value::from("DONE")));

    let reads = if test.is_indexed() { "query" } else { "select" };
    assert_eq!(test.log().count(reads), 1);
}

tests!(
    create_and_find_by_id,
    create_rejects_an_existing_key,
    upsert_replaces_an_existing_record,
    update_by_keys_merges_changes,
    update_of_a_missing_record_returns_none,
    updated_at_moves_strictly_forward,
    model_save_persists_dirty_fields,
    save_without_changes_does_nothing,
    hidden_attributes_are_stored_but_not_read,
    remove_deletes_records,
    update_by_scanned_keys_reads_one_page,
);
