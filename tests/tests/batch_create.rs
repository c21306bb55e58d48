use tests::{fixtures::*, *};

use pretty_assertions::assert_eq;
use tandem::{record, Related, Value};

async fn create_many_writes_valid_items_in_one_batch(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let records = vec![
        record! { "total" => 1 },
        record! { "total" => -1 },
        record! { "total" => 2 },
        record! { "status" => "LOST" },
        record! { "total" => 3, "status" => "DONE" },
    ];

    test.log().clear();
    let result = orders.create_many(records, None).await.unwrap();

    assert_eq!(result.created_items.len(), 3);
    assert_eq!(result.error_items.len(), 2);

    for item in &result.error_items {
        assert!(item.error.is_validation(), "{}", item.error);
    }

    assert_eq!(result.error_items[0].item, record! { "total" => -1 });
    assert_eq!(result.error_items[1].item, record! { "status" => "LOST" });

    let batch_op = if test.is_indexed() { "put_many" } else { "insert" };
    assert_eq!(test.log().count(batch_op), 1);
    assert_eq!(test.log().writes(), 1);

    let all = orders.all(Default::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

async fn create_many_without_valid_items_does_not_write(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let records = vec![record! { "total" => -1 }, record! { "total" => "lots" }];

    test.log().clear();
    let result = orders.create_many(records, None).await.unwrap();

    assert!(result.created_items.is_empty());
    assert_eq!(result.error_items.len(), 2);
    assert!(test.log().is_empty());
}

async fn validation_reports_every_failing_attribute(test: impl Setup) {
    let db = test.registry();
    let items = db.get_collection("order_item").unwrap();

    let err = items
        .create(record! { "quantity" => 0, "sku" => 7 })
        .await
        .unwrap_err();

    assert!(err.is_validation());

    let messages = err.validation_messages();
    assert_eq!(messages.len(), 3, "{messages:?}");
    assert!(messages.iter().any(|m| m.contains("`orderId` is required")));
    assert!(messages.iter().any(|m| m.contains("`sku`")));
    assert!(messages.iter().any(|m| m.contains("`quantity`")));

    assert_validation_err!(
        items
            .create(record! { "orderId" => "order-1", "sku" => "A-1", "quantity" => -2 })
            .await
    );
}

async fn children_created_with_a_parent_cache_it(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();
    let items = db.get_collection("order_item").unwrap();

    let order = orders.create(record! { "total" => 12 }).await.unwrap();
    let order_id = order.id().cloned().unwrap();

    let result = items
        .create_many(
            vec![
                record! { "orderId" => order_id.clone(), "sku" => "A-1" },
                record! { "orderId" => "another-order", "sku" => "B-2" },
            ],
            Some(&order),
        )
        .await
        .unwrap();

    assert_eq!(result.created_items.len(), 2);

    let matching = result
        .created_items
        .iter()
        .find(|item| item.get("orderId") == Some(&order_id))
        .unwrap();
    let other = result
        .created_items
        .iter()
        .find(|item| item.get("orderId") == Some(&Value::from("another-order")))
        .unwrap();

    test.log().clear();

    let Related::One(Some(parent)) = matching.related("order").await.unwrap() else {
        panic!("expected the parent order");
    };
    assert_eq!(parent.id(), Some(&order_id));
    assert!(test.log().is_empty());

    let missing = other.related("order").await.unwrap().into_one();
    assert!(missing.is_none());
    assert!(!test.log().is_empty());
}

tests!(
    create_many_writes_valid_items_in_one_batch,
    create_many_without_valid_items_does_not_write,
    validation_reports_every_failing_attribute,
    children_created_with_a_parent_cache_it,
);
