use tests::{fixtures::*, *};

use pretty_assertions::assert_eq;
use tandem::{record, Collection, Direction, Expr, QueryOptions, QueryResult, Record, Value};

async fn create_orders(orders: &Collection, status: &str, count: i64) -> Vec<Value> {
    let mut ids = vec![];

    for total in 0..count {
        let order = orders
            .create(record! { "status" => status, "total" => total })
            .await
            .unwrap();
        ids.push(order.id().cloned().unwrap());
    }

    ids
}

fn ids(result: QueryResult) -> Vec<Value> {
    result
        .into_models()
        .iter()
        .map(|model| model.id().cloned().unwrap())
        .collect()
}

fn id_strings(ids: &[Value]) -> Vec<String> {
    ids.iter()
        .map(|id| id.as_str().unwrap().to_string())
        .collect()
}

/// Follows returned cursors from the first page until none remains.
async fn follow_cursors(orders: &Collection, keys: &Record, options: QueryOptions) -> Vec<Value> {
    let mut paged = vec![];
    let mut cursor: Option<String> = None;

    loop {
        let mut options = options.clone();
        if let Some(cursor) = cursor.take() {
            options = options.cursor(cursor);
        }

        let page = orders.all_by_index_keys(keys.clone(), options).await.unwrap();
        assert!(page.len() <= 3);

        cursor = page.cursor().map(str::to_string);
        paged.extend(ids(page));

        if cursor.is_none() {
            break;
        }
    }

    paged
}

async fn cursor_pages_match_fetch_all_pages(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let created = create_orders(&orders, "DONE", 7).await;
    create_orders(&orders, "OPEN", 2).await;

    let keys = record! { "status" => "DONE" };
    let paged = follow_cursors(&orders, &keys, QueryOptions::new().limit(3)).await;

    let all = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(3).fetch_all_pages())
        .await
        .unwrap();
    let all = ids(all);

    assert_eq!(paged, all);
    assert_eq_unordered!(id_strings(&all), &id_strings(&created));

    // Filtered pages may come back short
    let filtered = QueryOptions::new().limit(3).filter(Expr::gt("total", 2));
    let paged = follow_cursors(&orders, &keys, filtered.clone()).await;

    let all = orders
        .all_by_index_keys(keys, filtered.fetch_all_pages())
        .await
        .unwrap();
    let all = ids(all);

    assert_eq!(paged, all);
    assert_eq!(all.len(), 4);
}

async fn single_lookups_skip_empty_pages(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    for i in 1..=4 {
        orders
            .create(record! {
                "orderId" => format!("o-{i}"),
                "status" => "DONE",
                "customerId" => CUSTOMER_A,
            })
            .await
            .unwrap();
    }

    orders
        .create(record! { "orderId" => "o-5", "status" => "DONE", "customerId" => CUSTOMER_B })
        .await
        .unwrap();

    let keys = record! { "status" => "DONE", "customerId" => CUSTOMER_B };

    test.log().clear();
    let found = orders
        .find_by_index_keys(keys.clone(), QueryOptions::new().index("byStatus"))
        .await
        .unwrap()
        .expect("order of customer B");
    assert_eq!(found.id(), Some(&Value::from("o-5")));

    if test.is_indexed() {
        // The customer is filtered after each one-item read
        assert_eq!(test.log().count("query"), 5);
    }

    let single = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().index("byStatus").limit(1))
        .await
        .unwrap();
    assert!(matches!(single, QueryResult::Single(Some(_))));

    let missing = record! { "status" => "OPEN", "customerId" => CUSTOMER_B };
    let none = orders
        .find_by_index_keys(missing, QueryOptions::new().index("byStatus"))
        .await
        .unwrap();
    assert!(none.is_none());
}

async fn by_status_pages_until_exhausted(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 3).await;
    create_orders(&orders, "OPEN", 1).await;

    let keys = record! { "status" => "DONE" };

    let first = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    let cursor = first.cursor().expect("more records remain").to_string();

    let second = orders
        .all_by_index_keys(keys, QueryOptions::new().limit(2).cursor(cursor))
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.cursor(), None);

    for model in first.models().iter().chain(second.models()) {
        assert_eq!(model.get("status"), Some(&Value::from("DONE")));
    }
}

async fn unreadable_cursor_starts_over(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 3).await;
    let keys = record! { "status" => "DONE" };

    let first = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(2))
        .await
        .unwrap();

    let restarted = orders
        .all_by_index_keys(keys, QueryOptions::new().limit(2).cursor("not a cursor"))
        .await
        .unwrap();

    assert_eq!(ids(restarted), ids(first));
}

async fn limit_shapes_the_result(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 3).await;
    let keys = record! { "status" => "DONE" };

    let single = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(1))
        .await
        .unwrap();
    assert!(matches!(single, QueryResult::Single(Some(_))));

    let page = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(1).return_cursor())
        .await
        .unwrap();
    assert!(matches!(page, QueryResult::Page { .. }));
    assert!(page.cursor().is_some());

    let items = orders.all_by_index_keys(keys, QueryOptions::new()).await.unwrap();
    assert!(matches!(items, QueryResult::Items(_)));
    assert_eq!(items.len(), 3);
}

async fn limit_zero_reads_nothing(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 2).await;
    test.log().clear();

    let result = orders.all(QueryOptions::new().limit(0)).await.unwrap();

    assert!(result.is_empty());
    assert!(test.log().is_empty());
}

async fn metadata_reports_pagination_state(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 3).await;
    let keys = record! { "status" => "DONE" };

    let truncated = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().limit(2).return_metadata())
        .await
        .unwrap();
    let metadata = truncated.metadata().expect("metadata requested").clone();

    assert_eq!(truncated.len(), 2);
    assert_eq!(metadata.total_fetched, 2);
    assert!(metadata.was_truncated);
    assert!(metadata.has_more);
    assert!(metadata.cursor.is_some());
    assert_eq!(metadata.pages_retrieved, 1);

    let options = QueryOptions::new()
        .limit(2)
        .fetch_all_pages()
        .return_metadata();
    let complete = orders.all_by_index_keys(keys, options).await.unwrap();
    let metadata = complete.metadata().expect("metadata requested");

    assert_eq!(metadata.total_fetched, 3);
    assert!(!metadata.was_truncated);
    assert!(!metadata.has_more);
    assert_eq!(metadata.cursor, None);
    assert_eq!(metadata.pages_retrieved, 2);
}

async fn options_parse_from_json(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    create_orders(&orders, "DONE", 3).await;
    test.log().clear();

    let err = QueryOptions::try_from(&serde_json::json!({ "returnMetadata": "yes" })).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(test.log().is_empty());

    let options =
        QueryOptions::try_from(&serde_json::json!({ "limit": 2, "returnCursor": true })).unwrap();
    let page = orders
        .all_by_index_keys(record! { "status" => "DONE" }, options)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(page.cursor().is_some());
}

async fn unknown_index_is_rejected(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    let err = orders
        .all_by_index_keys(record! { "status" => "DONE" }, QueryOptions::new().index("byColor"))
        .await
        .unwrap_err();

    assert!(err.is_index_not_found());
}

async fn customer_orders_by_creation_time(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    for day in 1..=5 {
        let created_at = format!("2024-01-0{day}T00:00:00.000Z");
        orders
            .create(record! { "customerId" => CUSTOMER_A, "createdAt" => created_at })
            .await
            .unwrap();
    }

    orders
        .create(record! { "customerId" => CUSTOMER_B, "createdAt" => "2024-01-03T00:00:00.000Z" })
        .await
        .unwrap();

    let created_at = |result: QueryResult| -> Vec<String> {
        result
            .into_models()
            .iter()
            .map(|model| model.get_as::<String>("createdAt").unwrap())
            .collect()
    };

    let keys = record! { "customerId" => CUSTOMER_A };

    let descending = orders
        .all_by_index_keys(keys.clone(), QueryOptions::new().order(Direction::Desc))
        .await
        .unwrap();
    let descending = created_at(descending);

    assert_eq!(descending.len(), 5);
    let mut expected = descending.clone();
    expected.sort();
    expected.reverse();
    assert_eq!(descending, expected);

    let range = QueryOptions::new().between(
        "createdAt",
        "2024-01-02T00:00:00.000Z",
        "2024-01-04T00:00:00.000Z",
    );
    let ranged = orders.all_by_index_keys(keys, range).await.unwrap();
    assert_eq!(ranged.len(), 3);
}

async fn filter_and_projection(test: impl Setup) {
    let db = test.registry();
    let orders = db.get_collection("order").unwrap();

    for total in [10, 60, 90] {
        orders
            .create(record! { "status" => "DONE", "total" => total })
            .await
            .unwrap();
    }

    let options = QueryOptions::new().filter(Expr::gt("total", 50));
    let large = orders
        .all_by_index_keys(record! { "status" => "DONE" }, options)
        .await
        .unwrap();

    let mut totals: Vec<_> = large
        .models()
        .iter()
        .map(|model| model.get_as::<i64>("total").unwrap())
        .collect();
    totals.sort();
    assert_eq!(totals, [60, 90]);

    let projected = orders
        .all(QueryOptions::new().attributes(["orderId", "status"]))
        .await
        .unwrap();
    assert_eq!(projected.len(), 3);

    for model in projected.models() {
        let mut fields: Vec<_> = model.record().fields().collect();
        fields.sort();
        assert_eq!(fields, ["orderId", "status"]);
    }
}

tests!(
    cursor_pages_match_fetch_all_pages,
    single_lookups_skip_empty_pages,
    by_status_pages_until_exhausted,
    unreadable_cursor_starts_over,
    limit_shapes_the_result,
    limit_zero_reads_nothing,
    metadata_reports_pagination_state,
    options_parse_from_json,
    unknown_index_is_rejected,
    customer_orders_by_creation_time,
    filter_and_projection,
);
