//! Cart API tests against the full router with a fake catalog.

use std::sync::Arc;

use axum::http::StatusCode;
use banyan_integration_tests::{FakeCatalog, FakeOrderGateway, TestClient, kurta_body, test_state};

fn client_with_stock(remaining: u32) -> (TestClient, Arc<FakeCatalog>) {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.set_stock(11, "M", Some("Indigo"), remaining);
    let state = test_state(catalog.clone(), Arc::new(FakeOrderGateway::new()));
    (TestClient::new(state), catalog)
}

#[tokio::test]
async fn test_empty_cart() {
    let (mut client, _) = client_with_stock(10);

    let (status, body) = client.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 0);
    assert!(body["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_and_show() {
    let (mut client, _) = client_with_stock(10);

    let (status, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item_count"], 2);
    assert_eq!(body["subtotal"], "₹259.98");

    // The cart persists across requests on the same session.
    let (status, body) = client.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"][0]["product_name"], "Block Print Kurta");
    assert_eq!(body["lines"][0]["line_total"], "₹259.98");
}

#[tokio::test]
async fn test_add_same_variant_merges() {
    let (mut client, _) = client_with_stock(10);

    client.post("/cart/items", Some(&kurta_body(Some("M"), 1))).await;
    let (_, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;

    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["item_count"], 3);
}

#[tokio::test]
async fn test_add_without_size_is_rejected() {
    let (mut client, _) = client_with_stock(10);

    let (status, body) = client.post("/cart/items", Some(&kurta_body(None, 1))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("no size selected"));
}

#[tokio::test]
async fn test_add_beyond_stock_conflicts() {
    let (mut client, _) = client_with_stock(4);

    client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;
    let (status, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 3))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("insufficient stock"));

    // The rejected add left the cart untouched.
    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 2);
}

#[tokio::test]
async fn test_unreachable_catalog_blocks_add() {
    let (mut client, catalog) = client_with_stock(10);
    catalog.set_unavailable(true);

    let (status, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 1))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);

    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_update_quantity_revalidates_stock() {
    let (mut client, catalog) = client_with_stock(4);

    let (_, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;
    let line_id = body["lines"][0]["id"].as_str().unwrap().to_string();

    // Within stock.
    let (status, body) = client
        .patch(
            &format!("/cart/items/{line_id}"),
            Some(&serde_json::json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 4);

    // Stock drops; the next increase is rejected.
    catalog.set_stock(11, "M", Some("Indigo"), 3);
    let (status, _) = client
        .patch(
            &format!("/cart/items/{line_id}"),
            Some(&serde_json::json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_to_zero_removes_without_stock_read() {
    let (mut client, catalog) = client_with_stock(4);

    let (_, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;
    let line_id = body["lines"][0]["id"].as_str().unwrap().to_string();

    // Even with the catalog down, setting quantity to 0 succeeds.
    catalog.set_unavailable(true);
    let (status, body) = client
        .patch(
            &format!("/cart/items/{line_id}"),
            Some(&serde_json::json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let (mut client, _) = client_with_stock(10);

    let (_, body) = client.post("/cart/items", Some(&kurta_body(Some("M"), 1))).await;
    let line_id = body["lines"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = client.delete(&format!("/cart/items/{line_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 0);

    let (status, _) = client.delete(&format!("/cart/items/{line_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    client.post("/cart/items", Some(&kurta_body(Some("M"), 1))).await;
    let (status, _) = client.delete("/cart").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_stock_endpoint_nets_out_held_quantity() {
    let (mut client, _) = client_with_stock(5);

    client.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;

    let (status, body) = client
        .get("/cart/stock?product_id=11&size=M&color=Indigo")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining"], 3);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.set_stock(11, "M", Some("Indigo"), 10);
    let state = test_state(catalog, Arc::new(FakeOrderGateway::new()));

    let mut first = TestClient::new(state.clone());
    let mut second = TestClient::new(state);

    first.post("/cart/items", Some(&kurta_body(Some("M"), 2))).await;

    let (_, body) = second.get("/cart").await;
    assert_eq!(body["item_count"], 0);
}
