//! Wishlist API tests. No stock dimension: saving never consults the
//! catalog.

use std::sync::Arc;

use axum::http::StatusCode;
use banyan_integration_tests::{FakeCatalog, FakeOrderGateway, TestClient, test_state};

fn client() -> TestClient {
    let catalog = Arc::new(FakeCatalog::new());
    // Catalog is down the whole time; the wishlist must not care.
    catalog.set_unavailable(true);
    TestClient::new(test_state(catalog, Arc::new(FakeOrderGateway::new())))
}

fn saree_body() -> serde_json::Value {
    serde_json::json!({
        "product_id": 21,
        "product_name": "Chanderi Saree",
        "unit_price": { "amount": "349.00", "currency_code": "INR" },
        "image_url": "https://cdn.example.in/saree-rust.jpg",
    })
}

#[tokio::test]
async fn test_save_and_show() {
    let mut client = client();

    let (status, body) = client.post("/wishlist/items", Some(&saree_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["items"][0]["product_name"], "Chanderi Saree");
    assert_eq!(body["items"][0]["unit_price"], "₹349.00");

    let (status, body) = client.get("/wishlist").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resave_is_a_noop() {
    let mut client = client();

    client.post("/wishlist/items", Some(&saree_body())).await;
    let (status, body) = client.post("/wishlist/items", Some(&saree_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove() {
    let mut client = client();

    client.post("/wishlist/items", Some(&saree_body())).await;

    let (status, body) = client.delete("/wishlist/items/21").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, _) = client.delete("/wishlist/items/21").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear() {
    let mut client = client();

    client.post("/wishlist/items", Some(&saree_body())).await;
    let (status, _) = client.delete("/wishlist").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = client.get("/wishlist").await;
    assert!(body["items"].as_array().unwrap().is_empty());
}
