//! Checkout API tests: the address/summary/submit flow, failure and retry,
//! and the duplicate-submission guard.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use banyan_integration_tests::{
    FakeCatalog, FakeOrderGateway, FakeOrderOutcome, TestClient, delivery_body, kurta_body,
    test_state,
};
use tower::util::ServiceExt;

fn setup(orders: Arc<FakeOrderGateway>) -> TestClient {
    let catalog = Arc::new(FakeCatalog::new());
    catalog.set_stock(11, "M", Some("Indigo"), 10);
    TestClient::new(test_state(catalog, orders))
}

async fn fill_cart(client: &mut TestClient) {
    let (status, _) = client
        .post("/cart/items", Some(&kurta_body(Some("M"), 2)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_checkout_requires_non_empty_cart() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));

    let (status, body) = client.post("/checkout", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("non-empty cart"));
}

#[tokio::test]
async fn test_guest_happy_path() {
    let orders = Arc::new(FakeOrderGateway::new());
    let mut client = setup(orders.clone());
    fill_cart(&mut client).await;

    // Start at the address step.
    let (status, body) = client.post("/checkout", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["step"], "address");

    // Valid details advance to summary.
    let (status, body) = client.put("/checkout/address", Some(&delivery_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "summary");
    assert_eq!(body["details"]["city"], "Mumbai");
    assert_eq!(body["cart"]["item_count"], 2);

    // Submit.
    let (status, body) = client.post("/checkout/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "succeeded");
    assert_eq!(body["order"]["order_number"], "BN-10042");
    // ₹129.99 × 2 in paise, plus shipping.
    assert_eq!(body["order"]["subtotal"], 25998);
    assert_eq!(body["order"]["total_amount"], 30898);
    assert_eq!(body["order"]["subtotal_display"], "₹259.98");
    assert_eq!(orders.calls(), 1);

    // A confirmed order empties the cart.
    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 0);

    // The confirmation read consumes the checkout.
    let (status, body) = client.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "succeeded");
    let (status, _) = client.get("/checkout").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_address_returns_field_errors() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;

    let mut details = delivery_body();
    details["phone"] = serde_json::json!("12");
    details["postal_code"] = serde_json::json!("40");
    let (status, body) = client.put("/checkout/address", Some(&details)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["phone"].is_string());
    assert!(
        body["fields"]["postal_code"]
            .as_str()
            .unwrap()
            .contains("pincode")
    );

    // Still at the address step, with the entry retained for redisplay.
    let (_, body) = client.get("/checkout").await;
    assert_eq!(body["step"], "address");
    assert_eq!(body["details"]["city"], "Mumbai");
}

#[tokio::test]
async fn test_guest_must_supply_email() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;

    let mut details = delivery_body();
    details["email"] = serde_json::Value::Null;
    let (status, body) = client.put("/checkout/address", Some(&details)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["fields"]["email"]
            .as_str()
            .unwrap()
            .contains("guest checkout")
    );
}

#[tokio::test]
async fn test_edit_address_returns_to_address_step() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    let (status, body) = client.post("/checkout/address/edit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "address");
    assert_eq!(body["details"]["full_name"], "Asha Rao");
}

#[tokio::test]
async fn test_failed_submission_keeps_cart_and_allows_retry() {
    let orders = Arc::new(FakeOrderGateway::new());
    orders.set_outcome(FakeOrderOutcome::Unavailable);
    let mut client = setup(orders.clone());
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    let (status, body) = client.post("/checkout/submit", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["retryable"], true);

    // Cart untouched; checkout at the failed step with the message.
    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 2);
    let (_, body) = client.get("/checkout").await;
    assert_eq!(body["step"], "failed");
    assert!(body["error"].as_str().unwrap().contains("unavailable"));

    // Retry returns to summary; the next submit succeeds.
    orders.set_outcome(FakeOrderOutcome::Succeed);
    let (status, body) = client.post("/checkout/retry", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "summary");

    let (status, body) = client.post("/checkout/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "succeeded");
    assert_eq!(orders.calls(), 2);
}

#[tokio::test]
async fn test_rejection_message_is_surfaced_verbatim() {
    let orders = Arc::new(FakeOrderGateway::new());
    orders.set_outcome(FakeOrderOutcome::Reject(
        "price mismatch on item 1".to_string(),
    ));
    let mut client = setup(orders);
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    let (status, body) = client.post("/checkout/submit", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "price mismatch on item 1");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_concurrent_duplicate_submit_issues_one_call() {
    let orders = Arc::new(FakeOrderGateway::with_delay(Duration::from_millis(100)));
    let mut client = setup(orders.clone());
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    // Two submits race on the same session. The slower gateway keeps the
    // first in flight while the second arrives.
    let first = client
        .router()
        .oneshot(client.build_request("POST", "/checkout/submit", None));
    let second = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        client
            .router()
            .oneshot(client.build_request("POST", "/checkout/submit", None))
            .await
    };

    let (first, second) = tokio::join!(first, second);
    let first = first.unwrap().status();
    let second = second.unwrap().status();

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(orders.calls(), 1);
}

#[tokio::test]
async fn test_abandon_discards_checkout_but_not_cart() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    let (status, _) = client.delete("/checkout").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = client.get("/checkout").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = client.get("/cart").await;
    assert_eq!(body["item_count"], 2);
}

#[tokio::test]
async fn test_restart_resumes_in_progress_checkout() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;
    client.put("/checkout/address", Some(&delivery_body())).await;

    // A second start does not reset the attempt.
    let (status, body) = client.post("/checkout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "summary");
}

#[tokio::test]
async fn test_submit_requires_summary_step() {
    let mut client = setup(Arc::new(FakeOrderGateway::new()));
    fill_cart(&mut client).await;
    client.post("/checkout", None).await;

    let (status, body) = client.post("/checkout/submit", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("address"));
}
