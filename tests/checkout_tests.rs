mod common;

use async_trait::async_trait;
use common::{harness, test_card, FakeCardProcessor};
use interiora::cart::{CartView, CheckoutState, ConfirmPrompt, ShippingInfo};
use interiora::error::Error;
use interiora::payments::{CardProcessor, PaymentProvider};
use interiora::routes::Destination;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Answer(bool);

#[async_trait]
impl ConfirmPrompt for Answer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        email: "shopper@example.com".to_string(),
        phone: "+49 30 1234567".to_string(),
        address: "Hauptstrasse 1".to_string(),
        city: "Berlin".to_string(),
        postal_code: "10115".to_string(),
    }
}

async fn mount_cart(server: &MockServer, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

/// Cart GET that must be hit exactly `loads` times: the first load plus one
/// refetch per mutation that reached the server.
async fn mount_cart_loads(server: &MockServer, items: serde_json::Value, loads: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .expect(loads)
        .mount(server)
        .await;
}

fn one_item(quantity: u32, stock: u32) -> serde_json::Value {
    json!([{
        "id": 1,
        "product": 11,
        "color": 2,
        "product_name": "Oak table",
        "color_name": "Walnut",
        "quantity": quantity,
        "unit_price": "450.00",
        "stock": stock
    }])
}

async fn mount_order(server: &MockServer, order_id: i64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/orders/"))
        .and(body_json(json!({
            "email": "shopper@example.com",
            "phone": "+49 30 1234567",
            "address": "Hauptstrasse 1",
            "city": "Berlin",
            "postal_code": "10115"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": order_id, "status": "pending" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut checkout = h.client.checkout(None).await.unwrap();

    assert!(!checkout.cart().can_checkout());
    assert!(matches!(checkout.begin(), Err(Error::EmptyCart)));
    assert_eq!(checkout.state(), &CheckoutState::Browsing);
    assert!(!checkout.shows_shipping_form());
}

#[tokio::test]
async fn test_incomplete_shipping_sends_nothing() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(1, 3)).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut checkout = h.client.checkout(None).await.unwrap();
    checkout.begin().unwrap();
    assert!(checkout.shows_shipping_form());

    checkout.shipping_mut().email = "shopper@example.com".to_string();
    checkout.shipping_mut().city = "Berlin".to_string();

    match checkout.submit_shipping().await {
        Err(Error::Validation(missing)) => {
            assert_eq!(missing, vec!["phone", "address", "postal_code"])
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(checkout.state(), &CheckoutState::CollectingShippingInfo);

    checkout.back_to_cart().unwrap();
    assert_eq!(checkout.shipping().city, "Berlin");
}

#[tokio::test]
async fn test_redirect_payment_leaves_the_app() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(1, 3)).await;
    mount_order(&mock_server, 42).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/payments/create-intent/"))
        .and(body_json(json!({ "order_id": 42, "payment_method": "paypal" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "approval_url": "https://pay.example.com/approve?token=EC-1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let processor = Arc::new(FakeCardProcessor::approving());
    let mut checkout = h
        .client
        .checkout(Some(processor.clone() as Arc<dyn CardProcessor>))
        .await
        .unwrap();

    checkout.begin().unwrap();
    *checkout.shipping_mut() = shipping();
    assert_eq!(checkout.submit_shipping().await.unwrap(), 42);
    assert_eq!(checkout.state(), &CheckoutState::OrderCreated { order_id: 42 });

    let approval = Url::parse("https://pay.example.com/approve?token=EC-1").unwrap();
    let state = checkout.pay(PaymentProvider::Redirect, None).await.unwrap();
    assert_eq!(
        state,
        &CheckoutState::Redirected {
            order_id: 42,
            approval_url: approval.clone()
        }
    );
    assert!(state.is_terminal());
    assert_eq!(processor.calls(), 0);
    assert_eq!(h.navigator.last(), Some(Destination::External(approval)));
}

#[tokio::test]
async fn test_card_payment_succeeds_and_goes_home() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(2, 5)).await;
    mount_order(&mock_server, 7).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/payments/create-intent/"))
        .and(body_json(json!({ "order_id": 7, "payment_method": "stripe" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "client_secret": "pi_7_secret" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let processor = Arc::new(FakeCardProcessor::approving());
    let mut checkout = h
        .client
        .checkout(Some(processor.clone() as Arc<dyn CardProcessor>))
        .await
        .unwrap();

    assert_eq!(checkout.cart().cart().total().to_string(), "900.00");

    checkout.begin().unwrap();
    *checkout.shipping_mut() = shipping();
    checkout.submit_shipping().await.unwrap();

    let card = test_card();
    let state = checkout.pay(PaymentProvider::Card, Some(&card)).await.unwrap();

    assert_eq!(state, &CheckoutState::Succeeded { order_id: 7 });
    assert_eq!(processor.calls(), 1);
    assert!(checkout.cart().cart().is_empty());
    assert_eq!(h.navigator.last(), Some(Destination::Home));
}

#[tokio::test]
async fn test_declined_card_can_be_paid_again() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(1, 3)).await;
    mount_order(&mock_server, 8).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/payments/create-intent/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "client_secret": "pi_8_secret" })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let processor = Arc::new(FakeCardProcessor::declining());
    let mut checkout = h
        .client
        .checkout(Some(processor.clone() as Arc<dyn CardProcessor>))
        .await
        .unwrap();

    checkout.begin().unwrap();
    *checkout.shipping_mut() = shipping();
    checkout.submit_shipping().await.unwrap();

    let card = test_card();
    let state = checkout.pay(PaymentProvider::Card, Some(&card)).await.unwrap().clone();
    assert_eq!(
        state,
        CheckoutState::Failed {
            order_id: 8,
            message: "Your card was declined.".to_string()
        }
    );
    assert_eq!(checkout.error_message(), Some("Your card was declined."));
    assert!(!checkout.cart().cart().is_empty());

    processor.set_decline(false);
    let state = checkout.pay(PaymentProvider::Card, Some(&card)).await.unwrap();
    assert_eq!(state, &CheckoutState::Succeeded { order_id: 8 });
    assert_eq!(processor.calls(), 2);
}

#[tokio::test]
async fn test_card_payment_needs_card_details() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(1, 3)).await;
    mount_order(&mock_server, 9).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/payments/create-intent/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut checkout = h.client.checkout(None).await.unwrap();
    checkout.begin().unwrap();
    *checkout.shipping_mut() = shipping();
    checkout.submit_shipping().await.unwrap();

    assert!(matches!(
        checkout.pay(PaymentProvider::Card, None).await,
        Err(Error::Validation(_))
    ));
    assert_eq!(checkout.state(), &CheckoutState::OrderCreated { order_id: 9 });
}

#[tokio::test]
async fn test_paying_before_the_order_exists_is_refused() {
    let mock_server = MockServer::start().await;
    mount_cart(&mock_server, one_item(1, 3)).await;

    let h = harness(&mock_server);
    let mut checkout = h.client.checkout(None).await.unwrap();

    assert!(matches!(
        checkout.pay(PaymentProvider::Redirect, None).await,
        Err(Error::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_stepper_bounds_send_no_request() {
    let mock_server = MockServer::start().await;
    mount_cart_loads(
        &mock_server,
        json!([
            { "id": 1, "product": 11, "color": 2, "quantity": 3, "unit_price": "10.00", "stock": 3 },
            { "id": 2, "product": 12, "color": 4, "quantity": 1, "unit_price": "5.00", "stock": 9 }
        ]),
        2,
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/cart/items/1/"))
        .and(body_json(json!({ "quantity": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "quantity": 2 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/cart/items/2/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut view = CartView::load(h.client.cart()).await.unwrap();

    // At stock: nothing to send.
    assert_eq!(view.increment(1).await.unwrap(), 3);
    // At one: nothing to send.
    assert_eq!(view.decrement(2).await.unwrap(), 1);
    // In range: one PATCH, then the cart is fetched again.
    assert_eq!(view.decrement(1).await.unwrap(), 2);
}

#[tokio::test]
async fn test_dismissed_delete_sends_nothing() {
    let mock_server = MockServer::start().await;
    mount_cart_loads(&mock_server, one_item(1, 3), 2).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/cart/items/1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut view = CartView::load(h.client.cart()).await.unwrap();

    assert!(!view.remove(1, &Answer(false)).await.unwrap());
    assert!(view.remove(1, &Answer(true)).await.unwrap());
}

#[tokio::test]
async fn test_plus_on_over_stock_line_keeps_quantity() {
    let mock_server = MockServer::start().await;
    mount_cart_loads(&mock_server, one_item(5, 3), 2).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/cart/items/1/"))
        .and(body_json(json!({ "quantity": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "quantity": 4 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let mut view = CartView::load(h.client.cart()).await.unwrap();

    assert_eq!(view.increment(1).await.unwrap(), 5);
    assert_eq!(view.decrement(1).await.unwrap(), 4);
}

#[tokio::test]
async fn test_add_item_rejects_zero_quantity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/cart/items/"))
        .and(body_json(json!({ "product": 11, "color": 2, "quantity": 2 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5, "product": 11, "color": 2, "quantity": 2, "unit_price": "450.00"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let cart = h.client.cart();

    assert!(matches!(cart.add_item(11, 2, 0).await, Err(Error::Validation(_))));
    let item = cart.add_item(11, 2, 2).await.unwrap();
    assert_eq!(item.id, 5);
    assert_eq!(item.subtotal().to_string(), "900.00");
}
