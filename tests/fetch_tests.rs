mod common;

use common::{harness, harness_with, RecordingNavigator};
use interiora::auth::{FileTokenStore, Session, TokenStore};
use interiora::config::InterioraConfig;
use interiora::Interiora;
use std::sync::Arc;
use interiora::error::Error;
use interiora::fetch::{FilePart, MultipartForm, RequestOptions};
use interiora::routes::Destination;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_request_carries_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sections/"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Living room" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let sections = h.client.catalog().sections().await.unwrap();

    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].name, "Living room");
    assert!(!h.client.api().loading().is_loading());
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .and(body_json(json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders/"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{ "id": 9, "status": "paid" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let orders = h.client.orders().history().await.unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, 9);
    assert_eq!(h.store.access_token().as_deref(), Some("access-2"));
    assert_eq!(h.store.get().unwrap().refresh_token, "refresh-1");
    assert!(h.navigator.visited().is_empty());
}

#[tokio::test]
async fn test_second_unauthorized_is_returned_without_another_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "no access" })))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let response = h
        .client
        .api()
        .send("orders/", RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // The session survives; only a failed refresh clears it.
    assert_eq!(h.store.access_token().as_deref(), Some("access-2"));
    assert!(h.navigator.visited().is_empty());
}

#[tokio::test]
async fn test_failed_refresh_clears_session_and_goes_to_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token is blacklisted" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let result = h.client.cart().cart().await;

    assert!(matches!(result, Err(Error::SessionExpired(_))));
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.visited(), vec![Destination::Login]);
    assert!(!h.client.api().loading().is_loading());
}

#[tokio::test]
async fn test_unauthorized_without_session_goes_to_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "never" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness_with(&mock_server, None);
    let result = h.client.cart().cart().await;

    assert!(matches!(result, Err(Error::SessionExpired(_))));
    assert_eq!(h.navigator.last(), Some(Destination::Login));
}

#[tokio::test]
async fn test_error_body_becomes_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/77/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    match h.client.catalog().product(77).await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not found.");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_multipart_is_not_sent_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/designs/"))
        .and(body_string_contains("form-data; name=\"title\""))
        .and(body_string_contains("filename=\"loft.png\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3,
            "title": "Scandi loft"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let form = MultipartForm::new()
        .text("title", "Scandi loft")
        .file("image", FilePart::new("loft.png", b"fake-png".to_vec()).with_content_type("image/png"));

    let design = h.client.admin().designs().create_multipart(form).await.unwrap();
    assert_eq!(design.id, 3);
}

#[tokio::test]
async fn test_multipart_is_rebuilt_for_the_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/designs/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/designs/"))
        .and(header("authorization", "Bearer access-2"))
        .and(body_string_contains("form-data; name=\"title\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 4, "title": "Loft" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let form = MultipartForm::new().text("title", "Loft");
    let design = h.client.admin().designs().create_multipart(form).await.unwrap();
    assert_eq!(design.title, "Loft");
}

#[tokio::test]
async fn test_query_parameters_are_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/"))
        .and(query_param("category", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": 11,
                "name": "Oak table",
                "category": 5,
                "colors": [
                    { "id": 1, "color": "Natural", "price": "450.00", "quantity": 3 },
                    { "id": 2, "color": "Walnut", "price": "420.00", "quantity": 0 }
                ]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server);
    let products = h.client.catalog().products(Some(5)).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].starting_price().unwrap().to_string(), "420.00");
    assert!(!products[0].color(2).unwrap().in_stock());
}

#[tokio::test]
async fn test_login_routes_by_role() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/"))
        .and(body_json(json!({ "email": "dev@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a", "refresh": "r", "role": "DEVELOPER"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/"))
        .and(body_json(json!({ "email": "shopper@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "b", "refresh": "s", "role": "CUSTOMER"
        })))
        .mount(&mock_server)
        .await;

    let h = harness_with(&mock_server, None);

    let session = h.client.login("dev@example.com", "pw").await.unwrap();
    assert_eq!(session, Session::new("a", "r", Some("DEVELOPER")));
    assert_eq!(h.navigator.last(), Some(Destination::AdminOverview));
    assert!(interiora::routes::AdminGate::allows(h.store.as_ref()));

    h.client.login("shopper@example.com", "pw").await.unwrap();
    assert_eq!(h.navigator.last(), Some(Destination::Home));
    assert!(!interiora::routes::AdminGate::allows(h.store.as_ref()));

    h.client.logout();
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.last(), Some(Destination::Login));
}

#[tokio::test]
async fn test_refreshed_token_is_persisted_to_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cart/"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let store = Arc::new(FileTokenStore::new(&session_path));
    store.set(Session::new("access-1", "refresh-1", None)).unwrap();

    let config = InterioraConfig::new(
        &format!("{}/api/v1", mock_server.uri()),
        "ws://127.0.0.1:9/ws/",
    )
    .unwrap();
    let client = Interiora::new(config, store, Arc::new(RecordingNavigator::default())).unwrap();
    assert!(client.cart().cart().await.unwrap().is_empty());

    let reopened = FileTokenStore::new(&session_path);
    assert_eq!(reopened.access_token().as_deref(), Some("access-2"));
    assert_eq!(reopened.get().unwrap().refresh_token, "refresh-1");
}
