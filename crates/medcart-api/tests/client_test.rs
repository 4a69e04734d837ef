#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medcart_api::{ApiClient, Error, Fetcher, Method, RequestOptions};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();
    (server, client)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_unwraps_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "data": [{"id": 1, "name": "Ayu"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client
        .fetch("/v1/users?page=1", RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(value, json!([{"id": 1, "name": "Ayu"}]));
}

#[tokio::test]
async fn test_fetch_returns_bare_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .mount(&server)
        .await;

    let value = Fetcher::fetch(&client, "/v1/categories").await.unwrap();
    assert_eq!(value, json!([{"id": 3}]));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/products/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let value = client
        .fetch("/v1/products/9", RequestOptions::new(Method::DELETE))
        .await
        .unwrap();
    assert_eq!(value, serde_json::Value::Null);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_decodes_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client
        .fetch(
            "/v1/auth/login",
            RequestOptions::new(Method::POST).with_body(json!({"email": "a@b.c"})),
        )
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn test_http_error_without_message_is_generic() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = Fetcher::fetch(&client, "/v1/orders").await.unwrap_err();

    match err {
        Error::Http {
            status,
            ref message,
            ref body,
        } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Request failed with status 502");
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_success_false_envelope_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/categories"))
        .and(body_json(json!({"name": "Vitamins"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Name already exists"
        })))
        .mount(&server)
        .await;

    let err = client
        .post::<serde_json::Value, _>("/v1/categories", &json!({"name": "Vitamins"}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected { status: 200, .. }));
    assert_eq!(err.user_message(), "Name already exists");
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = Fetcher::fetch(&client, "/v1/me").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[tokio::test]
async fn test_non_json_body_with_multibyte_text_is_deserialization_error() {
    let (server, client) = setup().await;

    // Byte 200 falls inside a two-byte character.
    let body = format!("x{}", "é".repeat(150));
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let err = Fetcher::fetch(&client, "/v1/me").await.unwrap_err();
    match err {
        Error::Deserialization { message, body } => {
            assert!(message.contains("xéé"));
            assert_eq!(body.chars().count(), 151);
        }
        other => panic!("expected deserialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port, then close the listener so nothing answers there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let uri = format!("http://127.0.0.1:{port}");
    let client = ApiClient::with_client(reqwest::Client::new(), &uri).unwrap();
    let err = Fetcher::fetch(&client, "/v1/products").await.unwrap_err();

    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_is_sent_after_set() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    client.set_token("tok-123".to_string().into());
    assert!(client.has_token());

    let me: serde_json::Value = client.get("/v1/me").await.unwrap();
    assert_eq!(me["id"], 1);

    client.clear_token();
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_clones_share_token() {
    let (_server, client) = setup().await;
    let other = client.clone();
    client.set_token("shared".to_string().into());
    assert!(other.has_token());
}
