//! End-to-end tests against the demo resources over real HTTP.

mod common;

use common::{client, spawn_server, test_config};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_then_fetch_entry() {
    let server = spawn_server(test_config()).await;
    let client = client();

    let res = client
        .post(server.url("/entries"))
        .header("content-type", "application/json")
        .body(r#"{"name":"alpha"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/entries/1");
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["value"], json!({"name": "alpha"}));

    let res = client
        .get(server.url("/entries/1"))
        .header("accept", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("etag"));
    assert!(res.headers().contains_key("last-modified"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], "1");
    assert_eq!(body["value"]["name"], "alpha");

    let res = client.get(server.url("/entries")).send().await.unwrap();
    let list: Value = res.json().await.unwrap();
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_etag_revalidation() {
    let server = spawn_server(test_config()).await;
    server.store.put("a", json!(1)).unwrap();
    let client = client();

    let res = client.get(server.url("/entries/a")).send().await.unwrap();
    let etag = res.headers()["etag"].to_str().unwrap().to_string();

    let res = client
        .get(server.url("/entries/a"))
        .header("if-none-match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert!(res.bytes().await.unwrap().is_empty());

    let res = client
        .put(server.url("/entries/a"))
        .header("content-type", "application/json")
        .header("if-match", "\"v999\"")
        .body("2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);

    let res = client
        .put(server.url("/entries/a"))
        .header("content-type", "application/json")
        .header("if-match", &etag)
        .body("2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.store.read("a").unwrap().unwrap().value, json!(2));
}

#[tokio::test]
async fn test_delete_leaves_gone_entry() {
    let server = spawn_server(test_config()).await;
    server.store.put("a", json!("x")).unwrap();
    let client = client();

    let res = client.delete(server.url("/entries/a")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(server.url("/entries/a")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GONE);

    let res = client.get(server.url("/entries/never")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_create_disabled() {
    let mut config = test_config();
    config.resources.allow_put_create = false;
    let server = spawn_server(config).await;

    let res = client()
        .put(server.url("/entries/new"))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.store.is_empty());
}

#[tokio::test]
async fn test_post_redirect() {
    let mut config = test_config();
    config.resources.post_redirect = true;
    let server = spawn_server(config).await;

    let res = client()
        .post(server.url("/entries"))
        .header("content-type", "application/json")
        .body("true")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/entries/1");
}

#[tokio::test]
async fn test_legacy_alias_moves_permanently() {
    let server = spawn_server(test_config()).await;
    server.store.put("a", json!(null)).unwrap();

    let res = client().get(server.url("/items/a")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["location"], "/entries/a");
}

#[tokio::test]
async fn test_client_errors() {
    let server = spawn_server(test_config()).await;
    let client = client();

    let res = client
        .post(server.url("/entries"))
        .header("content-type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = client
        .post(server.url("/entries"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url("/entries"))
        .header("accept", "image/png")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    let res = client
        .patch(server.url("/entries"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET, POST, HEAD");

    let res = client.get(server.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = test_config();
    config.security.max_body_size = 16;
    let server = spawn_server(config).await;

    let res = client()
        .post(server.url("/entries"))
        .header("content-type", "application/json")
        .body(format!("\"{}\"", "x".repeat(64)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.store.is_empty());
}

#[tokio::test]
async fn test_document_patch_over_http() {
    let server = spawn_server(test_config()).await;
    let client = client();

    let res = client
        .put(server.url("/documents/readme"))
        .header("content-type", "text/plain")
        .body("hello world")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .patch(server.url("/documents/readme"))
        .header("content-type", "text/plain")
        .body("world|there")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "hello there");
}

#[tokio::test]
async fn test_ambient_headers() {
    let server = spawn_server(test_config()).await;

    let res = client().get(server.url("/clock")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert!(res.headers().contains_key("x-decision-trace"));
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/plain;charset=utf-8"
    );
}

#[tokio::test]
async fn test_options_not_allowed_on_documents() {
    let server = spawn_server(test_config()).await;

    let res = client()
        .request(reqwest::Method::OPTIONS, server.url("/documents/x"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET, PUT, PATCH, HEAD");
}
