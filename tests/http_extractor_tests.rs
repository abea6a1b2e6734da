//! Tests for the axum integration
//!
//! A router holding an injected `Arc<QueryShaper>` serves shaped queries;
//! shaping failures come back as JSON errors with a 400 status.

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use serde_json::Value;
use sortable::prelude::*;

async fn list_users(ShapedQuery(query): ShapedQuery) -> Json<QueryDescriptor> {
    Json(query)
}

async fn echo_params(params: RequestParams) -> Json<RequestParams> {
    Json(params)
}

fn create_test_server() -> TestServer {
    let config = TableConfig::new("users")
        .with_heading("Name", "name")
        .with_sort("name", vec![SortTarget::desc("users.name")])
        .with_default_sort(DefaultSort::new("name", SortDirection::Desc))
        .with_search_columns(["users.email", "users.name"])
        .with_filter(FilterRuleConfig::new("status", "users.status").typed(ColumnType::Numeric))
        .with_includes(["role"]);
    let shaper = Arc::new(QueryShaper::new(config).expect("valid config"));

    let app = Router::new()
        .route("/users", get(list_users))
        .route("/params", get(echo_params))
        .with_state(shaper);

    TestServer::new(app)
}

#[tokio::test]
async fn test_shaped_query_defaults() {
    let server = create_test_server();

    let resp = server.get("/users").await;
    resp.assert_status(StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["order_by"], "users.name DESC");
    assert_eq!(body["sort"]["active_sort_key"], "name");
    assert_eq!(body["sort"]["toggle_key"], "name_reverse");
    assert_eq!(body["sort"]["indicator"], "sort-ascending-hint");
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["relations"]["kind"], "includes");
    assert_eq!(body["conditions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_shaped_query_with_search_and_filter() {
    let server = create_test_server();

    let resp = server
        .get("/users?sort=name_reverse&q=jo&status=2&page=2")
        .await;
    resp.assert_status(StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["order_by"], "users.name ASC");
    assert_eq!(
        body["conditions"][0]["template"],
        "(users.email ILIKE ? OR users.name ILIKE ?)"
    );
    assert_eq!(body["conditions"][0]["binds"][0], "%jo%");
    assert_eq!(body["conditions"][1]["template"], "users.status = ?");
    assert_eq!(body["conditions"][1]["binds"][0], 2);
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_invalid_sort_key_is_bad_request() {
    let server = create_test_server();

    let resp = server.get("/users?sort=password").await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = resp.json();
    assert_eq!(body["code"], "INVALID_SORT_KEY");
    assert_eq!(body["details"]["key"], "password");
}

#[tokio::test]
async fn test_invalid_filter_is_bad_request() {
    let server = create_test_server();

    let resp = server.get("/users?status=abc").await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = resp.json();
    assert_eq!(body["code"], "FILTER_PARSE_ERROR");
    assert_eq!(body["details"]["filter"], "status");
}

#[tokio::test]
async fn test_request_params_extractor_collects_arrays() {
    let server = create_test_server();

    let resp = server.get("/params?tag[]=a&tag[]=b&q=x").await;
    resp.assert_status(StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["tag"], serde_json::json!(["a", "b"]));
    assert_eq!(body["q"], "x");
}
