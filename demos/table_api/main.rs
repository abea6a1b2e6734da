//! Table API example: serves shaped queries for a `users` table as JSON
//!
//! ```text
//! cargo run --example table_api
//! curl 'http://127.0.0.1:3000/users?sort=email_reverse&q=jo&status=2&letter=J'
//! ```

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use sortable::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const USERS_TABLE: &str = r#"
table: users
headings:
  - [Name, name]
  - [Email, email]
  - [Status, status]
  - [Role, role]
sort_map:
  name: [users.name]
  email: [[users.email, ASC]]
  status: [[users.status, DESC], [users.created_at, ASC]]
  role: [roles.role]
default_sort: [name, ASC]
per_page: 25
search_columns: [users.name, users.email]
filters:
  - { key: status, column: users.status }
  - { key: signed_up, column: users.created_at, type: date }
letter_column: users.name
include_relations: [role]
column_types:
  users.status: numeric
"#;

async fn list_users(ShapedQuery(query): ShapedQuery) -> Json<serde_json::Value> {
    let where_clause = query.where_clause(PlaceholderStyle::Dollar);
    let binds: Vec<String> = query.binds().iter().map(|b| b.to_string()).collect();

    Json(serde_json::json!({
        "sql": {
            "where": where_clause,
            "order_by": query.order_by,
            "limit": query.limit(),
            "offset": query.offset(),
            "binds": binds,
        },
        "query": query,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sortable=debug")),
        )
        .init();

    let config = TableConfig::from_yaml_str(USERS_TABLE)?;
    let shaper = Arc::new(QueryShaper::new(config)?);

    let app = Router::new()
        .route("/users", get(list_users))
        .layer(TraceLayer::new_for_http())
        .with_state(shaper);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
