//! Stand-in WMS service answering GETs with canned envelopes.
//!
//! Fixtures are keyed by request path without the leading slash, optionally
//! followed by `?` and the raw query string. A request first looks up its
//! exact `path?query` key, then the bare path.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Canned answer for one request key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    pub status: u16,
    pub body: String,
}

impl Fixture {
    /// 200 with a success envelope wrapping `records`.
    pub fn success(records: Vec<Value>) -> Self {
        Self::raw(
            200,
            json!({ "status": "success", "data": { "result_list": records } }).to_string(),
        )
    }

    /// 200 with an error envelope.
    pub fn error(message: &str) -> Self {
        Self::raw(200, json!({ "status": "error", "message": message }).to_string())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    fixtures: Arc<RwLock<HashMap<String, Fixture>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample branding and listing data for running the server by hand.
    pub fn seeded() -> Self {
        let mut fixtures = HashMap::new();
        fixtures.insert(
            "branding/current".to_string(),
            Fixture::success(vec![json!({
                "name": "Harbour Homes",
                "primary_color": "#0b3d91",
                "logo_url": "https://cdn.example.com/harbour.png"
            })]),
        );
        fixtures.insert(
            "listing/search".to_string(),
            Fixture::success(vec![
                json!({ "id": 1, "title": "Riverside loft", "price": 1850, "active": true }),
                json!({ "id": 2, "title": "Garden cottage", "price": 1425, "active": true }),
                json!({ "id": 3, "title": "City studio", "price": 990, "active": false }),
            ]),
        );
        fixtures.insert("listing/none".to_string(), Fixture::success(Vec::new()));
        Self {
            fixtures: Arc::new(RwLock::new(fixtures)),
        }
    }

    pub async fn insert(&self, key: impl Into<String>, fixture: Fixture) {
        self.fixtures.write().await.insert(key.into(), fixture);
    }

    /// Like `insert`, for synchronous callers outside a Tokio runtime.
    pub fn blocking_insert(&self, key: impl Into<String>, fixture: Fixture) {
        self.fixtures.blocking_write().insert(key.into(), fixture);
    }

    async fn lookup(&self, path: &str, query: Option<&str>) -> Option<Fixture> {
        let fixtures = self.fixtures.read().await;
        query
            .and_then(|q| fixtures.get(&format!("{path}?{q}")))
            .or_else(|| fixtures.get(path))
            .cloned()
    }
}

pub fn app(store: Store) -> Router {
    Router::new().route("/{*path}", get(serve)).with_state(store)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}

async fn serve(
    State(store): State<Store>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    match store.lookup(&path, query.as_deref()).await {
        Some(fixture) => {
            tracing::debug!(%path, ?query, status = fixture.status, "serving fixture");
            let status = StatusCode::from_u16(fixture.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, "application/json")], fixture.body).into_response()
        }
        None => {
            tracing::debug!(%path, ?query, "no fixture");
            let body = json!({ "status": "error", "message": format!("No fixture for {path}") });
            (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
        }
    }
}
