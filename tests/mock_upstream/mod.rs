//! Synthetic congress.gov upstream for integration tests
#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted upstream: serves canned member lists per Congress, with
/// optional failure injection.
#[derive(Clone, Default)]
pub struct MockUpstream {
    /// Member payloads per Congress
    pub sessions: Arc<HashMap<u16, Vec<Value>>>,
    /// (congress, offset) of every handled request, in arrival order
    pub requests: Arc<Mutex<Vec<(u16, u32)>>>,
    /// Total attempts, including failed ones
    pub attempts: Arc<AtomicUsize>,
    /// Fail every request with a 500
    pub fail_all: bool,
    /// Fail requests for one specific Congress with a 500
    pub fail_congress: Option<u16>,
}

impl MockUpstream {
    pub fn with_sessions(sessions: HashMap<u16, Vec<Value>>) -> Self {
        Self {
            sessions: Arc::new(sessions),
            ..Self::default()
        }
    }

    pub fn request_log(&self) -> Vec<(u16, u32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Serve this upstream on an ephemeral port, returning its base URL
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/member", get(member_endpoint))
            .with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn member_endpoint(
    State(mock): State<MockUpstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.attempts.fetch_add(1, Ordering::SeqCst);

    let congress: u16 = params["congress"].parse().unwrap();
    if mock.fail_all || mock.fail_congress == Some(congress) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let limit: usize = params["limit"].parse().unwrap();
    let offset: usize = params["offset"].parse().unwrap();
    mock.requests.lock().unwrap().push((congress, offset as u32));

    let members: Vec<Value> = mock
        .sessions
        .get(&congress)
        .map(|all| all.iter().skip(offset).take(limit).cloned().collect())
        .unwrap_or_default();

    Json(json!({ "members": members })).into_response()
}

/// Spawn an upstream preloaded with the given per-Congress member lists
pub async fn spawn_member_upstream(sessions: Vec<(u16, Vec<Value>)>) -> String {
    MockUpstream::with_sessions(sessions.into_iter().collect())
        .spawn()
        .await
}

/// A fully-populated synthetic member record
pub fn member(id: &str) -> Value {
    json!({
        "bioguideId": id,
        "fullName": format!("Member {}", id),
        "firstName": "Test",
        "lastName": id,
        "partyHistory": [{"partyName": "Independent"}],
        "state": "VT",
        "terms": [{"chamber": "House", "start": "2023-01-03", "end": "2025-01-03"}],
        "url": format!("https://example.test/member/{}", id),
        "depiction": {"imageUrl": format!("https://example.test/{}.jpg", id)}
    })
}

/// `count` members with IDs `<prefix>000000..`
pub fn members(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| member(&format!("{}{:06}", prefix, i)))
        .collect()
}
