//! Shared test utilities.
//!
//! [`MockTransport`] is a scripted in-process server: routes answer with canned JSON, every
//! request is recorded, and answers can change once a given request has been seen so
//! write-then-refetch flows observe the post-write state.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    errors::{Error, Result},
    http::{ApiClient, ApiRequest, ApiResponse, Method, Transport},
    session::{MemoryTokenStore, SessionContext, StoredSession},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

type Route = (Method, String);

#[derive(Clone, Debug)]
enum Reply {
    Status(u16, Value),
    NetworkFailure,
}

#[derive(Default)]
struct MockState {
    once: HashMap<Route, VecDeque<Reply>>,
    sticky: HashMap<Route, Reply>,
    after: Vec<(Route, Route, Reply)>,
    requests: Vec<ApiRequest>,
}

/// Scripted transport.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request on the route with `status` and `body` until replaced.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .sticky
            .insert((method, path.to_string()), Reply::Status(status, body));
    }

    /// Answers the next request on the route, ahead of the sticky answer.
    pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .once
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply::Status(status, body));
    }

    /// Makes every request on the route fail as if the network dropped.
    pub fn fail(&self, method: Method, path: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .sticky
            .insert((method, path.to_string()), Reply::NetworkFailure);
    }

    /// Once a request matching `trigger` has been answered, the route starts answering with
    /// `status` and `body`.
    pub fn respond_after(
        &self,
        trigger: (Method, &str),
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) {
        let mut state = self.state.lock().unwrap();
        state.after.push((
            (trigger.0, trigger.1.to_string()),
            (method, path.to_string()),
            Reply::Status(status, body),
        ));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests sent to the route.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Requests sent to the route, in order.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn answer(&self, request: &ApiRequest) -> Reply {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        let route = (request.method, request.path.clone());

        let queued = state.once.get_mut(&route).and_then(VecDeque::pop_front);
        let reply = queued
            .or_else(|| state.sticky.get(&route).cloned())
            .unwrap_or_else(|| {
                Reply::Status(
                    404,
                    serde_json::json!({"message": format!("no mock for {} {}", request.method.as_str(), request.path)}),
                )
            });

        let succeeded = matches!(reply, Reply::Status(status, _) if (200..300).contains(&status));
        if succeeded {
            let (fired, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.after)
                .into_iter()
                .partition(|(trigger, _, _)| *trigger == route);
            state.after = pending;
            for (_, target, reply) in fired {
                state.sticky.insert(target, reply);
            }
        }
        reply
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        match self.answer(request) {
            Reply::Status(status, body) => Ok(ApiResponse {
                status,
                body: serde_json::to_vec(&body)?,
            }),
            Reply::NetworkFailure => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "request timed out",
            ))),
        }
    }
}

/// Builds an unsigned `header.payload.signature` token carrying `claims`.
pub fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.signature")
}

/// Token for an admin that expires far in the future.
pub fn admin_token() -> String {
    make_token(&serde_json::json!({"sub": "admin@example.com", "exp": 4_000_000_000_i64, "roles": ["ROLE_ADMIN"]}))
}

/// Token for a regular user that expires far in the future.
pub fn user_token() -> String {
    make_token(&serde_json::json!({"sub": "user@example.com", "exp": 4_000_000_000_i64, "role": "ROLE_USER"}))
}

/// In-memory session holding `token` and an optional refresh token.
pub fn memory_session(token: &str, refresh_token: Option<&str>) -> SessionContext {
    SessionContext::new(MemoryTokenStore::with_session(StoredSession {
        token: Some(token.to_string()),
        refresh_token: refresh_token.map(str::to_string),
        ..StoredSession::default()
    }))
}

/// Client over a fresh [`MockTransport`] logged in with `token`.
pub fn mock_client(token: &str) -> ApiClient<MockTransport> {
    ApiClient::new(MockTransport::new(), memory_session(token, Some("refresh")))
}

/// Initializes tracing for tests that want log output.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
