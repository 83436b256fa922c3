use std::sync::Arc;

use argon2::Argon2;
use axum::http::HeaderValue;

pub use axum::http::header::AUTHORIZATION;
pub use axum_test::TestServer;
pub use serde_json::{json, Value};
pub use uuid::Uuid;

use crate::{store::MemoryStore, token::Keys, AppState, State};

pub const PASSWORD: &str = "hunter2hunter";

/// Application state backed by an empty in-memory store.
pub fn state() -> AppState {
	State {
		database: Arc::new(MemoryStore::default()),
		hasher: Argon2::default(),
		keys: Arc::new(Keys::new(b"test secret", chrono::Duration::hours(1))),
	}
}

pub fn server(state: AppState) -> TestServer {
	TestServer::new(crate::app(state)).unwrap()
}

/// A test server with a fresh in-memory store.
pub fn app() -> TestServer {
	server(state())
}

/// Value of an `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Registers `username` with [`PASSWORD`], returning its access token.
pub async fn register(app: &TestServer, username: &str) -> String {
	let response = app
		.post("/api/auth/register")
		.json(&json!({ "username": username, "password": PASSWORD }))
		.await;

	assert_eq!(response.status_code(), 200);

	response.json::<Value>()["accessToken"]
		.as_str()
		.unwrap()
		.to_owned()
}
