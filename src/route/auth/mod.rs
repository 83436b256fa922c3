use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Incorrect username or password")]
	InvalidUsernameOrPassword,
	#[error("password hashing error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("token signing error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("Access token not found")]
	MissingToken,
	#[error("Invalid token")]
	InvalidToken,
	#[error("Username already taken")]
	UsernameTaken,
	#[error("User not found")]
	UnknownUser,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_me, get_me_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/login", post_with(login, login_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::MissingToken => StatusCode::UNAUTHORIZED,
			Self::InvalidToken => StatusCode::FORBIDDEN,
			Self::Argon(..) | Self::Token(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken => StatusCode::CONFLICT,
			Self::UnknownUser => StatusCode::NOT_FOUND,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.post("/api/auth/register")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["success"], true);
		assert_eq!(body["message"], "User created successfully");
		assert!(body["accessToken"].is_string());

		let response = app
			.post("/api/auth/login")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let token = response.json::<Value>()["accessToken"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.get("/api/auth")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["user"]["username"], "john");
		assert!(body["user"].get("password").is_none());
	}

	#[tokio::test]
	async fn test_username_taken() {
		let app = app();

		register(&app, "john").await;

		let response = app
			.post("/api/auth/register")
			.json(&json!({ "username": "john", "password": "something else" }))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["message"], "Username already taken");
	}

	#[tokio::test]
	async fn test_login_failures_are_indistinguishable() {
		let app = app();

		register(&app, "john").await;

		for body in [
			json!({ "username": "john", "password": "wrong password" }),
			json!({ "username": "nobody", "password": PASSWORD }),
		] {
			let response = app.post("/api/auth/login").json(&body).await;

			assert_eq!(response.status_code(), 401);
			assert_eq!(
				response.json::<Value>(),
				json!({ "success": false, "message": "Incorrect username or password" })
			);
		}
	}

	#[tokio::test]
	async fn test_missing_credentials() {
		let app = app();

		let response = app
			.post("/api/auth/register")
			.json(&json!({ "username": "john" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"Missing username and/or password"
		);
	}

	#[tokio::test]
	async fn test_token_required() {
		let app = app();

		let response = app.get("/api/auth").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["message"], "Access token not found");

		let response = app
			.get("/api/auth")
			.add_header(AUTHORIZATION, bearer("not.a.token"))
			.await;

		assert_eq!(response.status_code(), 403);
		assert_eq!(response.json::<Value>()["message"], "Invalid token");
	}

	#[tokio::test]
	async fn test_token_for_unknown_user() {
		let state = state();
		let token = state.keys.issue(Uuid::new_v4()).unwrap();
		let app = server(state);

		let response = app
			.get("/api/auth")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
