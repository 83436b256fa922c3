use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::route::model::{into_result, require_text};

/// A single user.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The username that is displayed to the public.
	pub username: String,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Body of the register and login routes.
#[derive(Deserialize, JsonSchema)]
pub struct CredentialsInput {
	pub username: Option<String>,
	pub password: Option<String>,
}

impl Validate for CredentialsInput {
	fn validate(&self) -> Result<(), ValidationErrors> {
		const MISSING: &str = "Missing username and/or password";

		let mut errors = ValidationErrors::new();

		require_text(&mut errors, "username", self.username.as_deref(), MISSING);
		require_text(&mut errors, "password", self.password.as_deref(), MISSING);

		into_result(errors)
	}
}

impl CredentialsInput {
	/// Splits validated credentials into `(username, password)`.
	pub fn into_parts(self) -> (String, String) {
		(
			self.username.unwrap_or_default(),
			self.password.unwrap_or_default(),
		)
	}
}

#[derive(Serialize, JsonSchema)]
pub struct TokenResponse {
	pub success: bool,
	pub message: &'static str,
	/// Bearer token for the `Authorization` header.
	#[serde(rename = "accessToken")]
	pub access_token: String,
}

impl TokenResponse {
	pub fn new(message: &'static str, access_token: String) -> Self {
		Self {
			success: true,
			message,
			access_token,
		}
	}
}

#[derive(Serialize, JsonSchema)]
pub struct UserResponse {
	pub success: bool,
	pub user: User,
}

#[cfg(test)]
mod test {
	use super::*;

	const MISSING_CREDENTIALS: &str = "Missing username and/or password";

	#[test]
	fn test_missing_credentials() {
		let input: CredentialsInput =
			serde_json::from_value(serde_json::json!({ "username": "john" })).unwrap();
		let errors = input.validate().unwrap_err();

		let message = errors.field_errors()["password"][0].message.clone();

		assert_eq!(message.as_deref(), Some(MISSING_CREDENTIALS));
	}

	#[test]
	fn test_password_is_never_serialized() {
		let user = User {
			id: Uuid::new_v4(),
			password: vec![1, 2, 3],
			username: "john".into(),
			created_at: chrono::Utc::now(),
		};

		let value = serde_json::to_value(user).unwrap();

		assert!(value.get("password").is_none());
		assert_eq!(value["username"], "john");
	}
}
