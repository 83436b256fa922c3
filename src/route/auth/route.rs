use argon2::Argon2;
use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	store, AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and registering,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Register account
/// Registers a new account, returning an access token for it.
#[route(tag = tag::AUTH, response(status = 409, description = "The username is already taken."))]
pub async fn register(
	State(state): State<AppState>,
	Json(input): Json<model::CredentialsInput>,
) -> Result<Json<model::TokenResponse>, RouteError> {
	let (username, password) = input.into_parts();
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &password, &user_id).map_err(Error::Argon)?;

	let user = state
		.database
		.create_user(user_id, &username, &hashed)
		.await
		.map_err(|e| match e {
			store::Error::UsernameTaken => Error::UsernameTaken.into(),
			e => RouteError::from(e),
		})?;

	let token = state.keys.issue(user.id).map_err(Error::Token)?;

	Ok(Json(model::TokenResponse::new(
		"User created successfully",
		token,
	)))
}

/// Log in
/// Logs in to an account, returning an access token for it.
#[route(tag = tag::AUTH, response(status = 401, description = "The username or password is incorrect."))]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::CredentialsInput>,
) -> Result<Json<model::TokenResponse>, RouteError> {
	let (username, password) = input.into_parts();

	let Some(user) = state.database.find_user_by_username(&username).await? else {
		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidUsernameOrPassword.into());
	}

	let token = state.keys.issue(user.id).map_err(Error::Token)?;

	Ok(Json(model::TokenResponse::new(
		"User logged in successfully",
		token,
	)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<model::UserResponse>, RouteError> {
	let user = database
		.find_user(session.user_id)
		.await?
		.ok_or(Error::UnknownUser)?;

	Ok(Json(model::UserResponse {
		success: true,
		user,
	}))
}
