use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{error::RouteError, openapi::SECURITY_SCHEME_BEARER, route::auth, token::Keys};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Extracts the authenticated user from the bearer token of the request.
///
/// If there is no token, a [`auth::Error::MissingToken`] is returned.
/// If the token is invalid or expired, a [`auth::Error::InvalidToken`] is returned.
///
/// The token alone identifies the caller, so this never touches the store.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{}", session.user_id);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user_id: Uuid,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Arc<Keys>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.filter(|token| !token.is_empty())
			.ok_or(auth::Error::MissingToken)?;

		let claims = Arc::<Keys>::from_ref(state).verify(token).map_err(|error| {
			tracing::debug!(%error, "rejected access token");
			auth::Error::InvalidToken
		})?;

		Ok(Self {
			user_id: claims.user_id,
		})
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
