use std::{borrow::Cow, convert::Infallible};

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::PathRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::store;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Describes how a route-specific error is presented to the client.
///
/// Errors with a 5xx status never reach the client verbatim: they are logged
/// and replaced with a generic message.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	/// The message sent to the client.
	fn message(&self) -> Cow<'static, str> {
		self.to_string().into()
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	pub success: bool,
	pub message: Cow<'static, str>,
}

impl Message {
	pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			success: false,
			message: message.into(),
		}
	}
}

/// Errors shared by every route: extraction, validation and the store.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0:?}")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Path(..) => StatusCode::BAD_REQUEST,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn message(&self) -> Cow<'static, str> {
		match self {
			Self::Validation(errors) => validation_message(errors).into(),
			Self::Json(..) => "Invalid request body".into(),
			Self::Path(rejection) => rejection.body_text().into(),
			Self::Store(..) => INTERNAL_SERVER_ERROR.into(),
		}
	}
}

/// Picks the first field error message, falling back to its code.
fn validation_message(errors: &validator::ValidationErrors) -> String {
	let mut fields = errors.field_errors().into_iter().collect::<Vec<_>>();

	// field_errors is backed by a HashMap, so sort for a stable message
	fields.sort_by(|a, b| a.0.cmp(&b.0));

	fields
		.into_iter()
		.find_map(|(field, errors)| {
			errors.first().map(|error| match &error.message {
				Some(message) => message.to_string(),
				None => format!("{field}: {}", error.code),
			})
		})
		.unwrap_or_else(|| "Invalid request".to_string())
}

/// The error type returned by route handlers.
///
/// `E` is the error type of the route module, while [`AppError`] covers
/// everything that can fail before or below the handler.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	App(#[from] AppError),
	#[error(transparent)]
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<store::Error> for RouteError<E> {
	fn from(error: store::Error) -> Self {
		Self::App(AppError::Store(error))
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(AppError::Validation(errors))
	}
}

impl<E: ErrorShape> RouteError<E> {
	fn status(&self) -> StatusCode {
		match self {
			Self::App(error) => error.status(),
			Self::Route(error) => error.status(),
		}
	}

	fn message(&self) -> Cow<'static, str> {
		match self {
			Self::App(error) => error.message(),
			Self::Route(error) => error.message(),
		}
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed unexpectedly");

			return (status, Json(Message::new(INTERNAL_SERVER_ERROR))).into_response();
		}

		if let Self::App(AppError::Json(ref rejection)) = self {
			tracing::debug!(?rejection, "rejected request body");
		}

		(status, Json(Message::new(self.message()))).into_response()
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		RouteError::<Infallible>::App(self).into_response()
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = Message;
}

impl OperationOutput for AppError {
	type Inner = Message;
}

/// Rejections that can only come from [`AppError`] use [`Infallible`] as their route error.
impl ErrorShape for Infallible {
	fn status(&self) -> StatusCode {
		match *self {}
	}
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 1, message = "Title is required"))]
		title: String,
	}

	#[test]
	fn test_validation_message_uses_custom_message() {
		let errors = Input {
			title: String::new(),
		}
		.validate()
		.unwrap_err();

		assert_eq!(validation_message(&errors), "Title is required");
	}

	#[test]
	fn test_store_error_is_internal() {
		let error = AppError::Store(store::Error::Database(sqlx::Error::PoolClosed));

		assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(error.message(), INTERNAL_SERVER_ERROR);
	}
}
