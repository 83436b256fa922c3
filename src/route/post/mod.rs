use aide::axum::{
	routing::{get_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur while managing posts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The post does not exist or belongs to someone else. The two cases are
	/// reported identically so that post ids cannot be probed.
	#[error("Post not found or user not authorised")]
	UnknownPost,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			put_with(update_post, update_post_docs).delete_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost => StatusCode::UNAUTHORIZED,
		}
	}
}
