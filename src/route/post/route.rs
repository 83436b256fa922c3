use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	Database,
};

use super::{model, Error, RouteError};

/// List posts
/// Returns every post you own, each with its owner's username.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<model::PostsResponse>, RouteError> {
	let posts = database.list_posts(session.user_id).await?;

	Ok(Json(model::PostsResponse::new(posts)))
}

/// Create post
/// Creates a new post. The url is prefixed with `https://` if it isn't already,
/// and the status defaults to `TO LEARN`.
#[route(tag = tag::POST, response(status = 400, description = "The title is missing."))]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::PostResponse>, RouteError> {
	let post = database
		.create_post(session.user_id, input.into_fields())
		.await?;

	Ok(Json(model::PostResponse::new(post).message("Happy learning!")))
}

/// Update post
/// Replaces the title, description, url and status of one of your posts.
/// Omitted fields are reset to their defaults.
#[route(tag = tag::POST, response(status = 401, description = "The post does not exist or is not yours."))]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::PostResponse>, RouteError> {
	let post = database
		.update_post(path.id, session.user_id, input.into_fields())
		.await?
		.ok_or(Error::UnknownPost)?;

	Ok(Json(
		model::PostResponse::new(post).message("Excellent progress!"),
	))
}

/// Delete post
/// Permanently deletes one of your posts, returning it.
#[route(tag = tag::POST, response(status = 401, description = "The post does not exist or is not yours."))]
pub async fn delete_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostResponse>, RouteError> {
	let post = database
		.delete_post(path.id, session.user_id)
		.await?
		.ok_or(Error::UnknownPost)?;

	Ok(Json(model::PostResponse::new(post)))
}
