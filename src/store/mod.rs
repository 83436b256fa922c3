mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use uuid::Uuid;

use crate::route::{
	auth::model::User,
	post::model::{Owner, Post, PostFields, UnknownStatus},
};

/// An error raised by a [`Store`].
///
/// Apart from [`Error::UsernameTaken`], these are never shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("username already taken")]
	UsernameTaken,
	#[error("no user {0} to own the post")]
	UnknownOwner(Uuid),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("corrupt record: {0}")]
	Corrupt(#[from] UnknownStatus),
}

/// Persistence for users and their posts.
///
/// Every post operation is scoped to its owner: a post that exists but belongs
/// to someone else is reported exactly like one that does not exist.
/// Each mutating call is a single atomic write.
#[axum::async_trait]
pub trait Store: Send + Sync + 'static {
	/// Inserts a new user, failing with [`Error::UsernameTaken`] if the username is in use.
	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User, Error>;

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error>;

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

	/// Returns every post owned by `user_id`, oldest first, with the owner's username.
	async fn list_posts(&self, user_id: Uuid) -> Result<Vec<Post<Owner>>, Error>;

	/// Inserts a new post, failing with [`Error::UnknownOwner`] if `user_id` does not exist.
	async fn create_post(&self, user_id: Uuid, fields: PostFields) -> Result<Post, Error>;

	/// Replaces the mutable fields of a post, returning `None` if `user_id` owns no such post.
	async fn update_post(
		&self,
		post_id: Uuid,
		user_id: Uuid,
		fields: PostFields,
	) -> Result<Option<Post>, Error>;

	/// Deletes a post, returning `None` if `user_id` owns no such post.
	async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, Error>;
}
