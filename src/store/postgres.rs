use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};
use uuid::Uuid;

use super::{Error, Store};
use crate::route::{
	auth::model::User,
	post::model::{Owner, Post, PostFields, UnknownStatus},
};

/// A [`Store`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and applies any pending migrations.
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPool::connect(url).await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self::new(pool))
	}

	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[derive(FromRow)]
struct PostRow {
	id: Uuid,
	user_id: Uuid,
	title: String,
	description: String,
	url: String,
	status: String,
	created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
	type Error = UnknownStatus;

	fn try_from(row: PostRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			title: row.title,
			description: row.description,
			url: row.url,
			status: row.status.parse()?,
			user: row.user_id,
			created_at: row.created_at,
		})
	}
}

#[derive(FromRow)]
struct OwnedPostRow {
	#[sqlx(flatten)]
	post: PostRow,
	username: String,
}

impl TryFrom<OwnedPostRow> for Post<Owner> {
	type Error = UnknownStatus;

	fn try_from(row: OwnedPostRow) -> Result<Self, Self::Error> {
		let owner = Owner {
			id: row.post.user_id,
			username: row.username,
		};

		let post: Post = row.post.try_into()?;

		Ok(post.with_owner(owner))
	}
}

fn post(row: Option<PostRow>) -> Result<Option<Post>, Error> {
	Ok(row.map(Post::<Uuid>::try_from).transpose()?)
}

#[axum::async_trait]
impl Store for PgStore {
	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, username, password) VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(id)
		.bind(username)
		.bind(password)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) if d.constraint() == Some("user_username_key") => {
				Error::UsernameTaken
			}
			e => Error::Database(e),
		})
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn list_posts(&self, user_id: Uuid) -> Result<Vec<Post<Owner>>, Error> {
		let rows = sqlx::query_as::<_, OwnedPostRow>(
			r#"
				SELECT post.*, "user".username FROM post
				JOIN "user" ON "user".id = post.user_id
				WHERE post.user_id = $1
				ORDER BY post.created_at
			"#,
		)
		.bind(user_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(Post::<Owner>::try_from)
			.collect::<Result<_, _>>()?)
	}

	async fn create_post(&self, user_id: Uuid, fields: PostFields) -> Result<Post, Error> {
		let row = sqlx::query_as::<_, PostRow>(
			r#"
				INSERT INTO post (user_id, title, description, url, status)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(user_id)
		.bind(fields.title)
		.bind(fields.description)
		.bind(fields.url)
		.bind(fields.status.as_str())
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) if d.constraint() == Some("post_user_id_fkey") => {
				Error::UnknownOwner(user_id)
			}
			e => Error::Database(e),
		})?;

		Ok(row.try_into()?)
	}

	async fn update_post(
		&self,
		post_id: Uuid,
		user_id: Uuid,
		fields: PostFields,
	) -> Result<Option<Post>, Error> {
		let row = sqlx::query_as::<_, PostRow>(
			r#"
				UPDATE post
				SET title = $1, description = $2, url = $3, status = $4
				WHERE id = $5 AND user_id = $6
				RETURNING *
			"#,
		)
		.bind(fields.title)
		.bind(fields.description)
		.bind(fields.url)
		.bind(fields.status.as_str())
		.bind(post_id)
		.bind(user_id)
		.fetch_optional(&self.pool)
		.await?;

		post(row)
	}

	async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, Error> {
		let row = sqlx::query_as::<_, PostRow>(
			r#"
				DELETE FROM post
				WHERE id = $1 AND user_id = $2
				RETURNING *
			"#,
		)
		.bind(post_id)
		.bind(user_id)
		.fetch_optional(&self.pool)
		.await?;

		post(row)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::route::post::model::Status;

	fn fields(title: &str, status: Status) -> PostFields {
		PostFields {
			title: title.into(),
			description: String::new(),
			url: "https://golang.org".into(),
			status,
		}
	}

	#[sqlx::test]
	#[ignore = "requires a PostgreSQL database in DATABASE_URL"]
	async fn test_post_lifecycle(pool: PgPool) {
		let store = PgStore::new(pool);

		let alice = store
			.create_user(Uuid::new_v4(), "alice", b"hash")
			.await
			.unwrap();
		let bob = store
			.create_user(Uuid::new_v4(), "bob", b"hash")
			.await
			.unwrap();

		assert!(matches!(
			store.create_user(Uuid::new_v4(), "bob", b"hash").await,
			Err(Error::UsernameTaken)
		));

		assert!(matches!(
			store
				.create_post(Uuid::new_v4(), fields("orphan", Status::ToLearn))
				.await,
			Err(Error::UnknownOwner(..))
		));

		let post = store
			.create_post(alice.id, fields("Learn Go", Status::ToLearn))
			.await
			.unwrap();

		let listed = store.list_posts(alice.id).await.unwrap();

		assert_eq!(listed.len(), 1);
		assert_eq!(listed[0].user.username, "alice");
		assert!(store.list_posts(bob.id).await.unwrap().is_empty());

		assert!(store
			.update_post(post.id, bob.id, fields("mine now", Status::Learned))
			.await
			.unwrap()
			.is_none());

		let updated = store
			.update_post(post.id, alice.id, fields("Learn Rust", Status::Learning))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(updated.id, post.id);
		assert_eq!(updated.status, Status::Learning);

		assert!(store.delete_post(post.id, alice.id).await.unwrap().is_some());
		assert!(store.delete_post(post.id, alice.id).await.unwrap().is_none());
	}
}
