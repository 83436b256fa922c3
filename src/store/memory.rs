use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Error, Store};
use crate::route::{
	auth::model::User,
	post::model::{Owner, Post, PostFields},
};

/// A [`Store`] that keeps everything in process memory.
///
/// Used by the tests, and when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	users: HashMap<Uuid, User>,
	/// Posts in insertion order.
	posts: Vec<Post>,
}

impl Inner {
	fn owned_post(&self, post_id: Uuid, user_id: Uuid) -> Option<usize> {
		self.posts
			.iter()
			.position(|post| post.id == post_id && post.user == user_id)
	}
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User, Error> {
		let mut inner = self.inner.write().await;

		if inner.users.values().any(|user| user.username == username) {
			return Err(Error::UsernameTaken);
		}

		let user = User {
			id,
			password: password.to_vec(),
			username: username.to_owned(),
			created_at: Utc::now(),
		};

		inner.users.insert(id, user.clone());
		Ok(user)
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		Ok(self.inner.read().await.users.get(&id).cloned())
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		Ok(self
			.inner
			.read()
			.await
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn list_posts(&self, user_id: Uuid) -> Result<Vec<Post<Owner>>, Error> {
		let inner = self.inner.read().await;

		let Some(user) = inner.users.get(&user_id) else {
			return Ok(Vec::new());
		};

		let owner = Owner {
			id: user.id,
			username: user.username.clone(),
		};

		Ok(inner
			.posts
			.iter()
			.filter(|post| post.user == user_id)
			.map(|post| post.clone().with_owner(owner.clone()))
			.collect())
	}

	async fn create_post(&self, user_id: Uuid, fields: PostFields) -> Result<Post, Error> {
		let mut inner = self.inner.write().await;

		if !inner.users.contains_key(&user_id) {
			return Err(Error::UnknownOwner(user_id));
		}

		let post = Post {
			id: Uuid::new_v4(),
			title: fields.title,
			description: fields.description,
			url: fields.url,
			status: fields.status,
			user: user_id,
			created_at: Utc::now(),
		};

		inner.posts.push(post.clone());
		Ok(post)
	}

	async fn update_post(
		&self,
		post_id: Uuid,
		user_id: Uuid,
		fields: PostFields,
	) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		let Some(index) = inner.owned_post(post_id, user_id) else {
			return Ok(None);
		};

		let post = &mut inner.posts[index];

		post.title = fields.title;
		post.description = fields.description;
		post.url = fields.url;
		post.status = fields.status;

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		Ok(inner
			.owned_post(post_id, user_id)
			.map(|index| inner.posts.remove(index)))
	}
}
