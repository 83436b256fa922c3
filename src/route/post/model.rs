pub use crate::route::model::IdInput;

use std::{borrow::Cow, str::FromStr};

use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::route::model::{into_result, require_text};

/// Prefix every stored url starts with.
pub const URL_PREFIX: &str = "https://";

/// How far along the owner is with a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Status {
	#[default]
	#[serde(rename = "TO LEARN")]
	ToLearn,
	#[serde(rename = "LEARNING")]
	Learning,
	#[serde(rename = "LEARNED")]
	Learned,
}

impl Status {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ToLearn => "TO LEARN",
			Self::Learning => "LEARNING",
			Self::Learned => "LEARNED",
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown post status {0:?}")]
pub struct UnknownStatus(String);

impl FromStr for Status {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"TO LEARN" => Ok(Self::ToLearn),
			"LEARNING" => Ok(Self::Learning),
			"LEARNED" => Ok(Self::Learned),
			_ => Err(UnknownStatus(s.to_owned())),
		}
	}
}

/// A single learning resource, owned by a user.
///
/// `U` is the owner: its id when returned from a write, or an [`Owner`] when listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Post<U = Uuid> {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The title of the post.
	pub title: String,
	/// Free-form notes about the resource.
	pub description: String,
	/// Link to the resource, always `https://` when present.
	pub url: String,
	/// Learning progress.
	pub status: Status,
	/// The user that owns the post.
	pub user: U,
	/// The creation time of the post.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
	pub fn with_owner(self, owner: Owner) -> Post<Owner> {
		Post {
			id: self.id,
			title: self.title,
			description: self.description,
			url: self.url,
			status: self.status,
			user: owner,
			created_at: self.created_at,
		}
	}
}

/// The public view of a post's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Owner {
	pub id: Uuid,
	pub username: String,
}

/// Body of the create and update routes.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PostInput {
	/// The title of the post, required.
	pub title: Option<String>,
	/// Defaults to an empty string.
	pub description: Option<String>,
	/// Prefixed with `https://` if it isn't already.
	pub url: Option<String>,
	/// Defaults to `TO LEARN`, as does an empty string.
	#[serde(default, deserialize_with = "empty_as_none")]
	#[schemars(with = "Option<StatusInput>")]
	pub status: Option<Status>,
}

/// The values accepted for [`PostInput::status`].
#[derive(JsonSchema)]
#[allow(dead_code)]
enum StatusInput {
	#[schemars(rename = "TO LEARN")]
	ToLearn,
	#[schemars(rename = "LEARNING")]
	Learning,
	#[schemars(rename = "LEARNED")]
	Learned,
	#[schemars(rename = "")]
	Empty,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<String>::deserialize(deserializer)?.as_deref() {
		None | Some("") => Ok(None),
		Some(status) => status.parse().map(Some).map_err(de::Error::custom),
	}
}

impl Validate for PostInput {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::new();

		require_text(
			&mut errors,
			"title",
			self.title.as_deref(),
			"Title is required",
		);

		into_result(errors)
	}
}

/// The mutable fields of a post, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
	pub title: String,
	pub description: String,
	pub url: String,
	pub status: Status,
}

impl PostInput {
	/// Applies defaults and normalizes the url.
	///
	/// The input is expected to be validated already.
	pub fn into_fields(self) -> PostFields {
		PostFields {
			title: self.title.unwrap_or_default(),
			description: self.description.unwrap_or_default(),
			url: normalize_url(self.url.unwrap_or_default()),
			status: self.status.unwrap_or_default(),
		}
	}
}

/// Prepends [`URL_PREFIX`] to non-empty urls that lack it.
pub fn normalize_url(url: String) -> String {
	if url.is_empty() || url.starts_with(URL_PREFIX) {
		url
	} else {
		format!("{URL_PREFIX}{url}")
	}
}

#[derive(Serialize, JsonSchema)]
pub struct PostsResponse {
	pub success: bool,
	pub posts: Vec<Post<Owner>>,
}

impl PostsResponse {
	pub fn new(posts: Vec<Post<Owner>>) -> Self {
		Self {
			success: true,
			posts,
		}
	}
}

#[derive(Serialize, JsonSchema)]
pub struct PostResponse {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<Cow<'static, str>>,
	pub post: Post,
}

impl PostResponse {
	pub fn new(post: Post) -> Self {
		Self {
			success: true,
			message: None,
			post,
		}
	}

	#[must_use]
	pub fn message(mut self, message: &'static str) -> Self {
		self.message = Some(message.into());
		self
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn input(value: serde_json::Value) -> PostInput {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn test_normalize_url() {
		assert_eq!(normalize_url("golang.org".into()), "https://golang.org");
		assert_eq!(
			normalize_url("https://golang.org".into()),
			"https://golang.org"
		);
		assert_eq!(normalize_url(String::new()), "");
	}

	#[test]
	fn test_defaults() {
		let fields = input(serde_json::json!({ "title": "Learn Go", "url": "golang.org" }))
			.into_fields();

		assert_eq!(
			fields,
			PostFields {
				title: "Learn Go".into(),
				description: String::new(),
				url: "https://golang.org".into(),
				status: Status::ToLearn,
			}
		);
	}

	#[test]
	fn test_title_is_required() {
		for value in [
			serde_json::json!({}),
			serde_json::json!({ "title": null }),
			serde_json::json!({ "title": "" }),
		] {
			let errors = input(value).validate().unwrap_err();

			assert!(errors.field_errors().contains_key("title"));
		}

		assert!(input(serde_json::json!({ "title": "t" })).validate().is_ok());
	}

	#[test]
	fn test_status_strings() {
		for status in [Status::ToLearn, Status::Learning, Status::Learned] {
			assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
			assert_eq!(
				serde_json::to_value(status).unwrap(),
				serde_json::json!(status.as_str())
			);
		}

		assert!("DONE".parse::<Status>().is_err());
	}

	#[test]
	fn test_empty_status_is_default() {
		for value in [
			serde_json::json!({ "title": "t" }),
			serde_json::json!({ "title": "t", "status": null }),
			serde_json::json!({ "title": "t", "status": "" }),
		] {
			assert_eq!(input(value).into_fields().status, Status::ToLearn);
		}

		let learned = input(serde_json::json!({ "title": "t", "status": "LEARNED" }));

		assert_eq!(learned.status, Some(Status::Learned));
		assert!(serde_json::from_value::<PostInput>(
			serde_json::json!({ "title": "t", "status": "DONE" })
		)
		.is_err());
	}
}
