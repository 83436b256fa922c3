use chrono::{Duration, Utc};
use jsonwebtoken::{errors::Error, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	#[serde(rename = "userId")]
	pub user_id: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// Signs and verifies HS256 access tokens.
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
}

impl Keys {
	pub fn new(secret: &[u8], ttl: Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			ttl,
		}
	}

	/// Issues a token for the user that expires after the configured lifetime.
	pub fn issue(&self, user_id: Uuid) -> Result<String, Error> {
		let now = Utc::now();
		let claims = Claims {
			user_id,
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
	}

	/// Checks the signature and expiry of a token.
	pub fn verify(&self, token: &str) -> Result<Claims, Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
			.map(|data| data.claims)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_round_trip() {
		let keys = Keys::new(b"secret", Duration::hours(1));
		let user_id = Uuid::new_v4();

		let claims = keys.verify(&keys.issue(user_id).unwrap()).unwrap();

		assert_eq!(claims.user_id, user_id);
	}

	#[test]
	fn test_foreign_signature() {
		let token = Keys::new(b"other", Duration::hours(1))
			.issue(Uuid::new_v4())
			.unwrap();

		assert!(Keys::new(b"secret", Duration::hours(1)).verify(&token).is_err());
	}

	#[test]
	fn test_expired() {
		// Past the default 60 second leeway
		let keys = Keys::new(b"secret", Duration::hours(-1));
		let token = keys.issue(Uuid::new_v4()).unwrap();

		assert!(keys.verify(&token).is_err());
	}
}
