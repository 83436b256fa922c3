use std::{fmt::Display, net::IpAddr, str::FromStr};

use chrono::Duration;

/// An invalid or missing environment variable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} is invalid ({value:?}): {reason}")]
	Invalid {
		name: &'static str,
		value: String,
		reason: String,
	},
}

/// Settings read from the environment.
pub struct Config {
	/// Unset selects the in-memory store.
	pub database_url: Option<String>,
	pub host: IpAddr,
	pub port: u16,
	pub access_token_secret: String,
	pub access_token_ttl: Duration,
	/// Export traces and metrics over OTLP.
	pub otel_enabled: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the config from `lookup`, which maps a variable name to its value.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

		Ok(Self {
			database_url: var("DATABASE_URL"),
			host: parse("HOST", var("HOST"), IpAddr::from([127, 0, 0, 1]))?,
			port: parse("PORT", var("PORT"), 5000)?,
			access_token_secret: var("ACCESS_TOKEN_SECRET")
				.ok_or(Error::Missing("ACCESS_TOKEN_SECRET"))?,
			access_token_ttl: Duration::hours(parse(
				"ACCESS_TOKEN_TTL_HOURS",
				var("ACCESS_TOKEN_TTL_HOURS"),
				24,
			)?),
			otel_enabled: parse_flag("OTEL_ENABLED", var("OTEL_ENABLED"))?,
		})
	}
}

fn parse<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, Error>
where
	T: FromStr,
	T::Err: Display,
{
	let Some(value) = value else {
		return Ok(default);
	};

	value.parse().map_err(|e: T::Err| Error::Invalid {
		name,
		reason: e.to_string(),
		value,
	})
}

fn parse_flag(name: &'static str, value: Option<String>) -> Result<bool, Error> {
	let Some(value) = value else {
		return Ok(false);
	};

	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(Error::Invalid {
			name,
			value,
			reason: "expected a boolean".into(),
		}),
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars = vars
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[("ACCESS_TOKEN_SECRET", "secret")]).unwrap();

		assert!(config.database_url.is_none());
		assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
		assert_eq!(config.port, 5000);
		assert_eq!(config.access_token_ttl, Duration::hours(24));
		assert!(!config.otel_enabled);
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("ACCESS_TOKEN_SECRET", "secret"),
			("DATABASE_URL", "postgres://localhost/learnit"),
			("HOST", "0.0.0.0"),
			("PORT", "8080"),
			("ACCESS_TOKEN_TTL_HOURS", "2"),
			("OTEL_ENABLED", "TRUE"),
		])
		.unwrap();

		assert_eq!(
			config.database_url.as_deref(),
			Some("postgres://localhost/learnit")
		);
		assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
		assert_eq!(config.port, 8080);
		assert_eq!(config.access_token_ttl, Duration::hours(2));
		assert!(config.otel_enabled);
	}

	#[test]
	fn test_secret_is_required() {
		assert!(matches!(
			config(&[("ACCESS_TOKEN_SECRET", "")]),
			Err(Error::Missing("ACCESS_TOKEN_SECRET"))
		));
	}

	#[test]
	fn test_invalid_port() {
		let error = config(&[("ACCESS_TOKEN_SECRET", "secret"), ("PORT", "http")])
			.err()
			.unwrap();

		assert!(matches!(error, Error::Invalid { name: "PORT", .. }));
	}
}
