use std::{env, str::FromStr};

/// Process-wide configuration, read once at startup.
///
/// Values come from the environment (optionally seeded from a `.env` file)
/// and are handed to the rest of the application through [`crate::State`].
#[derive(Debug, Clone)]
pub struct Config {
	/// The SQLite connection string. The file is created if it does not exist.
	pub database_url: String,
	pub host: String,
	pub port: u16,
	/// The number of posts shown on every feed page.
	pub posts_per_page: u32,
	/// Whether per-IP rate limiting is applied to incoming requests.
	pub rate_limit: bool,
	/// Whether traces and metrics are exported over OTLP.
	pub otlp: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} must be {expected}, got {value:?}")]
	Invalid {
		name: &'static str,
		expected: &'static str,
		value: String,
	},
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database_url: "sqlite://yatube.db".into(),
			host: "127.0.0.1".into(),
			port: 3000,
			posts_per_page: 10,
			rate_limit: true,
			otlp: false,
		}
	}
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable source,
	/// falling back to the defaults for anything that is not set.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let defaults = Self::default();

		let posts_per_page = match parse::<u32>(&lookup, "POSTS_PER_PAGE", "a positive integer")? {
			Some(0) => {
				return Err(Error::Invalid {
					name: "POSTS_PER_PAGE",
					expected: "a positive integer",
					value: "0".into(),
				})
			}
			Some(size) => size,
			None => defaults.posts_per_page,
		};

		Ok(Self {
			database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
			host: lookup("HOST").unwrap_or(defaults.host),
			port: parse(&lookup, "PORT", "a port number")?.unwrap_or(defaults.port),
			posts_per_page,
			rate_limit: parse(&lookup, "RATE_LIMIT", "true or false")?.unwrap_or(defaults.rate_limit),
			otlp: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").is_some_and(|endpoint| !endpoint.is_empty()),
		})
	}
}

fn parse<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	expected: &'static str,
) -> Result<Option<T>, Error> {
	lookup(name)
		.map(|value| {
			value.trim().parse().map_err(|_| Error::Invalid {
				name,
				expected,
				value,
			})
		})
		.transpose()
}
