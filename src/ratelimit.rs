use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

pub type Limit = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// How often limiter storage is pruned of peers that have gone quiet.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// The limit applied to browsing and writing posts.
pub fn default() -> Limit {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quotas are non-zero"),
	)
}

/// The limit applied to signing up and logging in.
pub fn secure() -> Limit {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(1)
			.burst_size(5)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quotas are non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	crate::Error::from(error).into_response()
}

/// Periodically drops limiter state for peers that are no longer rate limited.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();

	std::thread::spawn(move || loop {
		std::thread::sleep(CLEANUP_INTERVAL);

		for limiter in &limiters {
			tracing::debug!(size = limiter.len(), "pruning rate limiter storage");

			limiter.retain_recent();
		}
	});
}
