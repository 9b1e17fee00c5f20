#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod ratelimit;
mod response;
mod route;
mod session;
mod trace;


use std::{str::FromStr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{Extension, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub use config::Config;
pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (if it's expensive to create),
/// or the process-wide configuration.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub config: Arc<Config>,
}

/// Opens the database, creating it if needed, and brings its schema up to date.
async fn connect(config: &Config) -> Result<Database, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(&config.database_url)?
		.create_if_missing(true)
		.foreign_keys(true);

	let database = SqlitePoolOptions::new()
		.max_connections(8)
		.connect_with(options)
		.await?;

	sqlx::migrate!().run(&database).await?;

	Ok(database)
}

/// Builds the full application router.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	let mut auth = route::auth::routes();
	let mut site = ApiRouter::new()
		.merge(route::posts::routes())
		.merge(route::follow::routes());

	if state.config.rate_limit {
		let default = ratelimit::default();
		let secure = ratelimit::secure();

		ratelimit::cleanup_old_limits(&[&default, &secure]);

		auth = auth.layer(GovernorLayer { config: secure });
		site = site.layer(GovernorLayer { config: default });
	}

	site.nest("/auth", auth)
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.fallback(error::not_found)
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(axum::middleware::from_fn(trace::record_latency)),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(&config);

	let state = State {
		database: connect(&config)
			.await
			.expect("failed to connect to database"),
		hasher: Argon2::default(),
		config: Arc::new(config),
	};

	let address = format!("{}:{}", state.config.host, state.config.port);
	let app = app(state);

	let listener = tokio::net::TcpListener::bind(address)
		.await
		.expect("failed to bind to port");

	tracing::info!(
		"listening on {}",
		listener.local_addr().expect("listener has an address")
	);

	// The rate limiter keys requests by peer address.
	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
	)
	.await
	.expect("server error");
}
