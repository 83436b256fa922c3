#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod route;
mod store;
#[cfg(test)]
mod test;
mod token;
mod trace;

use std::{sync::Arc, time::Duration};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	body::Body,
	extract::Request,
	http::Response,
	Extension, Router, ServiceExt,
};
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing::Span;

use crate::{
	config::Config,
	store::{MemoryStore, PgStore},
	token::Keys,
};

pub type Database = Arc<dyn store::Store>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, a hash configuration (if it's expensive to create),
/// or the access token keys.
///
/// Nothing in here is mutated after startup.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: Arc<Keys>,
}

/// Builds the application router, including the `OpenAPI` document.
pub fn app(state: AppState) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/api/auth", route::auth::routes())
		.nest("/api/posts", route::post::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(TraceLayer::new_for_http().on_response(
			|response: &Response<Body>, latency: Duration, _span: &Span| {
				tracing::info!(
					histogram.latency_ms = latency.as_secs_f64() * 1000.0,
					status = response.status().as_u16(),
					"finished processing request"
				);
			},
		))
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard =
		trace::init_tracing_subscriber(config.otel_enabled).expect("failed to initialize tracing");

	let database: Database = if let Some(url) = &config.database_url {
		Arc::new(
			PgStore::connect(url)
				.await
				.expect("failed to connect to database"),
		)
	} else {
		tracing::warn!("DATABASE_URL is not set, posts are kept in memory");
		Arc::new(MemoryStore::default())
	};

	let state = State {
		database,
		hasher: Argon2::default(),
		keys: Arc::new(Keys::new(
			config.access_token_secret.as_bytes(),
			config.access_token_ttl,
		)),
	};

	// Applied outside of the router so that it runs before routing
	let app = NormalizePathLayer::trim_trailing_slash().layer(app(state));

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.expect("server error");
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}
