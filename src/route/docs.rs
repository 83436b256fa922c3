use std::sync::Arc;

use aide::{
	axum::{routing::get, ApiRouter, IntoApiResponse},
	openapi::OpenApi,
};
use axum::{response::IntoResponse, Extension};

use crate::extract::Json;

/// Serves the generated `OpenAPI` document, which is provided as an [`Extension`].
pub fn routes<S>() -> ApiRouter<S>
where
	S: Clone + Send + Sync + 'static,
{
	ApiRouter::new().route("/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}
