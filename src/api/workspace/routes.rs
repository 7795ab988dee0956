use super::{RoleResolver, Workspace};
use crate::api::validation::RawQuery;
use crate::api::{ApiError, RequestContext};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::{Query, QueryRejection};
use std::sync::Arc;
use tracing::instrument;

pub fn routes<S>(resolver: Arc<dyn RoleResolver>) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new()
		.route("/workspace", get(workspace))
		.with_state(resolver)
}

#[instrument(skip_all)]
async fn workspace(
	State(resolver): State<Arc<dyn RoleResolver>>,
	ctx: RequestContext,
	headers: HeaderMap,
	query: Result<Query<RawQuery>, QueryRejection>,
) -> Response {
	let result = compose(resolver.as_ref(), &headers, query).await;
	ctx.respond(StatusCode::OK, "Workspace composed", result)
}

async fn compose(
	resolver: &dyn RoleResolver,
	headers: &HeaderMap,
	query: Result<Query<RawQuery>, QueryRejection>,
) -> Result<Workspace, ApiError> {
	// Resolve the caller before looking at the requested route.
	let role = resolver.resolve(headers).await?;
	let Query(raw) = query.map_err(|rejection| ApiError::validation("query", rejection.to_string()))?;
	let route = raw
		.get("route")
		.map(|route| route.trim())
		.filter(|route| !route.is_empty());

	Workspace::compose(role, route)
}
