use super::ResourceService;
use crate::api::validation::RawQuery;
use crate::api::{ApiError, RequestContext};
use crate::domain::Resource;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::{Query, QueryRejection};
use tracing::instrument;

/// HTTP Router for a single resource.
///
/// The router carries its own state and can be nested into a router with any state.
#[rustfmt::skip]
pub fn routes<R, S>(service: ResourceService<R>) -> Router<S>
where
	R: Resource,
	S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/{id}", get(find::<R>).patch(update::<R>).delete(remove::<R>))
        .route("/{id}/restore", post(restore::<R>))
        .with_state(service)
}

#[instrument(skip_all, fields(resource = R::NAME))]
async fn list<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	query: Result<Query<RawQuery>, QueryRejection>,
) -> Response {
	let result = match query {
		Ok(Query(raw)) => service.list(&raw).await,
		Err(rejection) => Err(ApiError::validation("query", rejection.to_string())),
	};
	ctx.respond(StatusCode::OK, "Records retrieved", result)
}

#[instrument(skip_all, fields(resource = R::NAME))]
async fn create<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	payload: Result<Json<R::Create>, JsonRejection>,
) -> Response {
	let result = match payload {
		Ok(Json(input)) => service.create(input).await,
		Err(rejection) => Err(rejection.into()),
	};
	ctx.respond(StatusCode::CREATED, "Record created", result)
}

#[instrument(skip_all, fields(resource = R::NAME, id = tracing::field::Empty))]
async fn find<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	Path(id): Path<String>,
) -> Response {
	tracing::Span::current().record("id", id.as_str());
	let result = service.get(&id).await;
	ctx.respond(StatusCode::OK, "Record retrieved", result)
}

#[instrument(skip_all, fields(resource = R::NAME, id = tracing::field::Empty))]
async fn update<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	Path(id): Path<String>,
	payload: Result<Json<R::Update>, JsonRejection>,
) -> Response {
	tracing::Span::current().record("id", id.as_str());
	let result = match payload {
		Ok(Json(update)) => service.update(&id, update).await,
		Err(rejection) => Err(rejection.into()),
	};
	ctx.respond(StatusCode::OK, "Record updated", result)
}

#[instrument(skip_all, fields(resource = R::NAME, id = tracing::field::Empty))]
async fn remove<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	Path(id): Path<String>,
) -> Response {
	tracing::Span::current().record("id", id.as_str());
	let result = service.delete(&id).await;
	ctx.respond(StatusCode::OK, "Record deleted", result)
}

#[instrument(skip_all, fields(resource = R::NAME, id = tracing::field::Empty))]
async fn restore<R: Resource>(
	State(service): State<ResourceService<R>>,
	ctx: RequestContext,
	Path(id): Path<String>,
) -> Response {
	tracing::Span::current().record("id", id.as_str());
	let result = service.restore(&id).await;
	ctx.respond(StatusCode::OK, "Record restored", result)
}
