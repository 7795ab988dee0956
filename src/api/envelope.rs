use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, OriginalUri, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Header used to correlate a logical request across services and logs.
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Message returned for failures that must not leak internal details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}

impl FieldError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Typed failures raised below the response boundary.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("{}", join_field_errors(.0))]
	Validation(Vec<FieldError>),
	#[error("Missing caller role")]
	Unauthorized,
	#[error("Role {role} may not access {route}")]
	Forbidden { role: String, route: String },
	#[error("{resource} {id} not found")]
	NotFound { resource: &'static str, id: String },
	#[error("{0}")]
	Conflict(String),
	#[error("Method {method} is not allowed on {path}")]
	MethodNotAllowed { method: String, path: String },
	#[error("Request timed out")]
	Timeout,
	#[error("{0}")]
	PayloadTooLarge(String),
	#[error("{0}")]
	UnsupportedMediaType(String),
	#[error(transparent)]
	Internal(#[from] anyhow::Error),
}

fn join_field_errors(errors: &[FieldError]) -> String {
	if errors.is_empty() {
		return String::from("Validation failed");
	}
	errors
		.iter()
		.map(|error| format!("{} {}", error.field, error.message))
		.collect::<Vec<_>>()
		.join("; ")
}

impl ApiError {
	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation(vec![FieldError::new(field, message)])
	}

	pub const fn status_code(&self) -> StatusCode {
		match self {
			Self::Validation(_) => StatusCode::BAD_REQUEST,
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::Forbidden { .. } => StatusCode::FORBIDDEN,
			Self::NotFound { .. } => StatusCode::NOT_FOUND,
			Self::Conflict(_) => StatusCode::CONFLICT,
			Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
			Self::Timeout => StatusCode::REQUEST_TIMEOUT,
			Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
			Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
			Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		match rejection.status() {
			StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(rejection.body_text()),
			StatusCode::UNSUPPORTED_MEDIA_TYPE => Self::UnsupportedMediaType(rejection.body_text()),
			_ => Self::validation("body", rejection.body_text()),
		}
	}
}

/// The uniform outer shape of every response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub success: bool,
	pub data: Option<T>,
	pub status_code: u16,
	pub message: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<FieldError>,
	pub timestamp: DateTime<Utc>,
	pub path: String,
	pub method: String,
	pub trace_id: String,
}

/// Ambient information about the request being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
	pub method: String,
	pub path: String,
	pub trace_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let trace_id = parts
			.headers
			.get(&TRACE_ID_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

		// Nested routers see the uri without their prefix.
		let path = parts
			.extensions
			.get::<OriginalUri>()
			.map_or_else(|| parts.uri.path(), |uri| uri.0.path())
			.to_owned();

		Ok(Self {
			method: parts.method.to_string(),
			path,
			trace_id,
		})
	}
}

impl RequestContext {
	/// Translates the outcome of an operation into the response envelope.
	///
	/// This is the only place where results and failures are turned into the user-facing shape.
	pub fn respond<T: Serialize>(
		self,
		status: StatusCode,
		message: &str,
		result: Result<T, ApiError>,
	) -> Response {
		let envelope = match result {
			Ok(data) => self.envelope(status, message.to_owned(), Some(data), Vec::new()),
			Err(err) => self.failure(err),
		};

		let status = StatusCode::from_u16(envelope.status_code)
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let mut response = (status, Json(envelope)).into_response();
		if let Ok(value) = HeaderValue::from_str(&self.trace_id) {
			response.headers_mut().insert(TRACE_ID_HEADER, value);
		}
		response
	}

	fn failure<T>(&self, err: ApiError) -> ApiResponse<T> {
		let status = err.status_code();
		match err {
			ApiError::Validation(errors) => {
				let message = join_field_errors(&errors);
				warn!(trace_id = %self.trace_id, path = %self.path, "{message}");
				self.envelope(status, message, None, errors)
			}
			ApiError::Internal(source) => {
				error!(
					trace_id = %self.trace_id,
					path = %self.path,
					method = %self.method,
					"Request failed: {source:?}"
				);
				self.envelope(status, INTERNAL_ERROR_MESSAGE.to_owned(), None, Vec::new())
			}
			err => self.envelope(status, err.to_string(), None, Vec::new()),
		}
	}

	fn envelope<T>(
		&self,
		status: StatusCode,
		message: String,
		data: Option<T>,
		errors: Vec<FieldError>,
	) -> ApiResponse<T> {
		ApiResponse {
			success: status.is_success(),
			data,
			status_code: status.as_u16(),
			message,
			errors,
			timestamp: Utc::now(),
			path: self.path.clone(),
			method: self.method.clone(),
			trace_id: self.trace_id.clone(),
		}
	}
}

/// Answers requests that match no route.
pub async fn route_not_found(ctx: RequestContext) -> Response {
	let path = ctx.path.clone();
	ctx.respond::<()>(
		StatusCode::NOT_FOUND,
		"Route not found",
		Err(ApiError::NotFound {
			resource: "route",
			id: path,
		}),
	)
}

/// Answers requests to a known route with an unsupported method.
pub async fn method_not_allowed(ctx: RequestContext) -> Response {
	let err = ApiError::MethodNotAllowed {
		method: ctx.method.clone(),
		path: ctx.path.clone(),
	};
	ctx.respond::<()>(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", Err(err))
}

/// Wraps the bare response of an expired request timeout into the envelope.
pub async fn envelope_timeouts(ctx: RequestContext, req: Request, next: Next) -> Response {
	let response = next.run(req).await;
	if response.status() == StatusCode::REQUEST_TIMEOUT
		&& !response.headers().contains_key(header::CONTENT_TYPE)
	{
		return ctx.respond::<()>(
			StatusCode::REQUEST_TIMEOUT,
			"Request timed out",
			Err(ApiError::Timeout),
		);
	}
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::extract::DefaultBodyLimit;
	use axum::http::Request;
	use axum::routing::{get, post};
	use axum::Router;
	use http_body_util::BodyExt;
	use serde_json::{json, Value};
	use std::time::Duration;
	use tower::ServiceExt;
	use tower_http::timeout::TimeoutLayer;

	fn context() -> RequestContext {
		RequestContext {
			method: String::from("GET"),
			path: String::from("/api/patients"),
			trace_id: String::from("trace-1"),
		}
	}

	async fn body(response: Response) -> Value {
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn success_envelope() {
		let response = context().respond(StatusCode::OK, "OK", Ok(json!({ "id": 1 })));

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers()[&TRACE_ID_HEADER], "trace-1");

		let body = body(response).await;
		assert_eq!(body["success"], true);
		assert_eq!(body["data"], json!({ "id": 1 }));
		assert_eq!(body["statusCode"], 200);
		assert_eq!(body["message"], "OK");
		assert_eq!(body["path"], "/api/patients");
		assert_eq!(body["method"], "GET");
		assert_eq!(body["traceId"], "trace-1");
		assert!(body["timestamp"].is_string());
		assert!(body.get("errors").is_none());
	}

	#[tokio::test]
	async fn validation_failure_names_fields() {
		let err = ApiError::Validation(vec![
			FieldError::new("status", "must be one of: waiting, completed"),
			FieldError::new("page", "must be a positive integer"),
		]);
		let response = context().respond::<Value>(StatusCode::OK, "OK", Err(err));

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let body = body(response).await;
		assert_eq!(body["success"], false);
		assert_eq!(body["data"], Value::Null);
		assert_eq!(body["statusCode"], 400);
		assert_eq!(
			body["message"],
			"status must be one of: waiting, completed; page must be a positive integer"
		);
		assert_eq!(body["errors"][0]["field"], "status");
	}

	#[tokio::test]
	async fn internal_failure_hides_details() {
		let err = ApiError::Internal(anyhow::anyhow!("connection refused by 10.0.0.3:5432"));
		let response = context().respond::<Value>(StatusCode::OK, "OK", Err(err));

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		let body = body(response).await;
		assert_eq!(body["success"], false);
		assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
		assert!(!body.to_string().contains("10.0.0.3"));
	}

	#[tokio::test]
	async fn not_found_and_conflict_are_distinct() {
		let not_found = ApiError::NotFound {
			resource: "patient",
			id: String::from("42"),
		};
		let conflict = ApiError::Conflict(String::from("patientCode P-1 already exists"));

		let response = context().respond::<Value>(StatusCode::OK, "OK", Err(not_found));
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body(response).await["message"], "patient 42 not found");

		let response = context().respond::<Value>(StatusCode::OK, "OK", Err(conflict));
		assert_eq!(response.status(), StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn context_uses_trace_header() {
		let request = Request::get("/api/rooms?page=2")
			.header("x-trace-id", "abc")
			.body(())
			.unwrap();
		let (mut parts, ()) = request.into_parts();
		let ctx = RequestContext::from_request_parts(&mut parts, &())
			.await
			.unwrap();

		assert_eq!(ctx.trace_id, "abc");
		assert_eq!(ctx.path, "/api/rooms");
		assert_eq!(ctx.method, "GET");
	}

	#[tokio::test]
	async fn context_generates_trace_id() {
		let (mut parts, ()) = Request::get("/").body(()).unwrap().into_parts();
		let ctx = RequestContext::from_request_parts(&mut parts, &())
			.await
			.unwrap();

		assert!(Uuid::parse_str(&ctx.trace_id).is_ok());
	}

	#[tokio::test]
	async fn context_reports_path_before_nesting() {
		let app: Router = Router::new().nest(
			"/api",
			Router::new().route("/rooms", get(|ctx: RequestContext| async move { ctx.path })),
		);

		let response = app
			.oneshot(Request::get("/api/rooms?page=2").body(Body::empty()).unwrap())
			.await
			.unwrap();
		let bytes = response.into_body().collect().await.unwrap().to_bytes();

		assert_eq!(bytes, "/api/rooms");
	}

	fn echo_json() -> Router {
		Router::new()
			.route(
				"/echo",
				post(
					|ctx: RequestContext, payload: Result<Json<Value>, JsonRejection>| async move {
						let result = payload.map(|Json(value)| value).map_err(ApiError::from);
						ctx.respond(StatusCode::OK, "Echoed", result)
					},
				),
			)
			.layer(DefaultBodyLimit::max(16))
	}

	#[tokio::test]
	async fn oversized_body_is_payload_too_large() {
		let request = Request::post("/echo")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(json!({ "note": "x".repeat(64) }).to_string()))
			.unwrap();
		let response = echo_json().oneshot(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
		let body = body(response).await;
		assert_eq!(body["statusCode"], 413);
		assert_eq!(body["success"], false);
		assert!(body.get("errors").is_none());
	}

	#[tokio::test]
	async fn missing_content_type_is_unsupported_media_type() {
		let request = Request::post("/echo").body(Body::from("{}")).unwrap();
		let response = echo_json().oneshot(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
		assert_eq!(body(response).await["statusCode"], 415);
	}

	#[tokio::test]
	async fn malformed_body_is_validation_failure() {
		let request = Request::post("/echo")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from("{"))
			.unwrap();
		let response = echo_json().oneshot(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(body(response).await["errors"][0]["field"], "body");
	}

	#[tokio::test]
	async fn timeout_uses_envelope() {
		let app: Router = Router::new()
			.route(
				"/slow",
				get(|| async {
					tokio::time::sleep(Duration::from_secs(5)).await;
					"done"
				}),
			)
			.layer(TimeoutLayer::with_status_code(
				StatusCode::REQUEST_TIMEOUT,
				Duration::from_millis(10),
			))
			.layer(axum::middleware::from_fn(envelope_timeouts));

		let response = app
			.oneshot(Request::get("/slow").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
		let body = body(response).await;
		assert_eq!(body["message"], "Request timed out");
		assert_eq!(body["path"], "/slow");
		assert_eq!(body["method"], "GET");
	}
}
