use crate::api::{ApiError, RequestContext};
use crate::backend::clients::{ServiceClient, ServiceClients};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tracing::instrument;

pub fn routes<S>(clients: ServiceClients) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new()
		.route("/clients", get(all_clients))
		.route("/clients/{name}", get(client_health))
		.with_state(clients)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientHealth {
	#[serde(flatten)]
	client: ServiceClient,
	reachable: bool,
	latency_ms: Option<u128>,
	error: Option<String>,
}

#[instrument(skip_all)]
async fn all_clients(State(clients): State<ServiceClients>, ctx: RequestContext) -> Response {
	let clients: Vec<ServiceClient> = clients.iter().cloned().collect();
	ctx.respond(StatusCode::OK, "Service clients retrieved", Ok(clients))
}

#[instrument(skip_all)]
async fn client_health(
	State(clients): State<ServiceClients>,
	ctx: RequestContext,
	Path(name): Path<String>,
) -> Response {
	let result = match clients.get(&name) {
		Some(client) => {
			let health = match client.probe().await {
				Ok(latency) => ClientHealth {
					client: client.clone(),
					reachable: true,
					latency_ms: Some(latency.as_millis()),
					error: None,
				},
				Err(err) => ClientHealth {
					client: client.clone(),
					reachable: false,
					latency_ms: None,
					error: Some(err.to_string()),
				},
			};
			Ok(health)
		}
		None => Err(ApiError::NotFound {
			resource: "service client",
			id: name,
		}),
	};
	ctx.respond(StatusCode::OK, "Service client probed", result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{ServiceClientConfig, Transport};
	use axum::body::Body;
	use axum::http::Request;
	use http_body_util::BodyExt;
	use serde_json::Value;
	use std::collections::BTreeMap;
	use tokio::net::TcpListener;
	use tower::ServiceExt;

	fn app(port: u16) -> Router {
		let configs = BTreeMap::from([(
			String::from("imaging"),
			ServiceClientConfig {
				transport: Transport::Tcp,
				host: String::from("127.0.0.1"),
				port,
				connect_timeout: 1000,
			},
		)]);
		routes(ServiceClients::new(&configs))
	}

	async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
		let response = app
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		(status, serde_json::from_slice(&bytes).unwrap())
	}

	#[tokio::test]
	async fn lists_configured_clients() {
		let (status, body) = get(app(3003), "/clients").await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["data"][0]["name"], "imaging");
		assert_eq!(body["data"][0]["transport"], "tcp");
		assert_eq!(body["data"][0]["port"], 3003);
	}

	#[tokio::test]
	async fn probes_a_reachable_client() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();

		let (status, body) = get(app(port), "/clients/imaging").await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["data"]["reachable"], true);
		assert!(body["data"]["error"].is_null());
	}

	#[tokio::test]
	async fn unknown_client_is_not_found() {
		let (status, body) = get(app(3003), "/clients/billing").await;

		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["message"], "service client billing not found");
	}
}
