//! Connection settings of the downstream domain services and a reachability probe for each.

use crate::config::{ServiceClientConfig, Transport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceClient {
	pub name: String,
	pub transport: Transport,
	pub host: String,
	pub port: u16,
	#[serde(skip)]
	pub connect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
	#[error("Failed to connect: {0}")]
	Connect(#[from] std::io::Error),
}

impl ServiceClient {
	fn new(name: &str, config: &ServiceClientConfig) -> Self {
		Self {
			name: name.to_owned(),
			transport: config.transport,
			host: config.host.clone(),
			port: config.port,
			connect_timeout: Duration::from_millis(config.connect_timeout),
		}
	}

	pub fn address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Opens and immediately drops a connection to the service.
	/// Returns the time it took to establish the connection.
	pub async fn probe(&self) -> Result<Duration, ClientError> {
		let started = Instant::now();
		let connect = match self.transport {
			Transport::Tcp => TcpStream::connect(self.address()),
		};

		match tokio::time::timeout(self.connect_timeout, connect).await {
			Ok(Ok(_stream)) => {
				let elapsed = started.elapsed();
				debug!(client = %self.name, ?elapsed, "Service is reachable");
				Ok(elapsed)
			}
			Ok(Err(err)) => {
				warn!(client = %self.name, address = %self.address(), "Service is unreachable: {err}");
				Err(ClientError::Connect(err))
			}
			Err(_) => {
				warn!(client = %self.name, address = %self.address(), "Service did not answer in time");
				Err(ClientError::Timeout(self.connect_timeout))
			}
		}
	}
}

/// All configured service clients, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceClients {
	clients: Arc<BTreeMap<String, ServiceClient>>,
}

impl ServiceClients {
	pub fn new(configs: &BTreeMap<String, ServiceClientConfig>) -> Self {
		let clients = configs
			.iter()
			.map(|(name, config)| (name.clone(), ServiceClient::new(name, config)))
			.collect();

		Self {
			clients: Arc::new(clients),
		}
	}

	pub fn get(&self, name: &str) -> Option<&ServiceClient> {
		self.clients.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ServiceClient> {
		self.clients.values()
	}
}
