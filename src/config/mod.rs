use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Environment variables with this prefix override any configuration value.
/// Nested keys are separated by a double underscore, e.g. `RADHUB_SERVICES__PATIENT__HOST`.
pub const ENV_PREFIX: &str = "RADHUB";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
	pub telemetry: TelemetryConfig,
	pub server: ServerConfig,
	pub pagination: PaginationConfig,
	/// Downstream domain services, keyed by their logical name.
	pub services: BTreeMap<String, ServiceClientConfig>,
}

impl AppConfig {
	/// Loads the configuration from the embedded defaults, an optional `config.toml` in the
	/// working directory and the environment, in that order of precedence.
	pub fn new() -> Result<Self, config::ConfigError> {
		Self::builder()
			.add_source(config::File::with_name("config.toml").required(false))
			.add_source(
				config::Environment::with_prefix(ENV_PREFIX)
					.prefix_separator("_")
					.separator("__"),
			)
			.build()?
			.try_deserialize()
	}

	/// Only the embedded defaults.
	pub fn defaults() -> Result<Self, config::ConfigError> {
		Self::builder().build()?.try_deserialize()
	}

	fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
		config::Config::builder().add_source(config::File::from_str(
			include_str!("defaults.toml"),
			config::FileFormat::Toml,
		))
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
	/// Configurable logging level. `RUST_LOG` takes precedence if set.
	#[serde(deserialize_with = "deserialize_level")]
	pub level: tracing::Level,
	/// Sentry DSN. Sentry stays disabled if this is not set.
	pub sentry: Option<String>,
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<tracing::Level, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;
	value.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	pub http: HttpServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
	/// The interface the HTTP server will be listening on
	pub interface: IpAddr,
	/// The port for the HTTP server
	pub port: u16,
	/// All routes are nested below this path.
	pub base_path: String,
	/// Request timeout in seconds
	pub request_timeout: u64,
	pub graceful_shutdown: bool,
	/// Maximum accepted request body size in bytes
	pub max_body_size: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationConfig {
	/// Page size used when a list request does not specify `limit`.
	pub default_limit: u32,
	/// Upper bound for `limit`. Larger values are rejected.
	pub max_limit: u32,
}

impl Default for PaginationConfig {
	fn default() -> Self {
		Self {
			default_limit: 10,
			max_limit: 100,
		}
	}
}

/// Connection settings of a downstream domain service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceClientConfig {
	pub transport: Transport,
	pub host: String,
	pub port: u16,
	/// Connect timeout in milliseconds
	#[serde(default = "default_connect_timeout")]
	pub connect_timeout: u64,
}

const fn default_connect_timeout() -> u64 {
	2000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
	Tcp,
}
