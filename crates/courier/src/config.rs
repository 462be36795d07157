//! Configuration for the client and its command-line front end
//!
//! A [`ClientConfig`] comes from a TOML, JSON or YAML file, falls back to
//! defaults for anything missing, and is then overridden by explicit CLI
//! flags.
//!
//! # Example
//!
//! ```no_run
//! use courier::config::Cli;
//! use courier::config::Parser;
//! use courier::config::setup;
//!
//! let args = Cli::parse();
//! let config = setup(&args).unwrap();
//! println!("Connecting to {}", config.addr());
//! ```

use std::path::Path;

pub use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to read configuration file '{path}': {source}")]
	Io {
		source: std::io::Error,
		path: String,
	},

	#[error("Failed to parse TOML configuration: {0}")]
	TomlParse(#[from] toml::de::Error),

	#[error("Failed to parse JSON configuration: {0}")]
	JsonParse(#[from] serde_json::Error),

	#[error("Failed to parse YAML configuration: {0}")]
	YamlParse(#[from] serde_yaml::Error),

	#[error("Unsupported configuration format: {0}")]
	UnsupportedFormat(String),

	#[error("Configuration file has no extension")]
	NoExtension,

	#[error(transparent)]
	Logging(#[from] telemetry::TelemetryError),
}

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	/// Configuration file path (TOML, JSON, or YAML).
	/// Defaults to conf/courier.toml if it exists.
	#[arg(short, long)]
	pub config: Option<String>,

	/// Server host
	#[arg(long)]
	pub host: Option<String>,

	/// Server port
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Log level or filter directives, e.g. `debug` or `courier=debug,warn`
	#[arg(short, long)]
	pub log_level: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
	/// Run one command and print its reply
	Exec {
		#[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
		args: Vec<String>,
	},
	/// Run commands read from stdin, one per line, as a single batch
	Pipeline,
	/// Print messages published to the given channels
	Subscribe {
		#[arg(required = true)]
		channels: Vec<String>,
	},
	/// Print messages published to channels matching the given patterns
	Psubscribe {
		#[arg(required = true)]
		patterns: Vec<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
	pub host: String,
	pub port: u16,
	/// `None` waits for the OS connect timeout.
	pub connect_timeout_ms: Option<u64>,
	pub nodelay: bool,
	/// Longest reply line the decoder accepts.
	pub max_line_len: usize,
	/// Messages a subscription listener buffers before it waits for the
	/// consumer.
	pub pubsub_capacity: usize,
	pub log_level: String,
}

impl ClientConfig {
	pub fn addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 6379,
			connect_timeout_ms: Some(5000),
			nodelay: true,
			max_line_len: resp::DEFAULT_MAX_LINE_LEN,
			pubsub_capacity: 64,
			log_level: "info".into(),
		}
	}
}

/// Resolve the effective configuration and initialize logging with it.
pub fn setup(args: &Cli) -> Result<ClientConfig, ConfigError> {
	let default_config = "conf/courier.toml";
	let mut config = match args.config.as_deref() {
		Some(p) => load_from_file(p)?,
		None if Path::new(default_config).exists() => load_from_file(default_config)?,
		None => ClientConfig::default(),
	};

	// Override with CLI arguments if explicitly provided
	if let Some(host) = &args.host {
		config.host = host.clone();
	}
	if let Some(port) = args.port {
		config.port = port;
	}
	if let Some(log_level) = &args.log_level {
		config.log_level = log_level.clone();
	}

	telemetry::logger::init(&config.log_level)?;
	Ok(config)
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
	let path_ref = path.as_ref();
	let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
		path: path_ref.display().to_string(),
		source,
	})?;

	let extension = path_ref
		.extension()
		.and_then(|ext| ext.to_str())
		.ok_or(ConfigError::NoExtension)?;

	match extension.to_lowercase().as_str() {
		"toml" => Ok(toml::from_str(&content)?),
		"json" => Ok(serde_json::from_str(&content)?),
		"yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
		_ => Err(ConfigError::UnsupportedFormat(extension.to_string())),
	}
}
