use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while setting up a client.
///
/// Failures of individual commands never surface here; they arrive as
/// [`resp::Reply::Invalid`] through the command's reply handle.
#[derive(Error, Debug)]
pub enum ClientError {
	#[error("Failed to connect to {addr}: {source}")]
	Connect {
		addr: String,
		source: std::io::Error,
	},

	#[error("Timed out connecting to {addr} after {timeout_ms}ms")]
	ConnectTimeout { addr: String, timeout_ms: u64 },

	#[error("Invalid address '{0}'")]
	InvalidAddress(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Config(#[from] ConfigError),
}
