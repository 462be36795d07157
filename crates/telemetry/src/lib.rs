pub mod logger;

use thiserror::Error;

pub use logger::init;

#[derive(Debug, Error)]
pub enum TelemetryError {
	#[error("Invalid log level or filter: {0}. Use trace, debug, info, warn, error or target=level directives")]
	InvalidLogLevel(String),
}
