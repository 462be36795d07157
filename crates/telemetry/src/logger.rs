use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TelemetryError;

/// Local wall-clock time, "[YYYY-MM-DD HH:MM:SS.micros]".
struct LocalTime;

impl FormatTime for LocalTime {
	fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
		let now = chrono::Local::now();
		write!(w, "{}", now.format("[%Y-%m-%d %H:%M:%S%.6f]"))
	}
}

/// Parse a level or a full filter directive list such as
/// `"courier=debug,resp=trace,warn"`.
fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
	EnvFilter::try_new(level.trim().to_lowercase())
		.map_err(|_| TelemetryError::InvalidLogLevel(level.to_string()))
}

/// Install the process-wide logger.
///
/// Records go to stderr so replies printed on stdout stay machine-readable.
/// Records emitted through the `log` facade by the library crates are
/// forwarded as well. Colors are only used when stderr is a terminal.
///
/// A subscriber that is already installed is kept as is.
///
/// # Example
///
/// ```no_run
/// telemetry::logger::init("courier=debug,warn")?;
/// log::info!("client starting");
/// # Ok::<(), telemetry::TelemetryError>(())
/// ```
pub fn init(level: &str) -> Result<(), TelemetryError> {
	let filter = build_filter(level)?;

	let installed = tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(std::io::stderr().is_terminal())
				.with_timer(LocalTime)
				.with_target(true),
		)
		.try_init()
		.is_ok();

	if !installed {
		log::debug!("Logger already installed, keeping it");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("info")]
	#[case("DEBUG")]
	#[case(" warn ")]
	#[case("courier=debug,warn")]
	#[case("resp=trace,courier=info")]
	fn test_filter_accepts(#[case] level: &str) {
		assert!(build_filter(level).is_ok());
	}

	#[rstest]
	#[case("courier=loud")]
	#[case("info,resp=verbose")]
	#[case("courier=noisy,debug")]
	fn test_filter_rejects(#[case] level: &str) {
		assert!(matches!(
			build_filter(level),
			Err(TelemetryError::InvalidLogLevel(l)) if l == level
		));
	}

	#[test]
	fn test_init_rejects_bad_level_before_installing() {
		assert!(matches!(
			init("courier=loud"),
			Err(TelemetryError::InvalidLogLevel(_))
		));
	}
}
