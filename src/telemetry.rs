use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Installs a compact console logger as the global default.
///
/// Meant for hosts without a subscriber of their own: call it once at process start, before
/// [`ProcessingAdapter::initialize`](crate::ProcessingAdapter::initialize), so the configuration
/// it resolves is logged. Passing [`AdapterConfig::log_level`](crate::AdapterConfig::log_level)
/// keeps our verbosity in line with the one handed to the inference application.
///
/// `level` is the default verbosity; `RUST_LOG` directives take precedence.
///
/// # Errors
/// Fails if a global subscriber has already been set.
pub fn init_logger(level: tracing::Level) -> Result<(), TryInitError> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::fmt::layer()
				.compact()
				.with_ansi(true)
				.with_file(false)
				.with_line_number(false)
				.with_target(false),
		)
		.with(
			EnvFilter::builder()
				.with_default_directive(LevelFilter::from_level(level).into())
				.from_env_lossy(),
		)
		.try_init()
}
