//! Tracing setup for binaries embedding the client.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "WEFT_LOG";

/// Installs a global fmt subscriber.
///
/// `WEFT_LOG` takes precedence; otherwise `verbose` selects debug output for
/// the weft crates. A subscriber installed earlier is left in place.
pub fn setup_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
	if tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init()
		.is_err()
	{
		tracing::debug!("logging.already_initialized");
	}
}

fn default_directives(verbose: bool) -> &'static str {
	if verbose {
		"info,weft_client=debug,weft_dispatch=debug,weft_command=debug,weft_feedback=debug,weft_selection=debug"
	} else {
		"warn,weft_client=info"
	}
}
