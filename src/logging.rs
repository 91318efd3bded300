use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "sales_report=info";

/// Initializes stderr logging. `RUST_LOG` overrides the default level; stdout
/// is left to the report paths printed by the binary.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "sales_report=debug" } else { DEFAULT_DIRECTIVE };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A second call (e.g. from tests) keeps the subscriber that is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
