use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Installs the global tracing subscriber: INFO everywhere, debug for this
/// crate, and `RUST_LOG` on top of both.
pub fn init_logging() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("emreport=debug".parse().expect("valid log directive"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact());

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set up tracing subscriber");
}
