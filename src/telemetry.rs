use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "cinematch=info";

/// Installs the global fmt subscriber, honouring `RUST_LOG` when set
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}
