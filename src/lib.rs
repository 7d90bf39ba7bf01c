pub mod config;
pub mod models;
pub mod pipeline;
pub mod correction;
pub mod reconcile;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, filtered by `RUST_LOG` or the build's default.
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} core v{}", config::APP_NAME, config::APP_VERSION);
    }
    installed
}
