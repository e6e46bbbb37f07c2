pub mod args;
pub mod report;
pub mod result;
pub mod run;
pub mod run_main;
pub mod settings;
pub mod sim;
pub mod sweep;
pub mod utils;

use tracing_subscriber::EnvFilter;

/// install the global subscriber, `RUST_LOG` overrides the default `info` level
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .unwrap_or_default();
}
