use tracing_subscriber::EnvFilter;

pub mod plot;

/// install a fmt subscriber for tests, a second call is a no-op
pub fn init_log(default_value: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_value));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .unwrap_or_default();
}
