use std::sync::Once;

use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::PathioError;
use crate::error::PathioResult;

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber for processes embedding pathio.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
/// The `ErrorLayer` lets [`PathioError`] capture span traces.
/// Repeated calls are no-ops once initialization has run.
pub fn init_tracing() -> PathioResult<()> {
    let mut init_result = Ok(());

    TRACING_INIT.call_once(|| {
        init_result = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(default_env_filter())
            .with(ErrorLayer::default())
            .try_init()
            .map_err(|error| {
                Box::new(PathioError::message(format!(
                    "failed to initialize tracing: {}",
                    error
                )))
            });
    });

    init_result
}

fn default_env_filter() -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    }
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn init_tracing_is_idempotent() {
        assert!(init_tracing().is_ok());
        assert!(init_tracing().is_ok());
    }
}
