//! Tracing setup for binaries embedding the gateway.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{GatewayError, Result};

/// Install a global `fmt` subscriber filtered by `filter`.
///
/// `RUST_LOG` takes precedence when set. Fails if the directive does not
/// parse or a global subscriber is already installed.
pub fn init_tracing(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| GatewayError::Config(format!("invalid log filter {filter:?}: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| GatewayError::Internal(format!("tracing already initialized: {e}")))
}
