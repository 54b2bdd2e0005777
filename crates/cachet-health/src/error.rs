//! Engine error types.

use thiserror::Error;

/// Errors raised while initializing or reloading a monitor.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("monitor {0}: component id could not be retrieved")]
    NoComponent(String),

    #[error("status page error: {0}")]
    Api(#[from] cachet_api::ApiError),
}

pub type HealthResult<T> = Result<T, HealthError>;
