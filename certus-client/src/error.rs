//! Client error types.

use crate::config::ConfigError;
use certus_core::CertusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to init tracing subscriber: {0}")]
    Telemetry(String),

    #[error(transparent)]
    Sync(#[from] CertusError),
}

pub type ClientResult<T> = Result<T, ClientError>;
