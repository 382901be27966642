//! Player error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Player errors.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("core error: {0}")]
    Core(#[from] chainflow_core::CoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no tokio runtime available to schedule playback")]
    NoRuntime,
}

impl PlayerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PlayerError::Core(e) => e.error_code(),
            PlayerError::Config(_) => "CONFIG_ERROR",
            PlayerError::NoRuntime => "NO_RUNTIME",
        }
    }
}
