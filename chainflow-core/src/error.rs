//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the scenario model.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown scenario: {key}")]
    UnknownScenario { key: String },

    #[error("invalid scenario '{key}': {reason}")]
    InvalidScenario { key: String, reason: String },

    #[error("step {step} out of range: scenario has {total} step(s)")]
    StepOutOfRange { step: usize, total: usize },

    #[error("unsupported catalog format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Returns a stable code for display and scripting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::UnknownScenario { .. } => "UNKNOWN_SCENARIO",
            CoreError::InvalidScenario { .. } => "INVALID_SCENARIO",
            CoreError::StepOutOfRange { .. } => "STEP_OUT_OF_RANGE",
            CoreError::UnsupportedFormat { .. } => "BAD_REQUEST",
            CoreError::Io { .. } => "IO_ERROR",
            CoreError::Json(_) => "BAD_REQUEST",
            CoreError::Yaml(_) => "BAD_REQUEST",
        }
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidScenario {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CoreError::UnknownScenario {
            key: "xyz".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_SCENARIO");
        assert_eq!(err.to_string(), "unknown scenario: xyz");

        let err = CoreError::StepOutOfRange { step: 3, total: 3 };
        assert_eq!(err.error_code(), "STEP_OUT_OF_RANGE");
        assert_eq!(err.to_string(), "step 3 out of range: scenario has 3 step(s)");
    }
}
