use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset error: {message}")]
    Asset { message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn asset(message: impl Into<String>) -> Self {
        Self::Asset {
            message: message.into(),
        }
    }

    pub fn unreadable(path: &Path, err: std::io::Error) -> Self {
        Self::asset(format!("failed to read `{}`: {err}", path.display()))
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
