use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

use super::{api::ApiError, pipeline::RenderError, registry::RegistryError};

/// Top-level failure reported by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("page `{0}` not found")]
    PageNotFound(String),
    #[error("page `{page}` failed to render")]
    RootFailed { page: String },
}
