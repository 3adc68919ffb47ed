//! Business logic shared by the HTTP handlers.

use thiserror::Error;

use crate::forms::FormError;
use crate::render::RenderError;
use crate::repository::errors::RepositoryError;
use crate::services::notifier::NotifyError;
use crate::services::photos::PhotoError;

pub mod clients;
pub mod notifier;
pub mod photos;
pub mod receipt;

/// Errors surfaced to the routes. `Form` is the caller's fault; everything
/// else is a server-side failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Form(String),

    #[error("photo processing failed: {0}")]
    Photo(String),

    #[error("receipt rendering failed: {0}")]
    Render(String),

    #[error("email delivery failed: {0}")]
    Notify(String),

    #[error("storage error: {0}")]
    Repository(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::Form(_))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        ServiceError::Repository(err.to_string())
    }
}

impl From<PhotoError> for ServiceError {
    fn from(err: PhotoError) -> Self {
        ServiceError::Photo(err.to_string())
    }
}

impl From<RenderError> for ServiceError {
    fn from(err: RenderError) -> Self {
        ServiceError::Render(err.to_string())
    }
}

impl From<NotifyError> for ServiceError {
    fn from(err: NotifyError) -> Self {
        ServiceError::Notify(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}
