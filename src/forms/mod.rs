//! Request payloads accepted by the routes.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod clients;
#[cfg(feature = "server")]
pub mod receipt;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid value: {0}")]
    Constraint(#[from] TypeConstraintError),

    #[error("too many photos: {given} (at most {max})")]
    TooManyPhotos { given: usize, max: usize },
}
