use storefront_core::{NotAuthenticatedError, http::FetchError};
use storefront_state::SettingsError;
use thiserror::Error;

/// Failure of a cart or favorites operation. Unless it is [`ResourceError::SessionExpired`] the
/// session is untouched and the local collection has been restored.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[allow(missing_docs)]
    #[error(transparent)]
    Unauthenticated(#[from] NotAuthenticatedError),
    /// The session ended while the operation was in flight and the user must log in again.
    #[error("The session has expired, please log in again")]
    SessionExpired,
    #[allow(missing_docs)]
    #[error(transparent)]
    Fetch(FetchError),
    #[allow(missing_docs)]
    #[error("The {resource} doesn't support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },
    #[allow(missing_docs)]
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<FetchError> for ResourceError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::SessionExpired => ResourceError::SessionExpired,
            e => ResourceError::Fetch(e),
        }
    }
}
