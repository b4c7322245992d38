//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to the line printed on stderr before exiting with status 1.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProviderNotConfigured(_) | ApiError::ProviderAuthFailed(_) => {
            format!("{}\nCheck the [providers] table in your configuration.", e)
        }
        _ => e.to_string(),
    }
}
