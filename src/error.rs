//! Error taxonomy shared by the credential store, the login flow and the
//! command layer.

use std::error::Error as StdError;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Not logged in to {host}, run `paas login` first")]
    Unauthenticated { host: String },

    #[error("Authentication failed. Forgot your password? {hint}")]
    AuthenticationFailed {
        hint: String,
        #[source]
        cause: ApiError,
    },

    #[error("Login canceled by user")]
    UserCanceled,

    #[error("Fail to login (interactive mode disabled)")]
    NonInteractive,

    #[error("Credential file is corrupted: {0}")]
    DataCorruption(String),

    #[error("Credential file format {0:?} is newer than this CLI supports, please upgrade")]
    UnsupportedVersion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::DataCorruption(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

fn hides_cause(err: &(dyn StdError + 'static)) -> bool {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.is_masked();
    }
    matches!(err.downcast_ref::<CliError>(), Some(CliError::Api(api)) if api.is_masked())
}

/// Render an error chain for the terminal, stopping at the first error whose
/// cause must not be shown to the user.
pub fn user_message(err: &anyhow::Error) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        parts.push(cause.to_string());
        if hides_cause(cause) {
            break;
        }
    }
    parts.join(": ")
}
