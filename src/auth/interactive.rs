use tracing::{debug, info};

use super::prompt::Prompter;
use crate::api::ApiError;
use crate::credentials::{CredentialStore, UserRecord};
use crate::error::{CliError, Result};

/// Total login attempts, the first one included.
pub const MAX_ATTEMPTS: u32 = 3;

/// Remote half of a login: trades a login and password for a session.
pub trait CredentialExchange {
    async fn exchange(&self, login: &str, password: &str) -> std::result::Result<UserRecord, ApiError>;
}

/// Steps of an interactive login. `attempt` counts from 1.
pub enum LoginState {
    PromptUsername { attempt: u32 },
    PromptPassword { attempt: u32, username: String },
    Authenticating { attempt: u32, username: String, password: String },
    RetryOrGiveUp { attempt: u32, cause: ApiError },
    Success(UserRecord),
    Canceled,
    Failed(CliError),
}

impl LoginState {
    pub fn initial() -> Self {
        LoginState::PromptUsername { attempt: 1 }
    }
}

/// Transition out of `RetryOrGiveUp`.
pub fn retry_or_give_up(attempt: u32, cause: ApiError, hint: &str) -> LoginState {
    if attempt < MAX_ATTEMPTS {
        LoginState::PromptUsername {
            attempt: attempt + 1,
        }
    } else {
        LoginState::Failed(CliError::AuthenticationFailed {
            hint: hint.to_string(),
            cause,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Credential key the new session is stored under.
    pub host: String,
    pub interactive: bool,
    /// Shown when every attempt failed.
    pub password_reset_url: String,
}

pub struct InteractiveAuthenticator<P, E> {
    prompter: P,
    exchange: E,
    store: CredentialStore,
    options: AuthOptions,
}

impl<P: Prompter, E: CredentialExchange> InteractiveAuthenticator<P, E> {
    pub fn new(prompter: P, exchange: E, store: CredentialStore, options: AuthOptions) -> Self {
        Self {
            prompter,
            exchange,
            store,
            options,
        }
    }

    /// Run the login flow to a terminal state and commit the new session.
    pub async fn authenticate(&mut self) -> Result<UserRecord> {
        if !self.options.interactive {
            return Err(CliError::NonInteractive);
        }

        let mut state = LoginState::initial();
        let user = loop {
            state = match self.step(state).await {
                LoginState::Success(user) => break user,
                LoginState::Canceled => return Err(CliError::UserCanceled),
                LoginState::Failed(err) => return Err(err),
                next => next,
            };
        };

        self.store.store(&self.options.host, &user)?;
        info!(host = %self.options.host, username = %user.username, "logged in");
        Ok(user)
    }

    /// Advance one transition. Terminal states are returned unchanged.
    pub async fn step(&mut self, state: LoginState) -> LoginState {
        match state {
            LoginState::PromptUsername { attempt } => match self.prompter.read_username() {
                Ok(None) => LoginState::Canceled,
                Ok(Some(line)) => {
                    let username = line.trim();
                    if username.is_empty() {
                        LoginState::PromptUsername { attempt }
                    } else {
                        LoginState::PromptPassword {
                            attempt,
                            username: username.to_string(),
                        }
                    }
                }
                Err(e) => LoginState::Failed(e.into()),
            },
            LoginState::PromptPassword { attempt, username } => {
                match self.prompter.read_password() {
                    Ok(password) => LoginState::Authenticating {
                        attempt,
                        username,
                        password,
                    },
                    Err(e) => LoginState::Failed(e.into()),
                }
            }
            LoginState::Authenticating {
                attempt,
                username,
                password,
            } => match self.exchange.exchange(&username, &password).await {
                Ok(user) => LoginState::Success(user),
                Err(cause) => {
                    debug!(attempt, error = ?cause, "login attempt failed");
                    self.prompter.notify(&format!(
                        "Fail to login (attempt {}/{}): {}",
                        attempt, MAX_ATTEMPTS, cause
                    ));
                    LoginState::RetryOrGiveUp { attempt, cause }
                }
            },
            LoginState::RetryOrGiveUp { attempt, cause } => {
                retry_or_give_up(attempt, cause, &self.options.password_reset_url)
            }
            terminal => terminal,
        }
    }
}
