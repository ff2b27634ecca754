use std::future::Future;

use tracing::{debug, warn};

use crate::api::{ApiError, PlatformClient};
use crate::auth::{AuthOptions, InteractiveAuthenticator, TerminalPrompter};
use crate::config::Config;
use crate::credentials::{CredentialStore, UserRecord};
use crate::error::{CliError, Result};

/// Authentication context of one CLI invocation.
///
/// Built once at startup from the credential file and handed to the commands
/// that need it.
pub struct Session {
    config: Config,
    store: CredentialStore,
    user: Option<UserRecord>,
}

impl Session {
    pub fn start(config: Config) -> Result<Self> {
        let store = CredentialStore::new(&config.auth_file);
        let user = match store.load(&config.api_host) {
            Ok(user) => user,
            Err(CliError::DataCorruption(reason)) => {
                warn!(%reason, "ignoring unreadable credential file");
                None
            }
            Err(CliError::UnsupportedVersion(version)) => {
                warn!(%version, "ignoring credential file written by a newer CLI");
                None
            }
            Err(e) => return Err(e),
        };
        debug!(
            host = %config.api_host,
            path = %store.path().display(),
            authenticated = user.is_some(),
            "session started"
        );

        Ok(Self {
            config,
            store,
            user,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Interactive login against the configured host; the new record replaces
    /// the current one.
    pub async fn login(&mut self) -> Result<&UserRecord> {
        let exchange = PlatformClient::new(&self.config.api_url)?;
        let options = AuthOptions {
            host: self.config.api_host.clone(),
            interactive: !self.config.disable_interactive,
            password_reset_url: self.config.password_reset_url.clone(),
        };

        let user = InteractiveAuthenticator::new(TerminalPrompter, exchange, self.store.clone(), options)
            .authenticate()
            .await?;
        Ok(self.user.insert(user))
    }

    /// Stored user, logging in first when there is none.
    pub async fn ensure_user(&mut self) -> Result<&UserRecord> {
        if self.user.is_none() {
            eprintln!("You need to be authenticated to use this command.");
            self.login().await?;
        }
        self.user.as_ref().ok_or_else(|| CliError::Unauthenticated {
            host: self.config.api_host.clone(),
        })
    }

    /// Client carrying the session token.
    pub async fn client(&mut self) -> Result<PlatformClient> {
        let api_url = self.config.api_url.clone();
        let user = self.ensure_user().await?;
        Ok(PlatformClient::authenticated(&api_url, user)?)
    }

    /// Run an API call with the session token. When the platform rejects the
    /// token, log in again and retry the call once.
    pub async fn with_client<T, F, Fut>(&mut self, call: F) -> Result<T>
    where
        F: Fn(PlatformClient) -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        match call(self.client().await?).await {
            Err(ApiError::Unauthorized) => {
                warn!(host = %self.config.api_host, "stored token rejected");
                eprintln!("Your session is no longer valid, please log in again.");
                self.user = None;
                self.login().await?;
                Ok(call(self.client().await?).await?)
            }
            result => Ok(result?),
        }
    }

    /// Returns whether a credential was removed.
    pub fn logout(&mut self) -> Result<bool> {
        self.user = None;
        self.store.remove(&self.config.api_host)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn config(dir: &tempfile::TempDir) -> Config {
        Config {
            api_url: "https://api.example.com".to_string(),
            api_host: "api.example.com".to_string(),
            auth_file: dir.path().join("auth.json"),
            disable_interactive: true,
            app: Some("web".to_string()),
            password_reset_url: "https://dashboard.example.com/password".to_string(),
        }
    }

    fn bob() -> UserRecord {
        UserRecord {
            username: "bob".to_string(),
            auth_token: "t".to_string(),
        }
    }

    #[test]
    fn picks_up_stored_user_for_configured_host() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().join("auth.json"));
        store.store("api.example.com", &bob()).unwrap();
        store
            .store(
                "api.other.com",
                &UserRecord {
                    username: "alice".to_string(),
                    auth_token: "a".to_string(),
                },
            )
            .unwrap();

        let session = Session::start(config(&dir)).unwrap();
        assert_eq!(session.user(), Some(&bob()));
    }

    #[test]
    fn corrupted_file_gives_blank_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("auth.json"), "{{{{").unwrap();

        let session = Session::start(config(&dir)).unwrap();
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn non_interactive_session_without_credentials_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::start(config(&dir)).unwrap();

        let err = session.client().await.err().unwrap();
        assert!(matches!(err, CliError::NonInteractive));
    }

    #[tokio::test]
    async fn stored_user_yields_authenticated_client() {
        let dir = tempfile::tempdir().expect("tempdir");
        CredentialStore::new(dir.path().join("auth.json"))
            .store("api.example.com", &bob())
            .unwrap();
        let mut session = Session::start(config(&dir)).unwrap();

        let client = session.client().await.unwrap();
        assert_eq!(client.token.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn rejected_token_triggers_login() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().join("auth.json"));
        store.store("api.example.com", &bob()).unwrap();
        let mut session = Session::start(config(&dir)).unwrap();
        let calls = std::cell::Cell::new(0);

        let err = session
            .with_client(|client| {
                calls.set(calls.get() + 1);
                async move {
                    assert_eq!(client.token.as_deref(), Some("t"));
                    Err::<(), _>(ApiError::Unauthorized)
                }
            })
            .await
            .unwrap_err();

        // Re-login was attempted, which the non-interactive config refuses.
        assert!(matches!(err, CliError::NonInteractive));
        assert_eq!(calls.get(), 1);
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn other_api_errors_keep_the_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        CredentialStore::new(dir.path().join("auth.json"))
            .store("api.example.com", &bob())
            .unwrap();
        let mut session = Session::start(config(&dir)).unwrap();

        let err = session
            .with_client(|_| async { Err::<(), _>(ApiError::NotFound("deployment 42".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Api(ApiError::NotFound(_))));
        assert_eq!(session.user(), Some(&bob()));

        let value = session
            .with_client(|client| async move { Ok(client.token.clone()) })
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("t"));
    }

    #[test]
    fn newer_credential_file_gives_blank_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("auth.json"),
            r#"{"version": "v2", "auth_config_per_host": {}}"#,
        )
        .unwrap();

        let session = Session::start(config(&dir)).unwrap();
        assert_eq!(session.user(), None);
    }

    #[test]
    fn logout_forgets_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().join("auth.json"));
        store.store("api.example.com", &bob()).unwrap();

        let mut session = Session::start(config(&dir)).unwrap();
        assert!(session.logout().unwrap());
        assert_eq!(session.user(), None);
        assert_eq!(store.load("api.example.com").unwrap(), None);
        assert!(!session.logout().unwrap());
    }
}
