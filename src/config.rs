//! Runtime configuration resolved from flags, environment and defaults.
//!
//! The credential file defaults to `~/.config/paas/auth.json` (per-platform
//! config directory from `dirs`).

use std::path::PathBuf;

use reqwest::Url;

use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};

/// Application name used for config directory paths
const APP_NAME: &str = "paas";

/// Credential file name
const AUTH_FILE: &str = "auth.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Key under which credentials for `api_url` are stored.
    pub api_host: String,
    pub auth_file: PathBuf,
    pub disable_interactive: bool,
    pub app: Option<String>,
    pub password_reset_url: String,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let api_url = args.api_url.trim_end_matches('/').to_string();
        let api_host = api_host(&api_url)?;
        let auth_file = match &args.auth_file {
            Some(path) => path.clone(),
            None => Self::default_auth_file()?,
        };

        Ok(Self {
            api_url,
            api_host,
            auth_file,
            disable_interactive: args.no_interactive,
            app: args.app.clone().filter(|app| !app.is_empty()),
            password_reset_url: args.password_reset_url.clone(),
        })
    }

    fn default_auth_file() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(AUTH_FILE))
    }

    pub fn require_app(&self) -> Result<&str> {
        self.app
            .as_deref()
            .ok_or_else(|| CliError::config("no application given, use --app <name> or set PAAS_APP"))
    }
}

/// Host part of the API URL, with the port when one is spelled out.
pub fn api_host(api_url: &str) -> Result<String> {
    let url = Url::parse(api_url)
        .map_err(|e| CliError::config(format!("invalid API URL {:?}: {}", api_url, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| CliError::config(format!("API URL {:?} has no host", api_url)))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
