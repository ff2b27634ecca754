use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_API_URL: &str = "https://api.paas.example";
pub const DEFAULT_PASSWORD_RESET_URL: &str = "https://dashboard.paas.example/users/password/new";

#[derive(Parser)]
#[command(name = "paas")]
#[command(version, about = "Deploy and inspect applications on the platform")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Application to operate on
    #[arg(short, long, global = true, env = "PAAS_APP")]
    pub app: Option<String>,

    /// Platform API endpoint
    #[arg(long, global = true, env = "PAAS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Credential file (defaults to <config dir>/paas/auth.json)
    #[arg(long, global = true, env = "PAAS_AUTH_FILE")]
    pub auth_file: Option<PathBuf>,

    /// Never prompt; fail instead when a login would be needed
    #[arg(long, global = true, env = "DISABLE_INTERACTIVE")]
    pub no_interactive: bool,

    /// Link shown after repeated login failures
    #[arg(
        long,
        global = true,
        env = "PAAS_PASSWORD_RESET_URL",
        default_value = DEFAULT_PASSWORD_RESET_URL,
        hide = true
    )]
    pub password_reset_url: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to the platform
    Login,

    /// Forget the stored credentials for the current API host
    Logout,

    /// List app deployments
    Deployments,

    /// View deployment logs
    DeploymentLogs {
        /// Deployment ID (see `paas deployments`)
        deployment_id: String,
    },

    /// Follow the deployment event stream of an app
    DeploymentFollow,

    /// Trigger a deployment from an archive
    Deploy {
        /// Local .tar.gz/.war file or http(s) URL of the archive
        archive: String,

        /// Git reference recorded with the deployment
        git_ref: Option<String>,

        /// The archive is a WAR file
        #[arg(short, long)]
        war: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_deploy_with_git_ref_and_war() {
        let cli = Cli::try_parse_from([
            "paas", "-a", "web", "deploy", "build/app.war", "v1.4.0", "--war",
        ])
        .unwrap();

        assert_eq!(cli.global.app.as_deref(), Some("web"));
        match cli.command {
            Commands::Deploy {
                archive,
                git_ref,
                war,
            } => {
                assert_eq!(archive, "build/app.war");
                assert_eq!(git_ref.as_deref(), Some("v1.4.0"));
                assert!(war);
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn subcommand_names_are_kebab_case() {
        let cli = Cli::try_parse_from(["paas", "deployment-logs", "dep-1", "--app", "web"]).unwrap();
        assert!(matches!(cli.command, Commands::DeploymentLogs { ref deployment_id } if deployment_id == "dep-1"));

        let cli = Cli::try_parse_from(["paas", "deployment-follow"]).unwrap();
        assert!(matches!(cli.command, Commands::DeploymentFollow));
    }

    #[test]
    fn deploy_requires_archive() {
        assert!(Cli::try_parse_from(["paas", "deploy"]).is_err());
    }
}
