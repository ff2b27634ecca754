//! Interactive login.
//!
//! - `InteractiveAuthenticator`: prompt, exchange credentials for a token,
//!   store the result for the current host
//! - `Prompter`: where usernames and passwords come from

pub mod interactive;
pub mod prompt;

pub use interactive::{AuthOptions, CredentialExchange, InteractiveAuthenticator};
pub use prompt::TerminalPrompter;
