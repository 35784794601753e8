use anyhow::{Context, Result};

use crate::{
    aws::StsRoleAssumer,
    config::AwsConfigFile,
    mfa::{MfaPrompt, StaticCode, TerminalPrompt},
    session::{SessionManager, SessionStore},
};

pub mod auth;
pub mod completions;
pub mod env;
pub mod exec;
pub mod logout;
pub mod status;

pub use auth::{AuthArgs, AuthCommand};
pub use completions::CompletionsCommand;
pub use env::EnvCommand;
pub use exec::ExecCommand;
pub use logout::LogoutCommand;
pub use status::StatusCommand;

/// Wire the session manager to the shared AWS config, STS and the MFA
/// source chosen on the command line.
fn session_manager(mfa_code: Option<String>) -> Result<SessionManager> {
    let config = AwsConfigFile::load().context("Failed to load AWS config")?;
    let store = SessionStore::from_default_path()?;

    let prompt: Box<dyn MfaPrompt> = match mfa_code {
        Some(code) => Box::new(StaticCode(Some(code))),
        None => Box::new(TerminalPrompt),
    };

    Ok(SessionManager::new(
        Box::new(config),
        prompt,
        Box::new(StsRoleAssumer),
        store,
    ))
}
