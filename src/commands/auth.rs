use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::{
    constants::{DEFAULT_DURATION_SECONDS, MAX_DURATION_SECONDS, MIN_DURATION_SECONDS},
    session::ActiveSession,
};

/// Options shared by every command that needs an active session
#[derive(Debug, Clone, Args)]
pub struct AuthArgs {
    #[arg(
        short = 'd',
        long,
        env = "AWS_SU_DURATION",
        default_value_t = DEFAULT_DURATION_SECONDS,
        value_parser = clap::value_parser!(u64).range(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS),
        help = "Role session duration in seconds"
    )]
    pub duration: u64,

    #[arg(
        short = 'r',
        long,
        env = "AWS_REGION",
        help = "AWS region (defaults to the region of the first profile in AWS config)"
    )]
    pub region: Option<String>,

    #[arg(
        long,
        env = "AWS_SU_MFA_CODE",
        hide_env_values = true,
        help = "MFA token code (prompted for when omitted)"
    )]
    pub mfa_code: Option<String>,
}

impl Default for AuthArgs {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_SECONDS,
            region: None,
            mfa_code: None,
        }
    }
}

impl AuthArgs {
    /// Reuse or refresh the session for `profile`, projecting it into this
    /// process's environment.
    pub(crate) async fn activate(self, profile: &str) -> Result<ActiveSession> {
        let manager = super::session_manager(self.mfa_code)?;
        manager
            .authenticate(profile, Some(self.duration), self.region.as_deref())
            .await
            .with_context(|| format!("Failed to authenticate profile '{profile}'"))
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct AuthCommand {
    #[command(flatten)]
    pub args: AuthArgs,
}

impl AuthCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        let session = self.args.activate(profile).await?;

        if session.refreshed {
            info!("Assumed role for profile {}", profile);
            println!("\nAWS session for {profile} profile saved.");
        } else {
            println!("AWS session for {profile} profile is still valid.");
        }
        println!("Credentials will expire at: {}", session.record.token_ttl());

        Ok(())
    }
}
