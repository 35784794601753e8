use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tokio::process::Command;
use tracing::{debug, info};

use super::AuthArgs;

#[derive(Debug, Clone, Args)]
pub struct ExecCommand {
    #[command(flatten)]
    pub args: AuthArgs,

    #[arg(
        trailing_var_arg = true,
        required = true,
        num_args = 1..,
        value_name = "COMMAND",
        help = "Command to run with the session credentials"
    )]
    pub command: Vec<String>,
}

impl ExecCommand {
    /// Activate the session, then run the command with the projected
    /// environment inherited. Returns the child's exit status.
    pub async fn execute(self, profile: &str) -> Result<ExitCode> {
        self.args.activate(profile).await?;

        let (program, args) = self
            .command
            .split_first()
            .context("No command given")?;

        info!("Running {} with profile {}", program, profile);
        debug!("Arguments: {:?}", args);

        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to run '{program}'"))?;

        Ok(child_exit_code(status.code()).map_or(ExitCode::FAILURE, ExitCode::from))
    }
}

/// Exit code to pass on, `None` when the child was killed by a signal
/// or reported a code outside 0..=255
fn child_exit_code(code: Option<i32>) -> Option<u8> {
    code.and_then(|c| u8::try_from(c).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_exit_code() {
        assert_eq!(child_exit_code(Some(0)), Some(0));
        assert_eq!(child_exit_code(Some(3)), Some(3));
        assert_eq!(child_exit_code(None), None);
        assert_eq!(child_exit_code(Some(-1)), None);
    }
}
