use anyhow::Result;
use clap::Args;

use super::AuthArgs;
use crate::environment::EnvironmentProjector;

/// Prints the session as shell exports, e.g. `eval "$(awssu env -p dev)"`
#[derive(Debug, Clone, Default, Args)]
pub struct EnvCommand {
    #[command(flatten)]
    pub args: AuthArgs,
}

impl EnvCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        let session = self.args.activate(profile).await?;
        print!("{}", EnvironmentProjector::shell_exports(&session.record));
        Ok(())
    }
}
