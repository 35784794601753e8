use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{
    AuthCommand, CompletionsCommand, EnvCommand, ExecCommand, LogoutCommand, StatusCommand,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "awssu", version, about = "Switch into an AWS role with MFA and cache the session", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        env = "AWS_PROFILE",
        default_value = "default",
        help = "AWS profile holding role_arn and mfa_serial"
    )]
    pub profile: String,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Assume the profile's role with MFA, reusing a valid cached session")]
    Auth(AuthCommand),
    #[command(about = "Show whether the cached session is still valid")]
    Status(StatusCommand),
    #[command(about = "Print the session as shell export statements")]
    Env(EnvCommand),
    #[command(about = "Run a command with the session credentials in its environment")]
    Exec(ExecCommand),
    #[command(about = "Remove the cached session")]
    Logout(LogoutCommand),
    #[command(about = "Generate shell completion scripts for awssu")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<ExitCode> {
        let profile = self.profile;
        let command = self
            .command
            .unwrap_or_else(|| Commands::Auth(AuthCommand::default()));

        match command {
            Commands::Auth(cmd) => cmd.execute(&profile).await?,
            Commands::Status(cmd) => cmd.execute(&profile).await?,
            Commands::Env(cmd) => cmd.execute(&profile).await?,
            Commands::Exec(cmd) => return cmd.execute(&profile).await,
            Commands::Logout(cmd) => cmd.execute().await?,
            Commands::Completions(cmd) => cmd.execute(),
        }

        Ok(ExitCode::SUCCESS)
    }
}
