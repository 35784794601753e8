use std::io::{self, Write};

use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::cli::Cli;

#[derive(Debug, Clone, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum, help = "Shell to generate the completion script for")]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(self) {
        write_script(self.shell, &mut io::stdout());
    }
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    fn script(shell: Shell) -> String {
        let mut buffer = Vec::new();
        write_script(shell, &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    /// Fish completion lines conditioned on `subcommand`
    fn fish_lines<'a>(fish: &'a str, subcommand: &str) -> Vec<&'a str> {
        let condition = format!(" {subcommand}\"");
        fish.lines().filter(|line| line.contains(&condition)).collect()
    }

    #[test]
    fn test_session_options_complete_under_session_commands() {
        let fish = script(Shell::Fish);

        for subcommand in ["auth", "env", "exec"] {
            let lines = fish_lines(&fish, subcommand);
            for option in ["-l mfa-code", "-l region", "-l duration"] {
                assert!(
                    lines.iter().any(|line| line.contains(option)),
                    "{option} missing under {subcommand}"
                );
            }
        }
    }

    #[test]
    fn test_status_and_logout_take_no_session_options() {
        let fish = script(Shell::Fish);

        for subcommand in ["status", "logout"] {
            let lines = fish_lines(&fish, subcommand);
            assert!(!lines.is_empty());
            assert!(!lines.iter().any(|line| line.contains("-l mfa-code")));
        }
    }

    #[test]
    fn test_every_subcommand_is_offered() {
        let fish = script(Shell::Fish);

        for subcommand in Cli::command().get_subcommands() {
            let offered = format!("-a \"{}\"", subcommand.get_name());
            assert!(fish.contains(&offered), "{offered} missing");
        }
    }

    #[test]
    fn test_exec_command_argument_is_described() {
        let zsh = script(Shell::Zsh);
        assert!(zsh.contains("Command to run with the session credentials"));
    }

    #[test]
    fn test_bash_lists_profile_and_mfa_flags() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("--profile"));
        assert!(bash.contains("--mfa-code"));
    }

    #[test]
    fn test_every_shell_targets_awssu() {
        for shell in Shell::value_variants() {
            assert!(script(*shell).contains("awssu"), "{shell} script");
        }
    }
}
