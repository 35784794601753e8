use anyhow::{Context, Result};
use async_trait::async_trait;
use dialoguer::{Input, theme::ColorfulTheme};

/// Supplies an MFA token code on demand.
///
/// It is asked before the profile is resolved, so it only knows the profile
/// name. `Ok(None)` and `Ok(Some(""))` both mean no code was given; the session
/// manager rejects them before any remote call.
#[async_trait]
pub trait MfaPrompt: Send + Sync {
    async fn mfa_code(&self, profile: &str) -> Result<Option<String>>;
}

/// Reads the code interactively from the terminal
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt;

#[async_trait]
impl MfaPrompt for TerminalPrompt {
    async fn mfa_code(&self, profile: &str) -> Result<Option<String>> {
        let prompt = format!("Enter MFA code for {profile} profile");

        let code = tokio::task::spawn_blocking(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("MFA prompt task failed")?
        .context("Failed to read MFA code")?;

        Ok(Some(code))
    }
}

/// A code supplied up front, e.g. from `--mfa-code`
#[derive(Debug, Clone, Default)]
pub struct StaticCode(pub Option<String>);

#[async_trait]
impl MfaPrompt for StaticCode {
    async fn mfa_code(&self, _profile: &str) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Trim the supplied code, treating blank input as missing.
pub(crate) fn normalize_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
