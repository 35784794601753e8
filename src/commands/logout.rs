use anyhow::{Context, Result};
use clap::Args;

use crate::session::SessionStore;

#[derive(Debug, Clone, Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    /// Remove the cached session. Works even when `~/.aws/config` is
    /// missing or broken, since only the session file is touched.
    pub async fn execute(self) -> Result<()> {
        let store = SessionStore::from_default_path()?;
        store.clear().context("Failed to remove cached session")?;

        println!("Cached AWS session removed.");
        Ok(())
    }
}
