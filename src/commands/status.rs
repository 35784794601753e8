use anyhow::{Result, bail};
use chrono::{Local, NaiveDateTime};
use clap::Args;

use crate::session::{SessionState, SessionStore};

#[derive(Debug, Clone, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    /// Report the cached session without re-authenticating. Fails when no
    /// session for `profile` is active, so it can gate shell scripts.
    ///
    /// Only the session file is read; `~/.aws/config` is not needed.
    pub async fn execute(self, profile: &str) -> Result<()> {
        let store = SessionStore::from_default_path()?;
        let message = describe(&store, profile, Local::now().naive_local())?;
        println!("{message}");
        Ok(())
    }
}

fn describe(store: &SessionStore, profile: &str, now: NaiveDateTime) -> Result<String> {
    match SessionState::evaluate(store.load()?, Some(profile), now) {
        SessionState::Active(record) => Ok(format!(
            "Session for {} profile is active until {}",
            record.profile,
            record.token_ttl()
        )),
        SessionState::Expired(record) => {
            bail!(
                "Session for {} profile expired at {}",
                record.profile,
                record.token_ttl()
            )
        }
        SessionState::NoSession => bail!("No cached session for {} profile", profile),
    }
}
