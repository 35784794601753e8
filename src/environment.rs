use std::env;

use tracing::debug;

use crate::{
    constants::{
        AWS_ACCESS_KEY_ID, AWS_PROFILE, AWS_SECRET_ACCESS_KEY, AWS_SECURITY_TOKEN,
        AWS_SESSION_TOKEN, AWS_TOKEN_TTL,
    },
    session::SessionRecord,
};

/// Publishes an active session as process environment variables, where
/// SDK clients and spawned commands pick it up.
///
/// The environment is process-wide: projecting two sessions from
/// different threads at once is not supported.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProjector;

impl EnvironmentProjector {
    /// The variables describing `record`, in file order.
    pub fn variables(record: &SessionRecord) -> [(&'static str, String); 6] {
        [
            (AWS_ACCESS_KEY_ID, record.access_key_id.clone()),
            (AWS_SECRET_ACCESS_KEY, record.secret_access_key.clone()),
            (AWS_SESSION_TOKEN, record.session_token.clone()),
            (AWS_SECURITY_TOKEN, record.security_token().to_string()),
            (AWS_TOKEN_TTL, record.token_ttl()),
            (AWS_PROFILE, record.profile.clone()),
        ]
    }

    pub fn project(&self, record: &SessionRecord) {
        for (key, value) in Self::variables(record) {
            // SAFETY: the binary runs a single-threaded runtime and nothing
            // else reads the environment while a session is projected.
            unsafe {
                env::set_var(key, value);
            }
        }
        debug!("Projected session for profile {} into the environment", record.profile);
    }

    /// POSIX `export` lines suitable for `eval`
    pub fn shell_exports(record: &SessionRecord) -> String {
        Self::variables(record)
            .iter()
            .map(|(key, value)| format!("export {key}={}\n", shell_quote(value)))
            .collect()
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
