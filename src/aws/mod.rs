use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use aws_smithy_types::DateTime;

pub mod sts;

/// Temporary credentials returned by an assume-role exchange
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiry reported by the remote side, informational only
    pub expiration: Option<DateTime>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Parameters of one assume-role-with-MFA call
#[derive(Debug, Clone)]
pub struct AssumeRoleRequest<'a> {
    pub role_arn: &'a str,
    pub session_name: &'a str,
    pub duration_seconds: u64,
    pub mfa_serial: &'a str,
    pub mfa_code: &'a str,
    pub region: &'a str,
    pub source_profile: Option<&'a str>,
}

/// Performs the remote role switch. Implementations must not retry:
/// MFA codes are single-use.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(&self, request: &AssumeRoleRequest<'_>) -> Result<Credentials>;
}

pub use sts::StsRoleAssumer;
