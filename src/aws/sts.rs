use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, profile::ProfileFileCredentialsProvider};
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

use super::{AssumeRoleRequest, Credentials, RoleAssumer};
use crate::constants::DEFAULT_SOURCE_PROFILE;

/// Assumes roles through AWS STS, signing with the source profile's
/// long-lived keys from the shared credentials file.
#[derive(Debug, Clone, Default)]
pub struct StsRoleAssumer;

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(&self, request: &AssumeRoleRequest<'_>) -> Result<Credentials> {
        let source_profile = request.source_profile.unwrap_or(DEFAULT_SOURCE_PROFILE);

        info!("Calling AWS STS AssumeRole");
        debug!("Role ARN: {}", request.role_arn);
        debug!("Session name: {}", request.session_name);
        debug!("MFA serial: {}", request.mfa_serial);
        debug!("Source profile: {}", source_profile);
        debug!("Region: {}", request.region);
        debug!("Duration: {} seconds", request.duration_seconds);

        let duration_seconds = i32::try_from(request.duration_seconds)
            .context("Session duration does not fit an STS request")?;

        // Session variables already in the environment may be stale, so the
        // base credentials come from the shared credentials file only.
        let base_credentials = ProfileFileCredentialsProvider::builder()
            .profile_name(source_profile)
            .build();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(request.region.to_string()))
            .credentials_provider(base_credentials)
            .load()
            .await;

        let client = StsClient::new(&config);

        let response = client
            .assume_role()
            .role_arn(request.role_arn)
            .role_session_name(request.session_name)
            .duration_seconds(duration_seconds)
            .serial_number(request.mfa_serial)
            .token_code(request.mfa_code)
            .send()
            .await
            .context("Failed to assume role with MFA")?;

        let sts_creds = response
            .credentials()
            .context("AWS STS returned no credentials")?;

        let credentials = Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: Some(*sts_creds.expiration()),
        };

        info!("Successfully obtained AWS credentials");
        Ok(credentials)
    }
}
