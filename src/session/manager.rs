use std::time::SystemTime;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::config::Credentials as SdkCredentials;
use chrono::{Local, NaiveDateTime, SubsecRound, TimeDelta, TimeZone};
use tracing::{debug, info, warn};

use super::{SessionRecord, SessionStore, format_token_ttl};
use crate::{
    aws::{AssumeRoleRequest, RoleAssumer},
    config::ConfigSource,
    constants::{DEFAULT_DURATION_SECONDS, SESSION_NAME_PREFIX},
    environment::EnvironmentProjector,
    error::{AuthError, ConfigurationError},
    mfa::{MfaPrompt, normalize_code},
};

/// Longest role session name STS accepts
const MAX_SESSION_NAME_LEN: usize = 64;

/// Local wall-clock stamp in the role session name
const SESSION_NAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where a stored session stands relative to the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No file, an incomplete file, or a session for another profile
    NoSession,
    Expired(SessionRecord),
    Active(SessionRecord),
}

impl SessionState {
    pub fn evaluate(
        record: Option<SessionRecord>,
        profile: Option<&str>,
        now: NaiveDateTime,
    ) -> Self {
        match record {
            Some(record) if profile.is_some_and(|p| p != record.profile) => {
                debug!(
                    "Stored session belongs to profile {}, not {}",
                    record.profile,
                    profile.unwrap_or_default()
                );
                Self::NoSession
            }
            Some(record) if record.is_valid_at(now) => Self::Active(record),
            Some(record) => Self::Expired(record),
            None => Self::NoSession,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// The session in force after a successful [`SessionManager::authenticate`]
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub record: SessionRecord,
    pub region: String,
    /// True when the session was obtained by a new assume-role call
    pub refreshed: bool,
}

impl ActiveSession {
    /// SDK configuration carrying this session's credentials and region,
    /// for building service clients without going through the environment.
    pub async fn sdk_config(&self) -> SdkConfig {
        let expires_after = Local
            .from_local_datetime(&self.record.expires_at)
            .earliest()
            .map(SystemTime::from);

        let credentials = SdkCredentials::new(
            self.record.access_key_id.clone(),
            self.record.secret_access_key.clone(),
            Some(self.record.session_token.clone()),
            expires_after,
            "awssu",
        );

        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await
    }
}

/// Decides whether the cached session can be reused and re-authenticates
/// with MFA when it cannot.
pub struct SessionManager {
    config: Box<dyn ConfigSource>,
    prompt: Box<dyn MfaPrompt>,
    assumer: Box<dyn RoleAssumer>,
    store: SessionStore,
    projector: EnvironmentProjector,
    clock: fn() -> NaiveDateTime,
}

impl SessionManager {
    pub fn new(
        config: Box<dyn ConfigSource>,
        prompt: Box<dyn MfaPrompt>,
        assumer: Box<dyn RoleAssumer>,
        store: SessionStore,
    ) -> Self {
        Self {
            config,
            prompt,
            assumer,
            store,
            projector: EnvironmentProjector,
            clock: local_now,
        }
    }

    /// Replace the local-time source
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)().trunc_subsecs(0)
    }

    /// State of the stored session, optionally restricted to `profile`.
    pub fn state(&self, profile: Option<&str>) -> Result<SessionState, AuthError> {
        Ok(SessionState::evaluate(self.store.load()?, profile, self.now()))
    }

    /// Whether a stored session is usable without re-authenticating.
    /// Storage failures count as "not active".
    pub fn is_session_active(&self, profile: Option<&str>) -> bool {
        match self.state(profile) {
            Ok(state) => state.is_active(),
            Err(e) => {
                warn!("Unable to read session: {e}");
                false
            }
        }
    }

    /// Make a session for `profile` active, reusing the stored one while it
    /// is valid and assuming the role with a fresh MFA code otherwise.
    ///
    /// On success the session is also projected into the process
    /// environment.
    pub async fn authenticate(
        &self,
        profile: &str,
        duration_seconds: Option<u64>,
        region: Option<&str>,
    ) -> Result<ActiveSession, AuthError> {
        let duration_seconds = duration_seconds.unwrap_or(DEFAULT_DURATION_SECONDS);
        let now = self.now();
        let session_name = session_name(profile, now);
        let expires_at = expiry_after(now, duration_seconds)?;
        let region = self.resolve_region(region)?;

        info!("Starting authentication for profile: {}", profile);
        debug!("Region: {}", region);

        let lock = self.store.lock()?;
        let state = SessionState::evaluate(self.store.load()?, Some(profile), now);

        let (record, refreshed) = match state {
            SessionState::Active(record) => {
                info!("Reusing session valid until {}", record.token_ttl());
                (record, false)
            }
            SessionState::Expired(record) => {
                info!("Session expired at {}, re-authenticating", record.token_ttl());
                let record = self
                    .refresh(profile, &session_name, duration_seconds, expires_at, &region)
                    .await?;
                (record, true)
            }
            SessionState::NoSession => {
                info!("No cached session, authenticating");
                let record = self
                    .refresh(profile, &session_name, duration_seconds, expires_at, &region)
                    .await?;
                (record, true)
            }
        };
        drop(lock);

        self.projector.project(&record);

        Ok(ActiveSession {
            record,
            region,
            refreshed,
        })
    }

    fn resolve_region(&self, region: Option<&str>) -> Result<String, ConfigurationError> {
        region
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .or_else(|| self.config.default_region())
            .ok_or(ConfigurationError::RegionUndetermined)
    }

    async fn refresh(
        &self,
        profile: &str,
        session_name: &str,
        duration_seconds: u64,
        expires_at: NaiveDateTime,
        region: &str,
    ) -> Result<SessionRecord, AuthError> {
        let mfa_code = match self.prompt.mfa_code(profile).await {
            Ok(code) => normalize_code(code),
            Err(e) => {
                warn!("MFA prompt failed: {e:#}");
                None
            }
        }
        .ok_or(AuthError::MfaCodeMissing)?;

        let profile_config = self.config.profile(profile)?;
        debug!("MFA device: {}", profile_config.mfa_serial);

        let request = AssumeRoleRequest {
            role_arn: &profile_config.role_arn,
            session_name,
            duration_seconds,
            mfa_serial: &profile_config.mfa_serial,
            mfa_code: &mfa_code,
            region,
            source_profile: profile_config.source_profile.as_deref(),
        };

        let credentials = self.assumer.assume_role(&request).await.map_err(|e| {
            AuthError::AssumeRoleFailed {
                role_arn: profile_config.role_arn.clone(),
                source: e.into(),
            }
        })?;

        if let Some(remote) = &credentials.expiration {
            debug!(
                "Remote expiry {:?}, keeping local TTL {}",
                remote,
                format_token_ttl(expires_at)
            );
        }

        let record = SessionRecord::new(profile, credentials, expires_at);
        self.store.save(&record)?;
        Ok(record)
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn expiry_after(now: NaiveDateTime, duration_seconds: u64) -> Result<NaiveDateTime, AuthError> {
    i64::try_from(duration_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| ConfigurationError::InvalidDuration(duration_seconds).into())
}

/// Remote session label: prefix, profile and timestamp, restricted to the
/// characters STS allows in a role session name.
fn session_name(profile: &str, now: NaiveDateTime) -> String {
    let raw = format!(
        "{SESSION_NAME_PREFIX}-{profile}-{}",
        now.format(SESSION_NAME_TIME_FORMAT)
    );
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "+=,.@_-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect();

    match sanitized.len() > MAX_SESSION_NAME_LEN {
        true => sanitized[sanitized.len() - MAX_SESSION_NAME_LEN..].to_string(),
        false => sanitized,
    }
}
