//! Error types for session authentication.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Boxed cause attached to remote failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Missing or unusable static configuration. Never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("profile '{0}' not found in AWS config")]
    ProfileNotFound(String),

    #[error("profile '{profile}' has no '{field}' setting")]
    MissingField {
        profile: String,
        field: &'static str,
    },

    #[error("unable to determine region: pass --region or set one on the first profile")]
    RegionUndetermined,

    #[error("session duration of {0} seconds is out of range")]
    InvalidDuration(u64),

    #[error("failed to determine {0} path")]
    PathUndetermined(&'static str),

    #[error("failed to read AWS config {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
}

/// Errors returned by [`SessionManager::authenticate`](crate::session::SessionManager::authenticate).
///
/// A corrupt session file is deliberately absent from this list: it is read
/// as "no session" and triggers a fresh authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("no MFA code supplied, aborting")]
    MfaCodeMissing,

    #[error("failed to assume role {role_arn}")]
    AssumeRoleFailed {
        role_arn: String,
        #[source]
        source: BoxError,
    },

    #[error("session file {} could not be {action}", .path.display())]
    Storage {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },
}

impl AuthError {
    pub(crate) fn storage(path: impl Into<PathBuf>, action: &'static str, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            action,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_missing_field() {
        let err = ConfigurationError::MissingField {
            profile: "ds-nonprod".to_string(),
            field: "mfa_serial",
        };
        let msg = err.to_string();
        assert!(msg.contains("ds-nonprod"));
        assert!(msg.contains("mfa_serial"));
    }

    #[test]
    fn test_configuration_error_converts_into_auth_error() {
        let err: AuthError = ConfigurationError::RegionUndetermined.into();
        assert!(matches!(
            err,
            AuthError::Configuration(ConfigurationError::RegionUndetermined)
        ));
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_assume_role_failed_keeps_cause() {
        let err = AuthError::AssumeRoleFailed {
            role_arn: "arn:aws:iam::123456789012:role/Admin".to_string(),
            source: "MultiFactorAuthentication failed".into(),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("MultiFactorAuthentication failed"));
    }

    #[test]
    fn test_storage_error_names_path_and_action() {
        let err = AuthError::storage(
            "/tmp/awssudo",
            "written",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/awssudo"));
        assert!(msg.contains("written"));
    }
}
