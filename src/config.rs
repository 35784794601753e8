use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use tracing::debug;

use crate::{constants, error::ConfigurationError};

/// Role settings for one profile of the AWS shared config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub role_arn: String,
    pub mfa_serial: String,
    pub region: Option<String>,
    /// Profile holding the long-lived keys used to call STS
    pub source_profile: Option<String>,
}

impl ProfileConfig {
    fn from_ini_section(profile: &str, section: &Properties) -> Result<Self, ConfigurationError> {
        let required = |field: &'static str| {
            section
                .get(field)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
                .ok_or_else(|| ConfigurationError::MissingField {
                    profile: profile.to_string(),
                    field,
                })
        };
        let optional = |field: &str| {
            section
                .get(field)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        Ok(Self {
            role_arn: required("role_arn")?,
            mfa_serial: required("mfa_serial")?,
            region: optional("region"),
            source_profile: optional("source_profile"),
        })
    }
}

/// Read-only lookup of per-profile settings.
pub trait ConfigSource: Send + Sync {
    /// Settings for `profile`. Absence is an error, never a default.
    fn profile(&self, profile: &str) -> Result<ProfileConfig, ConfigurationError>;

    /// Region attached to the first configured profile, if any.
    fn default_region(&self) -> Option<String>;
}

/// The AWS shared config file (`~/.aws/config`)
#[derive(Debug, Clone)]
pub struct AwsConfigFile {
    ini: Ini,
}

impl AwsConfigFile {
    /// Load from `AWS_CONFIG_FILE` or the default location.
    pub fn load() -> Result<Self, ConfigurationError> {
        let path = constants::get_aws_config_path()
            .ok_or(ConfigurationError::PathUndetermined("AWS config"))?;
        Self::load_from(&path)
    }

    /// A missing file behaves like an empty one: every profile lookup fails.
    pub fn load_from(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            debug!("AWS config {} not found, using empty config", path.display());
            return Ok(Self::from_ini(Ini::new()));
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigurationError::Unreadable {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Self::from_ini(ini))
    }

    pub fn from_ini(ini: Ini) -> Self {
        Self { ini }
    }
}

impl ConfigSource for AwsConfigFile {
    fn profile(&self, profile: &str) -> Result<ProfileConfig, ConfigurationError> {
        let section = self
            .ini
            .section(Some(section_name(profile)))
            .ok_or_else(|| ConfigurationError::ProfileNotFound(profile.to_string()))?;

        ProfileConfig::from_ini_section(profile, section)
    }

    fn default_region(&self) -> Option<String> {
        self.ini
            .iter()
            .find_map(|(name, section)| name.map(|_| section))
            .and_then(|section| section.get("region"))
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .map(String::from)
    }
}

fn section_name(profile: &str) -> String {
    if profile == "default" {
        profile.to_string()
    } else {
        format!("profile {profile}")
    }
}
